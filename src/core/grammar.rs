//! Grammar binding facts derived from an extension's module name.
//!
//! A tree-sitter grammar compiled as `tree_sitter_<lang>` exports a single
//! entry point, `tree_sitter_<lang>()`, returning its `TSLanguage`. Host
//! runtimes locate the grammar by that name alone.

use crate::core::target::ExtensionTarget;

const MODULE_PREFIX: &str = "tree_sitter_";

/// Names a host runtime uses to load one grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarBinding {
    language: String,
}

impl GrammarBinding {
    /// Binding for a language name such as `october`.
    pub fn new(language: impl Into<String>) -> Self {
        GrammarBinding {
            language: language.into(),
        }
    }

    /// Derive the language from a module name.
    ///
    /// The last dotted component is used, minus any `tree_sitter_` prefix:
    /// `tree_sitter_october` and `bindings.tree_sitter_october` both give
    /// `october`.
    pub fn from_module_name(name: &str) -> Self {
        let stem = name.rsplit('.').next().unwrap_or(name);
        let language = stem.strip_prefix(MODULE_PREFIX).unwrap_or(stem);
        GrammarBinding::new(language)
    }

    pub fn for_target(target: &ExtensionTarget) -> Self {
        Self::from_module_name(&target.name)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// `tree_sitter_<lang>`
    pub fn entry_symbol(&self) -> String {
        format!("{}{}", MODULE_PREFIX, self.language)
    }

    /// `tree-sitter-<lang>.h`
    pub fn header_filename(&self) -> String {
        format!("tree-sitter-{}.h", self.language.replace('_', "-"))
    }

    fn include_guard(&self) -> String {
        format!("TREE_SITTER_{}_H_", self.language.to_ascii_uppercase())
    }

    /// C header declaring the entry point, usable from C and C++.
    pub fn render_c_header(&self) -> String {
        let guard = self.include_guard();
        format!(
            r#"#ifndef {guard}
#define {guard}

typedef struct TSLanguage TSLanguage;

#ifdef __cplusplus
extern "C" {{
#endif

const TSLanguage *{symbol}(void);

#ifdef __cplusplus
}}
#endif

#endif // {guard}
"#,
            guard = guard,
            symbol = self.entry_symbol(),
        )
    }
}
