//! Extension targets.
//!
//! An [`ExtensionTarget`] is the declarative description of one loadable
//! module: its import name, the C sources compiled into it, and the flags and
//! include directories handed to the compiler. Every list is kept in declared
//! order and reaches the toolchain verbatim.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Errors raised while validating a target, before any toolchain runs.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum TargetError {
    #[error("invalid extension name `{name}`: {reason}")]
    #[diagnostic(
        code(october::target::invalid_name),
        help("use dot-separated identifiers such as `tree_sitter_october`")
    )]
    InvalidName { name: String, reason: &'static str },

    #[error("extension `{target}` lists no sources")]
    #[diagnostic(code(october::target::no_sources))]
    NoSources { target: String },

    #[error("source file not found: {} (required by extension `{target}`)", .path.display())]
    #[diagnostic(code(october::target::source_not_found))]
    SourceNotFound { target: String, path: PathBuf },

    #[error("source is not a regular file: {} (required by extension `{target}`)", .path.display())]
    #[diagnostic(code(october::target::source_not_file))]
    SourceNotFile { target: String, path: PathBuf },

    #[error("extension `{name}` is declared more than once")]
    #[diagnostic(code(october::target::duplicate))]
    DuplicateTarget { name: String },

    #[error("invalid macro definition {entry:?}: expected [\"NAME\"] or [\"NAME\", \"VALUE\"]")]
    #[diagnostic(code(october::target::invalid_macro))]
    InvalidMacro { entry: Vec<String> },
}

impl TargetError {
    /// The `std::io` error class this maps to, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            TargetError::SourceNotFound { .. } => Some(io::ErrorKind::NotFound),
            _ => None,
        }
    }

    /// Whether this is a missing-file error.
    pub fn is_not_found(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::NotFound)
    }

    /// Render with the diagnostic code and help attached to each variant.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());
        if let Some(code) = MietteDiagnostic::code(self) {
            diag = diag.with_context(format!("code: {}", code));
        }
        if let Some(help) = MietteDiagnostic::help(self) {
            diag = diag.with_suggestion(help.to_string());
        }

        match self {
            TargetError::SourceNotFound { path, .. } => {
                let diag = diag.with_location(path.clone());
                if path.file_name().is_some_and(|n| n == "parser.c") {
                    diag.with_suggestion(suggestions::GENERATE_PARSER)
                } else {
                    diag.with_suggestion("Fix the `sources` list in October.toml")
                }
            }
            _ => diag,
        }
    }
}

/// A preprocessor macro, `NAME` or `NAME=VALUE`.
///
/// In TOML it is written as a one- or two-element string array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct MacroDef {
    pub name: String,
    pub value: Option<String>,
}

impl MacroDef {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        MacroDef {
            name: name.into(),
            value,
        }
    }
}

impl TryFrom<Vec<String>> for MacroDef {
    type Error = TargetError;

    fn try_from(entry: Vec<String>) -> Result<Self, Self::Error> {
        if !(1..=2).contains(&entry.len()) || entry[0].is_empty() {
            return Err(TargetError::InvalidMacro { entry });
        }

        let mut parts = entry.into_iter();
        let name = parts.next().unwrap_or_default();
        Ok(MacroDef::new(name, parts.next()))
    }
}

impl From<MacroDef> for Vec<String> {
    fn from(def: MacroDef) -> Self {
        let mut entry = vec![def.name];
        entry.extend(def.value);
        entry
    }
}

impl fmt::Display for MacroDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One loadable extension module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionTarget {
    /// Import name; the last dotted component is the module file stem
    pub name: String,

    /// C sources, relative to the project root unless absolute
    pub sources: Vec<PathBuf>,

    /// Flags appended to every compile command
    #[serde(default)]
    pub extra_compile_args: Vec<String>,

    /// Header search directories, relative to the project root unless absolute
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub define_macros: Vec<MacroDef>,

    /// Flags appended to the link command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_link_args: Vec<String>,
}

impl ExtensionTarget {
    pub fn new<P: Into<PathBuf>>(
        name: impl Into<String>,
        sources: impl IntoIterator<Item = P>,
    ) -> Self {
        ExtensionTarget {
            name: name.into(),
            sources: sources.into_iter().map(Into::into).collect(),
            extra_compile_args: Vec::new(),
            include_dirs: Vec::new(),
            define_macros: Vec::new(),
            extra_link_args: Vec::new(),
        }
    }

    pub fn extra_compile_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_compile_args.push(arg.into());
        self
    }

    pub fn extra_compile_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_compile_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn include_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn define_macro(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.define_macros
            .push(MacroDef::new(name, value.map(str::to_string)));
        self
    }

    pub fn extra_link_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_link_args.push(arg.into());
        self
    }

    pub fn extra_link_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_link_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Check that the name is loadable: dot-separated identifiers.
    pub fn validate_name(&self) -> Result<(), TargetError> {
        let invalid = |reason| TargetError::InvalidName {
            name: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("name cannot be empty"));
        }

        for component in self.name.split('.') {
            let mut chars = component.chars();
            match chars.next() {
                None => return Err(invalid("empty component between dots")),
                Some(c) if c.is_ascii_digit() => {
                    return Err(invalid("components cannot start with a digit"))
                }
                Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
                    return Err(invalid("components must start with a letter or underscore"))
                }
                Some(_) => {}
            }
            if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("only ASCII letters, digits and underscores are allowed"));
            }
        }

        Ok(())
    }

    /// Static checks that need no filesystem access.
    pub fn validate(&self) -> Result<(), TargetError> {
        self.validate_name()?;
        if self.sources.is_empty() {
            return Err(TargetError::NoSources {
                target: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Check that every source exists under `root`.
    ///
    /// Returns the sources exactly as declared; they are passed to the
    /// compiler unchanged with `root` as its working directory.
    pub fn resolve_sources(&self, root: &Path) -> Result<Vec<PathBuf>, TargetError> {
        self.validate()?;

        for source in &self.sources {
            let full = root.join(source);
            if !full.exists() {
                return Err(TargetError::SourceNotFound {
                    target: self.name.clone(),
                    path: source.clone(),
                });
            }
            if !full.is_file() {
                return Err(TargetError::SourceNotFile {
                    target: self.name.clone(),
                    path: source.clone(),
                });
            }
        }

        Ok(self.sources.clone())
    }

    /// Module file stem (last dotted component).
    pub fn module_stem(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Package directories the module lives in (all but the last component).
    pub fn module_subdir(&self) -> PathBuf {
        let mut components: Vec<&str> = self.name.split('.').collect();
        components.pop();
        components.iter().collect()
    }

    /// `<stem>.<extension>`.
    pub fn output_filename(&self, extension: &str) -> String {
        if extension.is_empty() {
            self.module_stem().to_string()
        } else {
            format!("{}.{}", self.module_stem(), extension)
        }
    }

    /// Module path relative to an output directory.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.module_subdir().join(self.output_filename(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn october() -> ExtensionTarget {
        ExtensionTarget::new("tree_sitter_october", ["src/parser.c"])
            .extra_compile_arg("-std=c11")
            .include_dir("src")
    }

    #[test]
    fn test_builder_keeps_declared_order() {
        let target = ExtensionTarget::new("m", ["b.c", "a.c"])
            .extra_compile_args(["-std=c11", "-Wall"])
            .include_dirs(["src", "include"]);

        assert_eq!(target.sources, vec![PathBuf::from("b.c"), PathBuf::from("a.c")]);
        assert_eq!(target.extra_compile_args, vec!["-std=c11", "-Wall"]);
        assert_eq!(
            target.include_dirs,
            vec![PathBuf::from("src"), PathBuf::from("include")]
        );
    }

    #[test]
    fn test_valid_names() {
        for name in ["tree_sitter_october", "_private", "pkg.sub.mod", "M2"] {
            let target = ExtensionTarget::new(name, ["a.c"]);
            assert!(target.validate_name().is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "tree-sitter-october", "1abc", "pkg..mod", ".mod", "mod.", "caf\u{e9}"] {
            let target = ExtensionTarget::new(name, ["a.c"]);
            let err = target.validate_name().unwrap_err();
            assert!(matches!(err, TargetError::InvalidName { .. }), "{name}");
        }
    }

    #[test]
    fn test_no_sources() {
        let target = ExtensionTarget::new("m", Vec::<PathBuf>::new());
        assert!(matches!(
            target.validate().unwrap_err(),
            TargetError::NoSources { .. }
        ));
    }

    #[test]
    fn test_resolve_sources_present() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        std::fs::write(tmp.path().join("src/parser.c"), "").unwrap();

        let sources = october().resolve_sources(tmp.path()).unwrap();
        assert_eq!(sources, vec![PathBuf::from("src/parser.c")]);
    }

    #[test]
    fn test_resolve_sources_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();

        let err = october().resolve_sources(tmp.path()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
        assert!(err.to_string().contains("src/parser.c"));

        let diag = err.to_diagnostic().format(false);
        assert!(diag.contains("tree-sitter generate"));
        assert!(diag.contains("code: october::target::source_not_found"));
    }

    #[test]
    fn test_invalid_name_diagnostic_carries_help() {
        let err = ExtensionTarget::new("tree-sitter-october", ["src/parser.c"])
            .validate_name()
            .unwrap_err();

        let diag = err.to_diagnostic();
        assert!(diag
            .context
            .contains(&"code: october::target::invalid_name".to_string()));
        assert_eq!(
            diag.suggestions,
            vec!["use dot-separated identifiers such as `tree_sitter_october`"]
        );
    }

    #[test]
    fn test_resolve_sources_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src/parser.c")).unwrap();

        let err = october().resolve_sources(tmp.path()).unwrap_err();
        assert!(matches!(err, TargetError::SourceNotFile { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_module_paths() {
        let flat = october();
        assert_eq!(flat.module_stem(), "tree_sitter_october");
        assert_eq!(flat.module_subdir(), PathBuf::new());
        assert_eq!(flat.output_filename("so"), "tree_sitter_october.so");

        let nested = ExtensionTarget::new("grammars.october._binding", ["a.c"]);
        assert_eq!(nested.module_stem(), "_binding");
        assert_eq!(
            nested.output_path("dll"),
            PathBuf::from("grammars/october/_binding.dll")
        );
    }

    #[test]
    fn test_macro_def_from_toml_shapes() {
        let flag = MacroDef::try_from(vec!["TREE_SITTER_DEBUG".to_string()]).unwrap();
        assert_eq!(flag.to_string(), "TREE_SITTER_DEBUG");

        let valued =
            MacroDef::try_from(vec!["LANGUAGE".to_string(), "october".to_string()]).unwrap();
        assert_eq!(valued.to_string(), "LANGUAGE=october");
        assert_eq!(Vec::<String>::from(valued), vec!["LANGUAGE", "october"]);

        assert!(MacroDef::try_from(Vec::<String>::new()).is_err());
        assert!(MacroDef::try_from(vec!["A".to_string(), "B".to_string(), "C".to_string()]).is_err());
    }
}
