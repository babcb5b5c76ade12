//! Native C compiler driver.
//!
//! Runs a [`BuildPlan`]: compile steps in parallel, then one link per target.
//! Steps whose fingerprint is unchanged and whose output exists are skipped.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;

use crate::builder::context::BuildContext;
use crate::builder::executor::BuildProgress;
use crate::builder::fingerprint::{CompileFingerprint, FingerprintCache, LinkFingerprint};
use crate::builder::plan::{BuildPlan, CompileStep, LinkStep};
use crate::ops::october_build::Artifact;
use crate::util::fs::ensure_dir;

/// A toolchain step that exited unsuccessfully. The underlying error carries
/// the command line and the compiler's stderr.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("failed to compile `{}` for extension `{target}`", .file.display())]
    Compile { target: String, file: PathBuf },

    #[error("failed to link extension `{target}`")]
    Link { target: String },
}

/// Native C builder.
pub struct NativeBuilder<'a> {
    ctx: &'a BuildContext,
    progress: Option<BuildProgress>,
}

struct Compiled {
    step: usize,
    fingerprint: CompileFingerprint,
    fresh: bool,
}

impl<'a> NativeBuilder<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        NativeBuilder {
            ctx,
            progress: None,
        }
    }

    /// Report each finished step to `progress`.
    pub fn with_progress(mut self, progress: BuildProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Execute the build plan.
    ///
    /// `jobs` bounds the number of concurrent compiles; by default rayon uses
    /// one thread per CPU.
    pub fn execute(&self, plan: &BuildPlan, jobs: Option<usize>) -> Result<Vec<Artifact>> {
        let mut cache = FingerprintCache::load(&self.ctx.fingerprint_path);
        let compiler = self.ctx.toolchain().identity();

        let results = {
            let cache = &cache;
            let compiler = compiler.as_str();
            let compile_all = || {
                plan.compile_steps
                    .par_iter()
                    .enumerate()
                    .map(|(i, step)| self.compile(i, step, cache, compiler))
                    .collect::<Vec<Result<Compiled>>>()
            };

            match jobs {
                Some(j) => rayon::ThreadPoolBuilder::new()
                    .num_threads(j)
                    .build()
                    .context("failed to create compile thread pool")?
                    .install(compile_all),
                None => compile_all(),
            }
        };

        let mut rebuilt_targets = HashSet::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(compiled) => {
                    let step = &plan.compile_steps[compiled.step];
                    if !compiled.fresh {
                        rebuilt_targets.insert(step.target.clone());
                    }
                    cache.update_compile(step.output.clone(), compiled.fingerprint);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            cache.save(&self.ctx.fingerprint_path)?;
            return Err(e);
        }

        let mut artifacts = Vec::with_capacity(plan.link_steps.len());
        for step in &plan.link_steps {
            let linked = self.link(step, &mut cache, rebuilt_targets.contains(&step.target));
            match linked {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    cache.save(&self.ctx.fingerprint_path)?;
                    return Err(e);
                }
            }
        }

        cache.save(&self.ctx.fingerprint_path)?;
        Ok(artifacts)
    }

    /// Compile a single source file unless its object is fresh.
    fn compile(
        &self,
        index: usize,
        step: &CompileStep,
        cache: &FingerprintCache,
        compiler: &str,
    ) -> Result<Compiled> {
        let fingerprint = CompileFingerprint::for_step(self.ctx.root(), step, compiler)
            .with_context(|| format!("failed to read source `{}`", step.source.display()))?;

        let fresh = !cache.needs_compile(&step.output, &fingerprint);
        if fresh {
            tracing::debug!("fresh: {}", step.source.display());
        } else {
            if let Some(parent) = step.output.parent() {
                ensure_dir(parent)?;
            }

            tracing::debug!(
                "compiling {} -> {}",
                step.source.display(),
                step.output.display()
            );

            step.command
                .to_process(self.ctx.root())
                .exec_and_check()
                .with_context(|| StepError::Compile {
                    target: step.target.clone(),
                    file: step.source.clone(),
                })?;
        }

        if let Some(progress) = &self.progress {
            progress.compiled();
        }

        Ok(Compiled {
            step: index,
            fingerprint,
            fresh,
        })
    }

    /// Link a target's objects into its module unless the module is fresh.
    fn link(
        &self,
        step: &LinkStep,
        cache: &mut FingerprintCache,
        objects_rebuilt: bool,
    ) -> Result<Artifact> {
        let fingerprint = LinkFingerprint::for_step(step)?;
        let fresh = !objects_rebuilt && !cache.needs_link(&step.target, &step.output, &fingerprint);

        if fresh {
            tracing::debug!("fresh: {}", step.output.display());
        } else {
            if let Some(parent) = step.output.parent() {
                ensure_dir(parent)?;
            }

            tracing::debug!("linking {}", step.output.display());

            step.command
                .to_process(self.ctx.root())
                .exec_and_check()
                .with_context(|| StepError::Link {
                    target: step.target.clone(),
                })?;
        }

        if let Some(progress) = &self.progress {
            progress.linked();
        }

        cache.update_link(step.target.clone(), fingerprint);

        Ok(Artifact {
            target: step.target.clone(),
            path: step.output.clone(),
            fresh,
        })
    }
}
