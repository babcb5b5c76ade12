//! Build executor with progress reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::context::BuildContext;
use crate::builder::native::NativeBuilder;
use crate::builder::plan::BuildPlan;
use crate::ops::october_build::Artifact;

/// Build executor with progress tracking.
pub struct BuildExecutor<'a> {
    ctx: &'a BuildContext,
    verbose: bool,
}

impl<'a> BuildExecutor<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        BuildExecutor {
            ctx,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute a build plan with progress reporting.
    pub fn execute(&self, plan: &BuildPlan, jobs: Option<usize>) -> Result<Vec<Artifact>> {
        let start = Instant::now();

        if self.verbose {
            eprintln!("   Compiling {} file(s)", plan.compile_count());
            eprintln!("     Linking {} module(s)", plan.link_count());
        }

        let total = plan.compile_count() + plan.link_count();
        let bar = (!self.verbose && total > 1).then(|| {
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            ProgressBar::new(total as u64).with_style(style)
        });

        let progress = BuildProgress::new().with_bar(bar.clone());
        let artifacts = NativeBuilder::new(self.ctx)
            .with_progress(progress.clone())
            .execute(plan, jobs);
        tracing::debug!(
            "{}/{} compile and {}/{} link step(s) done",
            progress.compile_count(),
            plan.compile_count(),
            progress.link_count(),
            plan.link_count()
        );

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        let artifacts = artifacts?;

        let elapsed = start.elapsed();
        let fresh = artifacts.iter().filter(|a| a.fresh).count();
        eprintln!(
            "    Finished `{}` profile: {} module(s) ({} fresh) in {:.2}s",
            self.ctx.profile_name,
            artifacts.len(),
            fresh,
            elapsed.as_secs_f64()
        );

        Ok(artifacts)
    }
}

/// Progress counters shared by the compile workers.
#[derive(Clone, Default)]
pub struct BuildProgress {
    compiled: Arc<AtomicUsize>,
    linked: Arc<AtomicUsize>,
    bar: Option<ProgressBar>,
}

impl BuildProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `bar` alongside the counters.
    pub fn with_bar(mut self, bar: Option<ProgressBar>) -> Self {
        self.bar = bar;
        self
    }

    /// Record a finished (or fresh) compile step.
    pub fn compiled(&self) {
        self.compiled.fetch_add(1, Ordering::SeqCst);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Record a finished (or fresh) link step.
    pub fn linked(&self) {
        self.linked.fetch_add(1, Ordering::SeqCst);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn compile_count(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    pub fn link_count(&self) -> usize {
        self.linked.load(Ordering::SeqCst)
    }
}
