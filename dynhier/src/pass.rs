//! Graph rewriting passes.

use designir::Graph;
use tracing::{span, Level};

use crate::advisory::Advisory;
use crate::error::Result;
use crate::System;

/// A rewrite of the design graph.
///
/// Passes may create, modify, or erase any record.
pub trait Pass {
    /// The name of the pass, used in logs.
    fn name(&self) -> &str;

    /// Runs the pass.
    fn run(&mut self, graph: &mut Graph) -> Result<()>;
}

/// An ordered list of passes.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Creates an empty pass manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pass.
    pub fn add(&mut self, pass: impl Pass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// The number of passes.
    #[inline]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Returns `true` if there are no passes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    fn run(&mut self, graph: &mut Graph) -> Result<()> {
        for pass in self.passes.iter_mut() {
            let _guard = span!(Level::INFO, "running pass", pass = pass.name()).entered();
            pass.run(graph)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PassManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.passes.iter().map(|pass| pass.name()))
            .finish()
    }
}

impl System {
    /// Runs `passes` over the design graph.
    ///
    /// Only the first call has any effect. All caches are invalidated before
    /// the passes run, so instance ids and graph handles obtained earlier
    /// must be re-derived afterwards. The rewritten graph is validated and
    /// any structural issues are logged.
    pub fn run_passes(&mut self, passes: &mut PassManager) -> Result<()> {
        if self.passed {
            tracing::debug!("passes have already run");
            return Ok(());
        }
        let _guard = span!(Level::INFO, "running passes", system = %self.config.name).entered();

        let pending = self.pending_generation();
        if pending > 0 && self.config.diagnostics.warn_partial_generation {
            self.issues
                .add_and_log(Advisory::PartialGeneration { pending });
        }
        self.invalidate();
        passes.run(&mut self.graph)?;
        let issues = self.graph.validate();
        tracing::debug!(
            errors = issues.num_errors(),
            warnings = issues.num_warnings(),
            "validated design graph"
        );
        self.passed = true;
        Ok(())
    }

    /// Returns `true` once [`System::run_passes`] has completed.
    #[inline]
    pub fn passed(&self) -> bool {
        self.passed
    }
}
