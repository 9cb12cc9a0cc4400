//! Advisory diagnostics.
//!
//! Advisories never abort an operation. They are logged when raised and
//! accumulated on the [`System`](crate::System).

use std::fmt::Display;

use diagnostics::{Diagnostic, Severity};

/// A non-fatal condition worth reporting.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Advisory {
    /// Graph handles were still reachable when the caches were invalidated.
    ///
    /// Whoever holds them will get stale-handle errors once the graph is rewritten.
    LiveHandles {
        /// The number of reachable handles.
        count: usize,
    },
    /// Passes were run while some modules were still waiting to be generated.
    PartialGeneration {
        /// The number of modules left in the generation queue.
        pending: usize,
    },
}

impl Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LiveHandles { count } => write!(
                f,
                "something is holding references to {} design graph records",
                count
            ),
            Self::PartialGeneration { pending } => write!(
                f,
                "running lowering passes on a partially generated design ({} modules pending)",
                pending
            ),
        }
    }
}

impl Diagnostic for Advisory {
    fn help(&self) -> Option<Box<dyn Display>> {
        match self {
            Self::LiveHandles { .. } => Some(Box::new(
                "drop record handles before invalidating; look them up again afterwards",
            )),
            Self::PartialGeneration { .. } => Some(Box::new("call `System::generate` first")),
        }
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }
}
