//! The system context.

use designir::Graph;
use diagnostics::IssueSet;

use crate::advisory::Advisory;
use crate::config::Config;
use crate::instance::InstanceTree;
use crate::module::{DefId, Definitions};
use crate::placement::PlacementDb;
use crate::record::RecordCache;
use crate::sites::SiteIndex;
use crate::symbols::{DefinitionRegistry, SymbolTable};

/// A design under construction, together with every cache derived from it.
///
/// The design graph is the source of truth. The symbol table, site index,
/// instance tree, and record cache are views of it that are rebuilt lazily
/// after [`System::invalidate`].
#[derive(Debug)]
pub struct System {
    pub(crate) config: Config,
    pub(crate) graph: Graph,
    pub(crate) defs: Definitions,
    pub(crate) tops: Vec<DefId>,
    pub(crate) symbols: SymbolTable,
    pub(crate) registry: DefinitionRegistry,
    pub(crate) sites: SiteIndex,
    pub(crate) tree: InstanceTree,
    pub(crate) records: RecordCache,
    pub(crate) placedb: Option<PlacementDb>,
    pub(crate) passed: bool,
    pub(crate) issues: IssueSet<Advisory>,
}

impl Default for System {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl System {
    /// Creates an empty system.
    pub fn new(config: Config) -> Self {
        tracing::debug!(name = %config.name, "creating system");
        Self {
            config,
            graph: Graph::new(),
            defs: Default::default(),
            tops: Vec::new(),
            symbols: Default::default(),
            registry: Default::default(),
            sites: Default::default(),
            tree: Default::default(),
            records: Default::default(),
            placedb: None,
            passed: false,
            issues: IssueSet::new(),
        }
    }

    /// The configuration of this system.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The design graph.
    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Advisories raised so far.
    #[inline]
    pub fn issues(&self) -> &IssueSet<Advisory> {
        &self.issues
    }
}
