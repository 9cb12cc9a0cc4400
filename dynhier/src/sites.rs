//! The static site index.
//!
//! Maps each module definition to the named records in its body, keyed by
//! module record.

use std::collections::HashMap;
use std::sync::Arc;

use arcstr::ArcStr;
use designir::{Op, OpRef, RecordId, Type};
use indexmap::IndexMap;

use crate::error::Result;
use crate::module::DefId;
use crate::symbols::Symbol;
use crate::System;

/// What an instantiation site instantiates.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SiteKind {
    /// An instance of another module.
    Module {
        /// The symbol of the instantiated module.
        target: Symbol,
    },
    /// A register.
    Register {
        /// The type of the stored value.
        ty: Type,
    },
    /// Any other named operation.
    Other,
}

/// A named record in the body of a module.
#[derive(Debug, Clone)]
pub struct Site {
    name: ArcStr,
    op: OpRef,
    kind: SiteKind,
}

impl Site {
    fn from_op(name: ArcStr, op: OpRef, record: &Op) -> Self {
        let kind = match record {
            Op::Instance { module, .. } => SiteKind::Module {
                target: Symbol::from(module.clone()),
            },
            Op::Register { ty, .. } => SiteKind::Register { ty: ty.clone() },
            _ => SiteKind::Other,
        };
        Self { name, op, kind }
    }

    /// The name of the site.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The record of the site.
    #[inline]
    pub fn op(&self) -> &OpRef {
        &self.op
    }

    /// What the site instantiates.
    #[inline]
    pub fn kind(&self) -> &SiteKind {
        &self.kind
    }
}

/// The sites of a module, in body order.
pub type Sites = IndexMap<ArcStr, Site>;

#[derive(Debug, Default)]
pub(crate) struct SiteIndex {
    cache: HashMap<RecordId, Arc<Sites>>,
}

impl SiteIndex {
    pub(crate) fn forget(&mut self, module: RecordId) {
        self.cache.remove(&module);
    }

    pub(crate) fn invalidate(&mut self) {
        self.cache.clear();
    }
}

impl System {
    /// The named sites in the body of `def`, in body order.
    ///
    /// External modules have no sites. Neither does a definition whose module
    /// record has been removed from the graph. If two records share a name,
    /// the first one wins.
    pub fn sites_of(&mut self, def: DefId) -> Result<Arc<Sites>> {
        let symbol = self.built_symbol(def)?;
        let Some(module) = self.symbols.lookup(&self.graph, &symbol) else {
            tracing::debug!(%def, %symbol, "module record is gone");
            return Ok(Arc::default());
        };
        if let Some(sites) = self.sites.cache.get(&module.id()) {
            return Ok(sites.clone());
        }

        let mut sites = Sites::new();
        if let Op::Module { .. } = self.graph.op(&module)? {
            for (name, op) in self.graph.named_children(&module)? {
                if sites.contains_key(&name) {
                    continue;
                }
                let site = Site::from_op(name.clone(), op.clone(), self.graph.op(&op)?);
                sites.insert(name, site);
            }
        }
        tracing::trace!(%def, %symbol, sites = sites.len(), "indexed sites");
        let sites = Arc::new(sites);
        self.sites.cache.insert(module.id(), sites.clone());
        Ok(sites)
    }
}
