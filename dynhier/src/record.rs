//! Dynamic instance records.
//!
//! Each instance tree node is backed by at most one record in the design
//! graph: roots by an instance hierarchy record, everything else by a
//! dynamic instance record nested inside its parent's record. Records are
//! created on demand, reused if an equivalent one is already in the graph,
//! and can be mapped back to the node they stand for.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use arcstr::ArcStr;
use designir::{Graph, InnerRef, Op, OpRef, RecordId};
use tracing::{span, Level};

use crate::advisory::Advisory;
use crate::error::{InstanceDoesNotExist, Result};
use crate::instance::InstanceId;
use crate::module::DefId;
use crate::System;

#[derive(Debug, Default)]
pub(crate) struct RecordCache {
    /// Instance hierarchy records keyed by top module symbol.
    ///
    /// `None` until the graph is scanned.
    hierarchies: Option<HashMap<ArcStr, OpRef>>,
    /// The record backing each non-root node.
    instances: HashMap<InstanceId, OpRef>,
    /// Dynamic instance records keyed by parent record and site.
    nested: HashMap<RecordId, HashMap<InnerRef, OpRef>>,
    /// Definitions that have had a hierarchy record created.
    ///
    /// Survives invalidation.
    rooted: HashSet<DefId>,
}

impl RecordCache {
    /// Returns `true` if `def` was not marked before.
    pub(crate) fn mark_rooted(&mut self, def: DefId) -> bool {
        self.rooted.insert(def)
    }

    fn hierarchies<'a>(
        hierarchies: &'a mut Option<HashMap<ArcStr, OpRef>>,
        graph: &Graph,
    ) -> &'a mut HashMap<ArcStr, OpRef> {
        hierarchies.get_or_insert_with(|| {
            let mut index = HashMap::new();
            for op in graph.top_level() {
                if let Ok(Op::InstanceHierarchy { top_module }) = graph.op(&op) {
                    index.entry(top_module.clone()).or_insert(op);
                }
            }
            index
        })
    }

    fn nested<'a>(
        nested: &'a mut HashMap<RecordId, HashMap<InnerRef, OpRef>>,
        graph: &Graph,
        parent: &OpRef,
    ) -> Result<&'a mut HashMap<InnerRef, OpRef>> {
        Ok(match nested.entry(parent.id()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut index = HashMap::new();
                for op in graph.body(parent)? {
                    if let Op::DynamicInstance { instance_ref } = graph.op(&op)? {
                        index.entry(instance_ref.clone()).or_insert(op);
                    }
                }
                entry.insert(index)
            }
        })
    }

    fn invalidate(&mut self) {
        self.hierarchies = None;
        self.instances.clear();
        self.nested.clear();
    }
}

impl System {
    /// Creates the instance hierarchy record for the top-level module `def`.
    ///
    /// # Panics
    ///
    /// Panics if the graph already contains a hierarchy record for `def`.
    pub(crate) fn create_hierarchy_record(&mut self, def: DefId) -> Result<OpRef> {
        let symbol = self.built_symbol(def)?;
        let index = RecordCache::hierarchies(&mut self.records.hierarchies, &self.graph);
        if index.contains_key(symbol.as_str()) {
            tracing::error!(%def, %symbol, "duplicate instance hierarchy");
            panic!("cannot create two instance hierarchies for module `{symbol}`");
        }
        let op = self.graph.create(
            None,
            Op::InstanceHierarchy {
                top_module: symbol.as_arcstr().clone(),
            },
        )?;
        tracing::debug!(%def, %symbol, record = %op.id(), "created instance hierarchy record");
        index.insert(symbol.into(), op.clone());
        Ok(op)
    }

    /// The instance hierarchy record of the top-level module `def`, if there is one.
    pub fn hierarchy_record(&mut self, def: DefId) -> Result<Option<OpRef>> {
        let symbol = self.built_symbol(def)?;
        Ok(
            RecordCache::hierarchies(&mut self.records.hierarchies, &self.graph)
                .get(symbol.as_str())
                .cloned(),
        )
    }

    fn does_not_exist(&self, inst: InstanceId) -> crate::error::Error {
        let path = match self.describe(inst) {
            Ok(path) => path,
            Err(err) => return err,
        };
        InstanceDoesNotExist { path }.into()
    }

    /// The record backing `inst`, creating it and any missing ancestor records.
    ///
    /// Fails with [`Error::DoesNotExist`](crate::Error::DoesNotExist) if the
    /// hierarchy record of a root is gone, or if the site of `inst` is no
    /// longer part of its containing module. Ids from before a pass are
    /// already stale, so the site check only fails when a site is removed
    /// from the graph without invalidating.
    pub fn get_or_create_record(&mut self, inst: InstanceId) -> Result<OpRef> {
        let node = self.tree.node(inst)?;
        let inside_of = node.inside_of;
        let (parent, name) = match (node.parent, &node.name) {
            (Some(parent), Some(name)) => (parent, name.clone()),
            _ => {
                return match self.hierarchy_record(inside_of)? {
                    Some(op) => Ok(op),
                    None => Err(self.does_not_exist(inst)),
                }
            }
        };

        if !self.sites_of(inside_of)?.contains_key(&name) {
            return Err(self.does_not_exist(inst));
        }
        if let Some(op) = self.records.instances.get(&inst) {
            return Ok(op.clone());
        }

        let parent_op = self.get_or_create_record(parent)?;
        let symbol = self.built_symbol(inside_of)?;
        let key = InnerRef::new(symbol.as_arcstr().clone(), name);
        let existing = RecordCache::nested(&mut self.records.nested, &self.graph, &parent_op)?
            .get(&key)
            .cloned();
        let op = match existing {
            Some(op) => op,
            None => {
                let op = self.graph.create(
                    Some(&parent_op),
                    Op::DynamicInstance {
                        instance_ref: key.clone(),
                    },
                )?;
                tracing::debug!(
                    %inst,
                    instance_ref = %key,
                    record = %op.id(),
                    "created dynamic instance record"
                );
                RecordCache::nested(&mut self.records.nested, &self.graph, &parent_op)?
                    .insert(key, op.clone());
                op
            }
        };
        self.records.instances.insert(inst, op.clone());
        Ok(op)
    }

    /// The instance tree node that `op` stands for.
    ///
    /// # Panics
    ///
    /// Panics if `op` is neither an instance hierarchy record nor a dynamic
    /// instance record.
    pub fn resolve_node_from_record(&mut self, op: &OpRef) -> Result<InstanceId> {
        match self.graph.op(op)? {
            Op::InstanceHierarchy { top_module } => {
                let def = self.resolve_definition(&top_module.clone())?;
                self.get_instance(def)
            }
            Op::DynamicInstance { instance_ref } => {
                let name = instance_ref.name.clone();
                let parent = match self.graph.parent(op)? {
                    Some(parent) => parent,
                    None => {
                        tracing::error!(record = %op.id(), "dynamic instance record at top level");
                        panic!("dynamic instance record {} has no parent", op.id());
                    }
                };
                let parent = self.resolve_node_from_record(&parent)?;
                let inst = self.child(parent, &name)?;
                self.records
                    .instances
                    .entry(inst)
                    .or_insert_with(|| op.clone());
                Ok(inst)
            }
            other => {
                let kind = other.kind();
                tracing::error!(record = %op.id(), %kind, "cannot resolve record to an instance");
                panic!("cannot resolve a {kind} record to an instance");
            }
        }
    }

    /// Discards every cache derived from the design graph.
    ///
    /// Instance ids and graph handles obtained before this call become stale.
    /// Returns the number of graph handles that were still reachable; if
    /// there were any, a [`Advisory::LiveHandles`] is raised.
    pub fn invalidate(&mut self) -> usize {
        let _guard =
            span!(Level::INFO, "invalidating caches", system = %self.config.name).entered();

        self.symbols.invalidate();
        self.sites.invalidate();
        self.records.invalidate();
        self.tree.invalidate();

        let live = self.graph.clear_live_handles();
        if live > 0 && self.config.diagnostics.warn_live_handles {
            self.issues.add_and_log(Advisory::LiveHandles { count: live });
        }
        live
    }
}
