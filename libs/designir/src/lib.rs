//! Design graph intermediate representation.
//!
//! A [`Graph`] is a mutable tree of records. Top-level records are module
//! definitions and instance hierarchy roots; module bodies contain
//! instantiation sites, and instance hierarchy records contain dynamic
//! instance records, which may in turn contain annotations and further
//! dynamic instances.
//!
//! Records are accessed through [`OpRef`] handles. Every handle is tied to
//! the graph epoch it was created in. [`Graph::clear_live_handles`] starts a
//! new epoch, reports how many handles from the previous epoch were still
//! reachable, and causes those handles to be rejected with
//! [`GraphError::StaleHandle`] from then on.
#![warn(missing_docs)]

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

pub mod location;
pub mod op;
pub mod ty;
pub(crate) mod validation;

pub use location::{LocationVector, PhysLocation, PrimitiveType, WidthMismatch};
pub use op::{InnerRef, Op, OpKind};
pub use ty::Type;
pub use validation::{Cause, ValidatorIssue};

#[cfg(test)]
pub(crate) mod tests;

/// The result type returned by graph accessors.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// An error accessing a [`Graph`].
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum GraphError {
    /// The handle was created before the last call to [`Graph::clear_live_handles`].
    #[error("handle to {0} is from a cleared epoch")]
    StaleHandle(RecordId),
    /// The record has been erased from the graph.
    #[error("{0} has been erased")]
    Erased(RecordId),
    /// The record cannot contain child records.
    #[error("{id} ({kind}) has no body")]
    NoBody {
        /// The record that was used as a parent.
        id: RecordId,
        /// The kind of that record.
        kind: OpKind,
    },
}

/// An opaque record identifier.
///
/// Record IDs are never reused within a graph, and remain meaningful across
/// epochs. Unlike [`OpRef`]s, they are not counted as live handles.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RecordId(u64);

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "rec{}", self.0)
    }
}

#[derive(Debug)]
struct Epoch(u64);

/// A live handle to a record in a [`Graph`].
#[derive(Clone)]
pub struct OpRef {
    id: RecordId,
    epoch: Arc<Epoch>,
}

impl OpRef {
    /// The ID of the record this handle refers to.
    #[inline]
    pub fn id(&self) -> RecordId {
        self.id
    }
}

impl PartialEq for OpRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.epoch.0 == other.epoch.0
    }
}

impl Eq for OpRef {}

impl Hash for OpRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for OpRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpRef({}@{})", self.id, self.epoch.0)
    }
}

#[derive(Debug, Clone)]
struct Record {
    op: Op,
    parent: Option<RecordId>,
    /// `None` for records that cannot contain other records.
    body: Option<Vec<RecordId>>,
}

/// A mutable graph of design records.
#[derive(Debug)]
pub struct Graph {
    /// The last record ID assigned.
    record_id: u64,
    records: HashMap<RecordId, Record>,
    /// Top-level records, in creation order.
    top: Vec<RecordId>,
    epoch: Arc<Epoch>,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            record_id: 0,
            records: HashMap::new(),
            top: Vec::new(),
            epoch: Arc::new(Epoch(0)),
        }
    }
}

impl Graph {
    /// Creates a new, empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: RecordId) -> OpRef {
        OpRef {
            id,
            epoch: self.epoch.clone(),
        }
    }

    fn record(&self, op: &OpRef) -> Result<&Record> {
        if op.epoch.0 != self.epoch.0 {
            return Err(GraphError::StaleHandle(op.id));
        }
        self.records.get(&op.id).ok_or(GraphError::Erased(op.id))
    }

    /// Returns `true` if the record with the given ID has not been erased.
    #[inline]
    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    /// Returns a fresh handle to the record with the given ID, if it still exists.
    pub fn lookup(&self, id: RecordId) -> Option<OpRef> {
        self.records.contains_key(&id).then(|| self.handle(id))
    }

    /// Creates a new record.
    ///
    /// If `parent` is [`None`], the record is appended to the top level of
    /// the graph. Otherwise, it is appended to the body of `parent`.
    pub fn create(&mut self, parent: Option<&OpRef>, op: Op) -> Result<OpRef> {
        let parent_id = match parent {
            Some(parent) => {
                let record = self.record(parent)?;
                if record.body.is_none() {
                    return Err(GraphError::NoBody {
                        id: parent.id,
                        kind: record.op.kind(),
                    });
                }
                Some(parent.id)
            }
            None => None,
        };

        self.record_id += 1;
        let id = RecordId(self.record_id);
        tracing::trace!(%id, kind = %op.kind(), parent = ?parent_id, "creating record");
        let body = op.has_body().then(Vec::new);
        self.records.insert(
            id,
            Record {
                op,
                parent: parent_id,
                body,
            },
        );
        match parent_id {
            Some(parent_id) => self
                .records
                .get_mut(&parent_id)
                .and_then(|r| r.body.as_mut())
                .expect("parent body checked above")
                .push(id),
            None => self.top.push(id),
        }
        Ok(self.handle(id))
    }

    /// Erases a record and everything nested inside of it.
    pub fn erase(&mut self, op: &OpRef) -> Result<()> {
        let parent = self.record(op)?.parent;
        let siblings = match parent {
            Some(parent) => self
                .records
                .get_mut(&parent)
                .and_then(|r| r.body.as_mut())
                .ok_or(GraphError::Erased(parent))?,
            None => &mut self.top,
        };
        siblings.retain(|id| *id != op.id);

        let mut stack = vec![op.id];
        while let Some(id) = stack.pop() {
            if let Some(record) = self.records.remove(&id) {
                stack.extend(record.body.into_iter().flatten());
            }
        }
        Ok(())
    }

    /// The operation stored in a record.
    pub fn op(&self, op: &OpRef) -> Result<&Op> {
        Ok(&self.record(op)?.op)
    }

    /// The kind of a record.
    #[inline]
    pub fn kind(&self, op: &OpRef) -> Result<OpKind> {
        Ok(self.op(op)?.kind())
    }

    /// The record whose body contains `op`, or [`None`] for top-level records.
    pub fn parent(&self, op: &OpRef) -> Result<Option<OpRef>> {
        Ok(self.record(op)?.parent.map(|id| self.handle(id)))
    }

    /// The records directly contained in the body of `op`, in creation order.
    pub fn body(&self, op: &OpRef) -> Result<Vec<OpRef>> {
        let record = self.record(op)?;
        let body = record.body.as_ref().ok_or(GraphError::NoBody {
            id: op.id,
            kind: record.op.kind(),
        })?;
        Ok(body.iter().map(|id| self.handle(*id)).collect())
    }

    /// The records in the body of `op` that carry a symbol name, with their names.
    pub fn named_children(&self, op: &OpRef) -> Result<Vec<(ArcStr, OpRef)>> {
        Ok(self
            .body(op)?
            .into_iter()
            .filter_map(|child| {
                let name = self.records[&child.id].op.sym_name()?.clone();
                Some((name, child))
            })
            .collect())
    }

    /// All records nested anywhere inside `op`, in pre-order.
    pub fn descendants(&self, op: &OpRef) -> Result<Vec<OpRef>> {
        let mut out = Vec::new();
        let mut stack: Vec<RecordId> = match &self.record(op)?.body {
            Some(body) => body.iter().rev().copied().collect(),
            None => Vec::new(),
        };
        while let Some(id) = stack.pop() {
            out.push(self.handle(id));
            if let Some(body) = &self.records[&id].body {
                stack.extend(body.iter().rev());
            }
        }
        Ok(out)
    }

    /// The top-level records, in creation order.
    pub fn top_level(&self) -> Vec<OpRef> {
        self.top.iter().map(|id| self.handle(*id)).collect()
    }

    /// The number of records in the graph.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the graph contains no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The number of handles from the current epoch that are still reachable.
    #[inline]
    pub fn live_handles(&self) -> usize {
        Arc::strong_count(&self.epoch) - 1
    }

    /// Starts a new epoch, invalidating every outstanding [`OpRef`].
    ///
    /// Returns the number of handles that were still reachable.
    pub fn clear_live_handles(&mut self) -> usize {
        let live = self.live_handles();
        self.epoch = Arc::new(Epoch(self.epoch.0 + 1));
        tracing::debug!(live, epoch = self.epoch.0, "cleared live handles");
        live
    }
}
