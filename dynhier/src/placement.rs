//! Physical placement of instances.
//!
//! Placements are stored in the design graph as location records nested in
//! dynamic instance records. The placement database indexes them by
//! location so that occupancy can be checked and locations can be mapped
//! back to instances.

use std::collections::{HashMap, HashSet};

use arcstr::ArcStr;
use designir::{Graph, LocationVector, Op, OpRef, PhysLocation, PrimitiveType, RecordId};
use itertools::Itertools;

use crate::error::{Error, Result};
use crate::instance::{InstanceId, InstanceKind};
use crate::System;

/// A path below an instance, such as a sub-block of an external module.
///
/// Stored as `|a|b`; an empty path is stored as nothing at all.
#[derive(Debug, Clone, Default, Hash, Eq, PartialEq)]
pub struct SubPath(Option<ArcStr>);

impl SubPath {
    /// The empty sub-path.
    #[inline]
    pub fn none() -> Self {
        Self(None)
    }

    /// Builds a sub-path from its components.
    pub fn from_parts<S: AsRef<str>>(parts: impl IntoIterator<Item = S>) -> Self {
        let joined = parts
            .into_iter()
            .map(|part| format!("|{}", part.as_ref()))
            .join("");
        Self((!joined.is_empty()).then(|| joined.into()))
    }

    /// The stored form of the path.
    #[inline]
    pub fn as_stored(&self) -> Option<&ArcStr> {
        self.0.as_ref()
    }

    fn into_stored(self) -> Option<ArcStr> {
        self.0
    }
}

impl From<&str> for SubPath {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::none()
        } else {
            Self::from_parts([value])
        }
    }
}

impl<S: AsRef<str>> From<&[S]> for SubPath {
    fn from(value: &[S]) -> Self {
        Self::from_parts(value)
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for SubPath {
    fn from(value: [S; N]) -> Self {
        Self::from_parts(value)
    }
}

impl From<Option<&str>> for SubPath {
    fn from(value: Option<&str>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

/// The set of valid locations on a device.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveDb {
    coords: HashSet<(PrimitiveType, u64, u64)>,
    locations: HashSet<PhysLocation>,
}

impl PrimitiveDb {
    /// Creates an empty primitive database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every primitive index at the given coordinates as valid.
    pub fn add_coords(&mut self, prim: PrimitiveType, x: u64, y: u64) -> &mut Self {
        self.coords.insert((prim, x, y));
        self
    }

    /// Marks a single location as valid.
    pub fn add(&mut self, loc: PhysLocation) -> &mut Self {
        self.locations.insert(loc);
        self
    }

    /// Returns `true` if `loc` is a valid location.
    pub fn is_valid(&self, loc: &PhysLocation) -> bool {
        self.locations.contains(loc) || self.coords.contains(&(loc.prim, loc.x, loc.y))
    }
}

/// A rejected placement.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum PlacementError {
    /// The location is not in the primitive database.
    #[error("{0} is not a valid location on this device")]
    InvalidLocation(PhysLocation),
    /// Something has already been placed at the location.
    #[error("{loc} is already occupied by {occupant}")]
    Occupied {
        /// The requested location.
        loc: PhysLocation,
        /// The location record of the current occupant.
        occupant: RecordId,
    },
}

#[derive(Debug, Clone)]
struct Placement {
    /// The location record.
    record: RecordId,
    sub_path: Option<ArcStr>,
}

#[derive(Debug, Default)]
pub(crate) struct PlacementDb {
    primitives: Option<PrimitiveDb>,
    placements: HashMap<PhysLocation, Placement>,
}

impl PlacementDb {
    /// Placements whose location record has been erased do not occupy their location.
    fn check(&self, graph: &Graph, loc: &PhysLocation, strict: bool) -> Result<(), PlacementError> {
        if let Some(primitives) = &self.primitives {
            if !primitives.is_valid(loc) {
                return Err(PlacementError::InvalidLocation(*loc));
            }
        }
        if strict {
            if let Some(placement) = self
                .placements
                .get(loc)
                .filter(|placement| graph.contains(placement.record))
            {
                return Err(PlacementError::Occupied {
                    loc: *loc,
                    occupant: placement.record,
                });
            }
        }
        Ok(())
    }

    fn insert(&mut self, loc: PhysLocation, record: RecordId, sub_path: Option<ArcStr>) {
        self.placements.insert(loc, Placement { record, sub_path });
    }
}

impl System {
    /// Creates the placement database, indexing any placements already in the graph.
    ///
    /// If `primitives` is given, only its locations may be placed to.
    /// Does nothing if the database already exists.
    pub fn create_placement_db(&mut self, primitives: Option<PrimitiveDb>) -> Result<()> {
        if self.placedb.is_some() {
            return Ok(());
        }
        let mut db = PlacementDb {
            primitives,
            placements: HashMap::new(),
        };
        for top in self.graph.top_level() {
            if !matches!(self.graph.op(&top)?, Op::InstanceHierarchy { .. }) {
                continue;
            }
            for op in self.graph.descendants(&top)? {
                match self.graph.op(&op)? {
                    Op::PhysLocation { loc, sub_path } => {
                        db.insert(*loc, op.id(), sub_path.clone())
                    }
                    Op::RegPhysLocation { locs } => {
                        for loc in locs.iter().flatten() {
                            db.insert(*loc, op.id(), None);
                        }
                    }
                    _ => {}
                }
            }
        }
        tracing::info!(placements = db.placements.len(), "created placement database");
        self.placedb = Some(db);
        Ok(())
    }

    fn check_location(&self, loc: &PhysLocation) -> Result<()> {
        let db = self.placedb.as_ref().ok_or(Error::NoPlacementDb)?;
        Ok(db.check(&self.graph, loc, self.config.placement.strict)?)
    }

    fn expect_kind(
        &self,
        inst: InstanceId,
        allowed: &[InstanceKind],
        action: &'static str,
    ) -> Result<()> {
        let kind = self.kind(inst)?;
        if !allowed.contains(&kind) {
            return Err(Error::WrongKind { kind, action });
        }
        Ok(())
    }

    /// Places a root or module instance at a physical location.
    pub fn place(
        &mut self,
        inst: InstanceId,
        prim: PrimitiveType,
        x: u64,
        y: u64,
        num: u64,
        sub_path: impl Into<SubPath>,
    ) -> Result<()> {
        self.expect_kind(inst, &[InstanceKind::Root, InstanceKind::Module], "place")?;
        let loc = PhysLocation::new(prim, x, y, num);
        self.check_location(&loc)?;
        let sub_path = sub_path.into().into_stored();
        let parent = self.get_or_create_record(inst)?;
        let record = self.graph.create(
            Some(&parent),
            Op::PhysLocation {
                loc,
                sub_path: sub_path.clone(),
            },
        )?;
        tracing::debug!(%inst, %loc, ?sub_path, "placed instance");
        if let Some(db) = &mut self.placedb {
            db.insert(loc, record.id(), sub_path);
        }
        Ok(())
    }

    /// Places each bit of a register instance.
    pub fn place_register(&mut self, inst: InstanceId, locs: LocationVector) -> Result<()> {
        self.expect_kind(inst, &[InstanceKind::Register], "place_register")?;
        if let Some(ty) = self.register_type(inst)? {
            if ty.bitwidth() != locs.ty().bitwidth() {
                return Err(designir::WidthMismatch {
                    expected: ty.bitwidth(),
                    actual: locs.ty().bitwidth(),
                    ty,
                }
                .into());
            }
        }
        for loc in locs.iter().flatten() {
            self.check_location(loc)?;
        }
        let parent = self.get_or_create_record(inst)?;
        let placed: Vec<PhysLocation> = locs.iter().flatten().copied().collect();
        let record = self
            .graph
            .create(Some(&parent), Op::RegPhysLocation { locs })?;
        tracing::debug!(%inst, bits = placed.len(), "placed register");
        if let Some(db) = &mut self.placedb {
            for loc in placed {
                db.insert(loc, record.id(), None);
            }
        }
        Ok(())
    }

    /// The locations assigned to an instance, with their sub-paths.
    pub fn locations(&mut self, inst: InstanceId) -> Result<Vec<(PhysLocation, Option<ArcStr>)>> {
        let record = self.get_or_create_record(inst)?;
        let mut out = Vec::new();
        for op in self.graph.body(&record)? {
            match self.graph.op(&op)? {
                Op::PhysLocation { loc, sub_path } => out.push((*loc, sub_path.clone())),
                Op::RegPhysLocation { locs } => {
                    out.extend(locs.iter().flatten().map(|loc| (*loc, None)))
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// The instance placed at `loc`, with the sub-path it was placed under.
    pub fn instance_at(
        &mut self,
        loc: &PhysLocation,
    ) -> Result<Option<(InstanceId, Option<ArcStr>)>> {
        let db = self.placedb.as_ref().ok_or(Error::NoPlacementDb)?;
        let Some(placement) = db.placements.get(loc).cloned() else {
            return Ok(None);
        };
        let Some(record) = self.graph.lookup(placement.record) else {
            tracing::debug!(%loc, record = %placement.record, "placement record is gone");
            return Ok(None);
        };
        let Some(owner) = self.graph.parent(&record)? else {
            return Ok(None);
        };
        let inst = self.resolve_node_from_record(&owner)?;
        Ok(Some((inst, placement.sub_path)))
    }

    /// Attaches a verbatim attribute to an instance.
    pub fn add_named_attribute(
        &mut self,
        inst: InstanceId,
        name: &str,
        value: &str,
        sub_path: impl Into<SubPath>,
    ) -> Result<()> {
        let sub_path = sub_path.into().into_stored();
        let record = self.get_or_create_record(inst)?;
        self.graph.create(
            Some(&record),
            Op::VerbatimAttr {
                name: name.into(),
                value: value.into(),
                sub_path,
            },
        )?;
        Ok(())
    }

    /// The verbatim attributes attached to an instance, as `(name, value, sub_path)`.
    pub fn named_attributes(
        &mut self,
        inst: InstanceId,
    ) -> Result<Vec<(ArcStr, ArcStr, Option<ArcStr>)>> {
        let record = self.get_or_create_record(inst)?;
        let attrs = self
            .graph
            .body(&record)?
            .into_iter()
            .filter_map(|op: OpRef| match self.graph.op(&op) {
                Ok(Op::VerbatimAttr {
                    name,
                    value,
                    sub_path,
                }) => Some((name.clone(), value.clone(), sub_path.clone())),
                _ => None,
            })
            .collect();
        Ok(attrs)
    }
}
