//! Physical device locations.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ty::Type;

/// A kind of physical device primitive.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// A block RAM.
    M20K,
    /// A DSP block.
    Dsp,
    /// A flip-flop.
    FF,
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::M20K => write!(f, "M20K"),
            Self::Dsp => write!(f, "DSP"),
            Self::FF => write!(f, "FF"),
        }
    }
}

/// A location on a physical device.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PhysLocation {
    /// The kind of primitive at this location.
    pub prim: PrimitiveType,
    /// The column.
    pub x: u64,
    /// The row.
    pub y: u64,
    /// The index among primitives at the same coordinates.
    pub num: u64,
}

impl PhysLocation {
    /// Creates a new physical location.
    #[inline]
    pub fn new(prim: PrimitiveType, x: u64, y: u64, num: u64) -> Self {
        Self { prim, x, y, num }
    }
}

impl Display for PhysLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PhysLocation<{}, x:{}, y:{}, num:{}>",
            self.prim, self.x, self.y, self.num
        )
    }
}

/// The number of locations in a [`LocationVector`] did not match the width of its type.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
#[error("type `{ty}` is {expected} bits wide, but {actual} locations were given")]
pub struct WidthMismatch {
    /// The register type.
    pub ty: Type,
    /// The bit width of the type.
    pub expected: usize,
    /// The number of locations given.
    pub actual: usize,
}

/// One optional flip-flop location per bit of a value.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct LocationVector {
    ty: Type,
    locs: Vec<Option<PhysLocation>>,
}

impl LocationVector {
    /// Creates a location vector from `(x, y, num)` coordinates of flip-flops.
    ///
    /// Bits whose entry is [`None`] are left unplaced.
    pub fn new(
        ty: Type,
        locs: impl IntoIterator<Item = Option<(u64, u64, u64)>>,
    ) -> Result<Self, WidthMismatch> {
        let locs: Vec<_> = locs
            .into_iter()
            .map(|loc| loc.map(|(x, y, num)| PhysLocation::new(PrimitiveType::FF, x, y, num)))
            .collect();
        let expected = ty.bitwidth();
        if locs.len() != expected {
            return Err(WidthMismatch {
                ty,
                expected,
                actual: locs.len(),
            });
        }
        Ok(Self { ty, locs })
    }

    /// The type of the placed value.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Iterates over the per-bit locations.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Option<&PhysLocation>> {
        self.locs.iter().map(Option::as_ref)
    }
}
