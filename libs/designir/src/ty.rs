//! Value types carried by registers.

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// A hardware value type.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// A signless integer of the given width.
    Int(usize),
    /// A fixed-size array.
    Array {
        /// The element type.
        element: Box<Type>,
        /// The number of elements.
        len: usize,
    },
    /// A named alias of another type.
    Alias {
        /// The alias name.
        name: ArcStr,
        /// The aliased type.
        inner: Box<Type>,
    },
}

impl Type {
    /// Creates an array type.
    pub fn array(element: Type, len: usize) -> Self {
        Self::Array {
            element: Box::new(element),
            len,
        }
    }

    /// Creates a type alias.
    pub fn alias(name: impl Into<ArcStr>, inner: Type) -> Self {
        Self::Alias {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    /// The type with all aliases removed from the outermost level.
    pub fn strip(&self) -> &Type {
        match self {
            Self::Alias { inner, .. } => inner.strip(),
            other => other,
        }
    }

    /// The number of bits needed to store a value of this type.
    pub fn bitwidth(&self) -> usize {
        match self.strip() {
            Self::Int(width) => *width,
            Self::Array { element, len } => element.bitwidth() * len,
            Self::Alias { .. } => unreachable!("aliases are stripped"),
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(width) => write!(f, "i{width}"),
            Self::Array { element, len } => write!(f, "array<{len}x{element}>"),
            Self::Alias { name, .. } => write!(f, "{name}"),
        }
    }
}
