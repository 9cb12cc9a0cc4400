//! Error types and error handling utilities.

use std::sync::Arc;

use arcstr::ArcStr;
use designir::{GraphError, WidthMismatch};

use crate::instance::{InstanceId, InstanceKind};
use crate::module::DefId;
use crate::placement::PlacementError;

/// A result type returning dynamic hierarchy errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for dynamic hierarchy operations.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// A lookup found nothing.
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The backing record of an instance cannot be produced.
    #[error(transparent)]
    DoesNotExist(#[from] InstanceDoesNotExist),
    /// An instance handle was used after the caches it belongs to were invalidated.
    #[error("instance handle {0} is from an invalidated cache generation")]
    StaleInstance(InstanceId),
    /// The operation does not apply to this kind of instance.
    #[error("cannot {action} a {kind}")]
    WrongKind {
        /// The kind of the instance.
        kind: InstanceKind,
        /// The attempted operation.
        action: &'static str,
    },
    /// Placement was requested before the placement database was created.
    #[error("the placement database must be created first")]
    NoPlacementDb,
    /// A placement was rejected.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// A location vector did not match its register's width.
    #[error(transparent)]
    Width(#[from] WidthMismatch),
    /// An error reported by the design graph.
    #[error("design graph error: {0}")]
    Graph(#[from] GraphError),
    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(Arc<toml::de::Error>),
    /// An I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] Arc<std::io::Error>),
    /// An [`anyhow::Error`] raised by a generator or pass.
    #[error(transparent)]
    Anyhow(#[from] Arc<anyhow::Error>),
}

/// Something that was looked up does not exist.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum NotFound {
    /// No definition has been registered under this symbol.
    #[error("no definition is registered under symbol `{0}`")]
    Symbol(ArcStr),
    /// The definition handle was not issued by this system.
    #[error("unknown definition {0}")]
    Definition(DefId),
    /// The definition has not been assigned a symbol yet.
    #[error("definition {0} has not been built")]
    Unbuilt(DefId),
    /// An instance has no child with the given name.
    #[error("{parent} has no child named `{name}`")]
    Child {
        /// The instance that was searched.
        parent: String,
        /// The missing child name.
        name: ArcStr,
    },
}

/// The instance being reached does not exist (anymore).
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
#[error("instance {path} does not exist (anymore)")]
pub struct InstanceDoesNotExist {
    /// A description of the unresolvable instance path.
    pub path: String,
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Anyhow(Arc::new(value))
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(Arc::new(value))
    }
}

impl Error {
    /// Returns `true` for failures callers are expected to handle, namely
    /// [`Error::NotFound`] and [`Error::DoesNotExist`].
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DoesNotExist(_))
    }
}
