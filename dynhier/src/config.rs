//! System configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! name = "Test"
//!
//! [diagnostics]
//! warn_live_handles = true
//! warn_partial_generation = true
//!
//! [placement]
//! strict = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for a [`System`](crate::System).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The name of the system, attached to log spans.
    pub name: String,
    /// Which advisory diagnostics to emit.
    pub diagnostics: DiagnosticsConfig,
    /// Placement database behavior.
    pub placement: PlacementConfig,
}

/// Advisory diagnostic switches.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Report graph handles that are still reachable after invalidation.
    pub warn_live_handles: bool,
    /// Report running passes while modules are still waiting to be generated.
    pub warn_partial_generation: bool,
}

/// Placement database settings.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Reject placing a second instance at an occupied location.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "DynHierSystem".to_string(),
            diagnostics: Default::default(),
            placement: Default::default(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            warn_live_handles: true,
            warn_partial_generation: true,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl Config {
    /// Parses a configuration from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}
