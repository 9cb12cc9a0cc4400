//! Dynamic instance hierarchies over a design graph.
//!
//! A [`System`] owns a [`designir::Graph`] of module definitions and lets
//! callers address every concrete instance along a hierarchy path, starting
//! from a top-level module. Instances are materialized lazily, and each can
//! be backed on demand by a dynamic instance record in the graph, to which
//! placements and attributes are attached.
//!
//! ```
//! use dynhier::System;
//!
//! let mut sys = System::default();
//! let leaf = sys.define_extern("Leaf");
//! let top = sys.define_module("Top", move |m| {
//!     m.instance("a", leaf)?;
//!     Ok(())
//! });
//! sys.add_top(top).unwrap();
//! sys.generate(None).unwrap();
//!
//! let root = sys.get_instance(top).unwrap();
//! let a = sys.child(root, "a").unwrap();
//! assert_eq!(sys.describe(a).unwrap(), "<instance: [a]>");
//! ```
#![warn(missing_docs)]

pub mod advisory;
pub mod config;
pub mod error;
pub mod instance;
pub mod module;
pub mod pass;
pub mod placement;
pub mod record;
pub mod sites;
pub mod symbols;
pub mod system;

pub use designir;

pub use advisory::Advisory;
pub use config::Config;
pub use error::{Error, InstanceDoesNotExist, NotFound, Result};
pub use instance::{Children, InstanceId, InstanceKind};
pub use module::{DefId, ModuleBuilder};
pub use pass::{Pass, PassManager};
pub use placement::{PlacementError, PrimitiveDb, SubPath};
pub use sites::{Site, SiteKind, Sites};
pub use symbols::{Symbol, SymbolInstaller};
pub use system::System;
