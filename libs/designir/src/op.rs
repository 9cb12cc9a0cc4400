//! Record payloads.

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::location::{LocationVector, PhysLocation};
use crate::ty::Type;

/// A reference to a named record inside a module definition.
///
/// Identifies an instantiation site by the symbol of the module whose body
/// contains it and the site's name.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InnerRef {
    /// The symbol of the containing module.
    pub module: ArcStr,
    /// The name of the site within the module.
    pub name: ArcStr,
}

impl InnerRef {
    /// Creates a new inner reference.
    pub fn new(module: impl Into<ArcStr>, name: impl Into<ArcStr>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl Display for InnerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}::@{}", self.module, self.name)
    }
}

/// The payload of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// A module definition with a body.
    Module {
        /// The module's symbol.
        sym_name: ArcStr,
    },
    /// An externally defined module whose body is opaque.
    ModuleExtern {
        /// The module's symbol.
        sym_name: ArcStr,
    },
    /// An instantiation of a module.
    Instance {
        /// The instance name.
        sym_name: ArcStr,
        /// The symbol of the instantiated module.
        module: ArcStr,
    },
    /// A clocked register.
    Register {
        /// The register name.
        sym_name: ArcStr,
        /// The type of the stored value.
        ty: Type,
    },
    /// Any other operation, optionally named.
    Other {
        /// The name of this operation, if it has one.
        sym_name: Option<ArcStr>,
        /// The operation mnemonic (e.g. `hw.constant`).
        mnemonic: ArcStr,
    },
    /// The root of a dynamic instance hierarchy.
    InstanceHierarchy {
        /// The symbol of the top-level module.
        top_module: ArcStr,
    },
    /// A specific instance along one hierarchy path.
    DynamicInstance {
        /// The instantiation site this record corresponds to.
        instance_ref: InnerRef,
    },
    /// A verbatim attribute attached to a dynamic instance.
    VerbatimAttr {
        /// The attribute name.
        name: ArcStr,
        /// The attribute value.
        value: ArcStr,
        /// A path below the instance, formatted as `|a|b`.
        sub_path: Option<ArcStr>,
    },
    /// A physical location assigned to a dynamic instance.
    PhysLocation {
        /// The location.
        loc: PhysLocation,
        /// A path below the instance, formatted as `|a|b`.
        sub_path: Option<ArcStr>,
    },
    /// Per-bit physical locations assigned to a register instance.
    RegPhysLocation {
        /// The locations.
        locs: LocationVector,
    },
}

/// The kind of a record.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum OpKind {
    /// See [`Op::Module`].
    Module,
    /// See [`Op::ModuleExtern`].
    ModuleExtern,
    /// See [`Op::Instance`].
    Instance,
    /// See [`Op::Register`].
    Register,
    /// See [`Op::Other`].
    Other,
    /// See [`Op::InstanceHierarchy`].
    InstanceHierarchy,
    /// See [`Op::DynamicInstance`].
    DynamicInstance,
    /// See [`Op::VerbatimAttr`].
    VerbatimAttr,
    /// See [`Op::PhysLocation`].
    PhysLocation,
    /// See [`Op::RegPhysLocation`].
    RegPhysLocation,
}

impl Display for OpKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match *self {
            Self::Module => "module",
            Self::ModuleExtern => "module.extern",
            Self::Instance => "instance",
            Self::Register => "register",
            Self::Other => "other",
            Self::InstanceHierarchy => "instance_hierarchy",
            Self::DynamicInstance => "dynamic_instance",
            Self::VerbatimAttr => "verbatim_attr",
            Self::PhysLocation => "phys_location",
            Self::RegPhysLocation => "reg_phys_location",
        };
        write!(f, "{s}")
    }
}

impl Op {
    /// The kind of this operation.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Module { .. } => OpKind::Module,
            Self::ModuleExtern { .. } => OpKind::ModuleExtern,
            Self::Instance { .. } => OpKind::Instance,
            Self::Register { .. } => OpKind::Register,
            Self::Other { .. } => OpKind::Other,
            Self::InstanceHierarchy { .. } => OpKind::InstanceHierarchy,
            Self::DynamicInstance { .. } => OpKind::DynamicInstance,
            Self::VerbatimAttr { .. } => OpKind::VerbatimAttr,
            Self::PhysLocation { .. } => OpKind::PhysLocation,
            Self::RegPhysLocation { .. } => OpKind::RegPhysLocation,
        }
    }

    /// The symbol name of this operation, if it has one.
    pub fn sym_name(&self) -> Option<&ArcStr> {
        match self {
            Self::Module { sym_name }
            | Self::ModuleExtern { sym_name }
            | Self::Instance { sym_name, .. }
            | Self::Register { sym_name, .. } => Some(sym_name),
            Self::Other { sym_name, .. } => sym_name.as_ref(),
            _ => None,
        }
    }

    /// Whether records holding this operation may contain other records.
    pub fn has_body(&self) -> bool {
        matches!(
            self,
            Self::Module { .. } | Self::InstanceHierarchy { .. } | Self::DynamicInstance { .. }
        )
    }
}
