//! The instance tree.
//!
//! Nodes are stored in an arena owned by the [`System`] and addressed by
//! [`InstanceId`]. Children are materialized lazily from the static site
//! index the first time they are requested. Invalidation empties the arena
//! and starts a new generation, so ids handed out before that point are
//! rejected with [`Error::StaleInstance`].

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use arcstr::ArcStr;
use designir::Type;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::{Error, NotFound, Result};
use crate::module::DefId;
use crate::sites::{Site, SiteKind};
use crate::System;

/// A handle to a node of the instance tree.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "inst{}@{}", self.index, self.generation)
    }
}

/// The kind of an instance tree node.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum InstanceKind {
    /// The root of a hierarchy, standing for a top-level module.
    Root,
    /// An instance of a module.
    Module,
    /// An instance of a register.
    Register,
    /// An instance of any other named operation.
    Leaf,
}

impl Display for InstanceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Root => write!(f, "hierarchy root"),
            Self::Module => write!(f, "module instance"),
            Self::Register => write!(f, "register instance"),
            Self::Leaf => write!(f, "leaf instance"),
        }
    }
}

/// The children of an instance, in site order.
pub type Children = IndexMap<ArcStr, InstanceId>;

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Root { target: DefId },
    Module { target: DefId },
    Register { ty: Type },
    Leaf,
}

impl NodeKind {
    fn kind(&self) -> InstanceKind {
        match self {
            Self::Root { .. } => InstanceKind::Root,
            Self::Module { .. } => InstanceKind::Module,
            Self::Register { .. } => InstanceKind::Register,
            Self::Leaf => InstanceKind::Leaf,
        }
    }

    fn target(&self) -> Option<DefId> {
        match self {
            Self::Root { target } | Self::Module { target } => Some(*target),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    /// `None` for roots.
    pub(crate) name: Option<ArcStr>,
    pub(crate) parent: Option<InstanceId>,
    /// The definition whose body contains the site of this node.
    ///
    /// For roots, the top-level module itself.
    pub(crate) inside_of: DefId,
    pub(crate) root: InstanceId,
    pub(crate) kind: NodeKind,
    /// `None` until first requested.
    children: Option<Arc<Children>>,
}

impl Node {
    fn child(
        parent: InstanceId,
        root: InstanceId,
        inside_of: DefId,
        name: ArcStr,
        kind: NodeKind,
    ) -> Self {
        Self {
            name: Some(name),
            parent: Some(parent),
            inside_of,
            root,
            kind,
            children: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct InstanceTree {
    generation: u32,
    nodes: Vec<Node>,
    roots: HashMap<DefId, InstanceId>,
}

impl InstanceTree {
    pub(crate) fn node(&self, id: InstanceId) -> Result<&Node> {
        if id.generation != self.generation {
            return Err(Error::StaleInstance(id));
        }
        self.nodes
            .get(id.index as usize)
            .ok_or(Error::StaleInstance(id))
    }

    fn node_mut(&mut self, id: InstanceId) -> Result<&mut Node> {
        if id.generation != self.generation {
            return Err(Error::StaleInstance(id));
        }
        self.nodes
            .get_mut(id.index as usize)
            .ok_or(Error::StaleInstance(id))
    }

    fn push(&mut self, node: impl FnOnce(InstanceId) -> Node) -> InstanceId {
        let id = InstanceId {
            index: self.nodes.len() as u32,
            generation: self.generation,
        };
        self.nodes.push(node(id));
        id
    }

    /// Live nodes targeting `def` whose children have been materialized.
    fn materialized(&self, def: DefId) -> Vec<InstanceId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.children.is_some() && node.kind.target() == Some(def))
            .map(|(index, _)| InstanceId {
                index: index as u32,
                generation: self.generation,
            })
            .collect()
    }

    pub(crate) fn invalidate(&mut self) {
        tracing::debug!(
            nodes = self.nodes.len(),
            generation = self.generation,
            "dropping instance tree"
        );
        self.nodes.clear();
        self.roots.clear();
        self.generation += 1;
    }
}

impl System {
    /// The root instance standing for the top-level module `def`.
    ///
    /// Repeated calls return the same root until the next invalidation.
    /// The first call for a definition also creates its instance hierarchy record.
    pub fn get_instance(&mut self, def: DefId) -> Result<InstanceId> {
        if let Some(root) = self.tree.roots.get(&def) {
            return Ok(*root);
        }
        self.built_symbol(def)?;
        let root = self.tree.push(|id| Node {
            name: None,
            parent: None,
            inside_of: def,
            root: id,
            kind: NodeKind::Root { target: def },
            children: None,
        });
        self.tree.roots.insert(def, root);
        tracing::debug!(%def, %root, "created hierarchy root");
        if self.records.mark_rooted(def) {
            self.create_hierarchy_record(def)?;
        }
        Ok(root)
    }

    /// The kind of an instance.
    pub fn kind(&self, inst: InstanceId) -> Result<InstanceKind> {
        Ok(self.tree.node(inst)?.kind.kind())
    }

    /// The name of an instance's site, or [`None`] for roots.
    pub fn name(&self, inst: InstanceId) -> Result<Option<ArcStr>> {
        Ok(self.tree.node(inst)?.name.clone())
    }

    /// The parent of an instance, or [`None`] for roots.
    pub fn parent(&self, inst: InstanceId) -> Result<Option<InstanceId>> {
        Ok(self.tree.node(inst)?.parent)
    }

    /// The root of the hierarchy containing an instance.
    pub fn root_of(&self, inst: InstanceId) -> Result<InstanceId> {
        Ok(self.tree.node(inst)?.root)
    }

    /// The definition whose body contains the instance's site.
    ///
    /// For roots, this is the top-level module.
    pub fn inside_of(&self, inst: InstanceId) -> Result<DefId> {
        Ok(self.tree.node(inst)?.inside_of)
    }

    /// The module instantiated by a root or module instance.
    pub fn target(&self, inst: InstanceId) -> Result<Option<DefId>> {
        Ok(self.tree.node(inst)?.kind.target())
    }

    /// The type stored by a register instance.
    pub fn register_type(&self, inst: InstanceId) -> Result<Option<Type>> {
        Ok(match &self.tree.node(inst)?.kind {
            NodeKind::Register { ty } => Some(ty.clone()),
            _ => None,
        })
    }

    /// The children of an instance, keyed by site name.
    ///
    /// Only roots and module instances have children. The map is built on
    /// first request; later calls return the same map until invalidation or
    /// until a site is added to the instantiated module. Adding a site
    /// replaces the map with one that keeps the existing children and
    /// appends the new one.
    pub fn children(&mut self, inst: InstanceId) -> Result<Arc<Children>> {
        let node = self.tree.node(inst)?;
        if let Some(children) = &node.children {
            return Ok(children.clone());
        }
        let root = node.root;
        let target = node.kind.target();

        let mut children = Children::new();
        if let Some(target) = target {
            let sites = self.sites_of(target)?;
            let kinds = sites
                .values()
                .map(|site| Ok((site, self.site_node_kind(site)?)))
                .collect::<Result<Vec<_>>>()?;
            for (site, kind) in kinds {
                let child = self
                    .tree
                    .push(|_| Node::child(inst, root, target, site.name().clone(), kind));
                children.insert(site.name().clone(), child);
            }
            tracing::trace!(%inst, children = children.len(), "materialized children");
        }

        let children = Arc::new(children);
        self.tree.node_mut(inst)?.children = Some(children.clone());
        Ok(children)
    }

    /// Appends a node for the new site `name` of `def` to every materialized
    /// children map of an instance of `def`.
    pub(crate) fn attach_child(&mut self, def: DefId, name: &ArcStr, kind: NodeKind) -> Result<()> {
        for parent in self.tree.materialized(def) {
            let node = self.tree.node(parent)?;
            let root = node.root;
            let mut children = match &node.children {
                Some(children) if !children.contains_key(name) => Children::clone(children),
                _ => continue,
            };
            let child = self
                .tree
                .push(|_| Node::child(parent, root, def, name.clone(), kind.clone()));
            children.insert(name.clone(), child);
            self.tree.node_mut(parent)?.children = Some(Arc::new(children));
            tracing::trace!(%parent, %child, site = %name, "attached new site");
        }
        Ok(())
    }

    fn site_node_kind(&self, site: &Site) -> Result<NodeKind> {
        Ok(match site.kind() {
            SiteKind::Module { target } => NodeKind::Module {
                target: self.resolve_definition(target)?,
            },
            SiteKind::Register { ty } => NodeKind::Register { ty: ty.clone() },
            SiteKind::Other => NodeKind::Leaf,
        })
    }

    /// The child of `inst` named `name`.
    pub fn child(&mut self, inst: InstanceId, name: &str) -> Result<InstanceId> {
        match self.children(inst)?.get(name) {
            Some(child) => Ok(*child),
            None => Err(NotFound::Child {
                parent: self.describe(inst)?,
                name: name.into(),
            }
            .into()),
        }
    }

    /// Visits `inst` and then, recursively, each of its children in site order.
    pub fn walk(
        &mut self,
        inst: InstanceId,
        mut visit: impl FnMut(&mut System, InstanceId) -> Result<()>,
    ) -> Result<()> {
        self.walk_inner(inst, &mut visit)
    }

    fn walk_inner(
        &mut self,
        inst: InstanceId,
        visit: &mut dyn FnMut(&mut System, InstanceId) -> Result<()>,
    ) -> Result<()> {
        visit(self, inst)?;
        let children = self.children(inst)?;
        for child in children.values() {
            self.walk_inner(*child, visit)?;
        }
        Ok(())
    }

    /// The instances from just below the root down to `inst`, inclusive.
    ///
    /// Empty for roots.
    pub fn path(&self, inst: InstanceId) -> Result<Vec<InstanceId>> {
        let mut path = Vec::new();
        let mut cur = inst;
        while let Some(parent) = self.tree.node(cur)?.parent {
            path.push(cur);
            cur = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// The site names along [`System::path`].
    pub fn path_names(&self, inst: InstanceId) -> Result<Vec<ArcStr>> {
        self.path(inst)?
            .into_iter()
            .map(|id| Ok(self.tree.node(id)?.name.clone().unwrap_or_default()))
            .collect()
    }

    /// A human-readable description of an instance, such as `<instance: [a, b]>`.
    pub fn describe(&self, inst: InstanceId) -> Result<String> {
        Ok(format!(
            "<instance: [{}]>",
            self.path_names(inst)?.iter().join(", ")
        ))
    }
}
