//! Module definitions and generation.
//!
//! A definition becomes a module record in the design graph the first time
//! it is built, either as a top-level module or as the target of an
//! instance. Building a generated module queues its generator; the queue is
//! drained by [`System::generate`].

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use arcstr::ArcStr;
use designir::{Op, OpRef, Type};
use serde::{Deserialize, Serialize};
use tracing::{span, Level};
use uniquify::Names;

use crate::error::{NotFound, Result};
use crate::instance::NodeKind;
use crate::symbols::Symbol;
use crate::System;

/// A handle to a module definition.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DefId(u32);

impl Display for DefId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "def{}", self.0)
    }
}

/// A function that populates the body of a module.
pub type Generator = dyn Fn(&mut ModuleBuilder<'_>) -> Result<()>;

#[derive(Clone)]
pub(crate) enum DefBody {
    Extern,
    Generated(Arc<Generator>),
}

impl std::fmt::Debug for DefBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extern => write!(f, "Extern"),
            Self::Generated(_) => write!(f, "Generated(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Definition {
    pub(crate) name: ArcStr,
    pub(crate) body: DefBody,
}

#[derive(Debug, Default)]
pub(crate) struct Definitions {
    defs: Vec<Definition>,
    /// Built definitions whose generators have not run yet.
    pub(crate) queue: VecDeque<DefId>,
}

impl Definitions {
    fn push(&mut self, definition: Definition) -> DefId {
        let id = DefId(self.defs.len() as u32);
        self.defs.push(definition);
        id
    }

    pub(crate) fn get(&self, def: DefId) -> Result<&Definition> {
        self.defs
            .get(def.0 as usize)
            .ok_or_else(|| NotFound::Definition(def).into())
    }
}

/// Populates the body of a module record.
///
/// Site names are uniquified within the module: requesting a name that is
/// already in use yields the name with the smallest free `_N` suffix.
pub struct ModuleBuilder<'a> {
    sys: &'a mut System,
    def: DefId,
    module: OpRef,
    symbol: Symbol,
    names: Names,
}

impl ModuleBuilder<'_> {
    /// The definition being generated.
    #[inline]
    pub fn def(&self) -> DefId {
        self.def
    }

    /// The symbol of the module being generated.
    #[inline]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn add(&mut self, op: Op) -> Result<()> {
        self.sys.graph.create(Some(&self.module), op)?;
        self.sys.sites.forget(self.module.id());
        Ok(())
    }

    /// Adds a named site and attaches it to every instance of this module
    /// whose children are already materialized.
    fn add_site(&mut self, name: ArcStr, op: Op, kind: NodeKind) -> Result<ArcStr> {
        self.add(op)?;
        self.sys.attach_child(self.def, &name, kind)?;
        Ok(name)
    }

    /// Instantiates `target`, building its module record if necessary.
    ///
    /// Returns the name assigned to the site.
    pub fn instance(&mut self, name: &str, target: DefId) -> Result<ArcStr> {
        let module = self.sys.build_definition(target)?;
        let sym_name = self.names.assign_name(name);
        self.add_site(
            sym_name.clone(),
            Op::Instance {
                sym_name,
                module: module.into(),
            },
            NodeKind::Module { target },
        )
    }

    /// Adds a register storing values of type `ty`.
    pub fn register(&mut self, name: &str, ty: Type) -> Result<ArcStr> {
        let sym_name = self.names.assign_name(name);
        self.add_site(
            sym_name.clone(),
            Op::Register {
                sym_name,
                ty: ty.clone(),
            },
            NodeKind::Register { ty },
        )
    }

    /// Adds some other named operation.
    pub fn named(&mut self, name: &str, mnemonic: &str) -> Result<ArcStr> {
        let sym_name = self.names.assign_name(name);
        self.add_site(
            sym_name.clone(),
            Op::Other {
                sym_name: Some(sym_name),
                mnemonic: mnemonic.into(),
            },
            NodeKind::Leaf,
        )
    }

    /// Adds an operation without a name. It will not show up as a site.
    pub fn unnamed(&mut self, mnemonic: &str) -> Result<()> {
        self.add(Op::Other {
            sym_name: None,
            mnemonic: mnemonic.into(),
        })
    }
}

impl System {
    /// Defines a module whose body is produced by `generator`.
    pub fn define_module(
        &mut self,
        name: impl Into<ArcStr>,
        generator: impl Fn(&mut ModuleBuilder<'_>) -> Result<()> + 'static,
    ) -> DefId {
        self.defs.push(Definition {
            name: name.into(),
            body: DefBody::Generated(Arc::new(generator)),
        })
    }

    /// Defines an externally implemented module with an opaque body.
    pub fn define_extern(&mut self, name: impl Into<ArcStr>) -> DefId {
        self.defs.push(Definition {
            name: name.into(),
            body: DefBody::Extern,
        })
    }

    /// The name `def` was defined with.
    pub fn definition_name(&self, def: DefId) -> Result<&ArcStr> {
        Ok(&self.defs.get(def)?.name)
    }

    /// Returns `true` if `def` is an external module.
    pub fn is_extern(&self, def: DefId) -> Result<bool> {
        Ok(matches!(self.defs.get(def)?.body, DefBody::Extern))
    }

    /// Builds `def` and marks it as a top-level module of the design.
    pub fn add_top(&mut self, def: DefId) -> Result<Symbol> {
        let symbol = self.build_definition(def)?;
        if !self.tops.contains(&def) {
            self.tops.push(def);
        }
        Ok(symbol)
    }

    /// The top-level modules, in the order they were added.
    #[inline]
    pub fn top_modules(&self) -> &[DefId] {
        &self.tops
    }

    /// Creates the module record of `def` if it does not have one yet.
    pub(crate) fn build_definition(&mut self, def: DefId) -> Result<Symbol> {
        let (symbol, installer) = match self.allocate_symbol(def)? {
            Some(allocated) => allocated,
            None => return self.built_symbol(def),
        };
        let is_extern = self.is_extern(def)?;
        let op = if is_extern {
            Op::ModuleExtern {
                sym_name: symbol.as_arcstr().clone(),
            }
        } else {
            Op::Module {
                sym_name: symbol.as_arcstr().clone(),
            }
        };
        let record = self.graph.create(None, op)?;
        installer.install(self, &record);
        if !is_extern {
            self.defs.queue.push_back(def);
        }
        Ok(symbol)
    }

    /// The number of built modules whose generators have not run yet.
    #[inline]
    pub fn pending_generation(&self) -> usize {
        self.defs.queue.len()
    }

    /// Runs queued generators, most recently queued first.
    ///
    /// Generators may instantiate modules that have not been built yet, which
    /// queues more work. Stops after `iters` generators if a limit is given.
    /// Returns the number of modules still waiting to be generated.
    pub fn generate(&mut self, iters: Option<usize>) -> Result<usize> {
        let _guard = span!(Level::INFO, "generating modules", system = %self.config.name).entered();

        let mut done = 0;
        while iters.map_or(true, |n| done < n) {
            let Some(def) = self.defs.queue.pop_back() else {
                break;
            };
            self.run_generator(def)?;
            done += 1;
        }
        tracing::info!(done, pending = self.pending_generation(), "generated modules");
        Ok(self.pending_generation())
    }

    fn run_generator(&mut self, def: DefId) -> Result<()> {
        let generator = match &self.defs.get(def)?.body {
            DefBody::Generated(generator) => generator.clone(),
            DefBody::Extern => return Ok(()),
        };
        let symbol = self.built_symbol(def)?;
        let module = self
            .module_record(def)?
            .ok_or(NotFound::Symbol(symbol.as_arcstr().clone()))?;
        let names = self
            .graph
            .named_children(&module)?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        tracing::debug!(%def, %symbol, "running generator");

        let mut builder = ModuleBuilder {
            sys: self,
            def,
            module,
            symbol,
            names,
        };
        generator(&mut builder)
    }
}
