//! Module symbols.
//!
//! Every built definition is assigned a unique symbol, which is also the
//! `sym_name` of its module record in the design graph. The symbol table
//! caches which symbols are currently taken by top-level graph records; the
//! definition registry remembers which definition owns each symbol.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use arcstr::ArcStr;
use designir::{Graph, OpRef};
use serde::{Deserialize, Serialize};

use crate::error::{NotFound, Result};
use crate::module::DefId;
use crate::System;

/// A module symbol in the design graph.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Symbol(ArcStr);

impl Symbol {
    /// The symbol as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The symbol as a reference-counted string.
    #[inline]
    pub fn as_arcstr(&self) -> &ArcStr {
        &self.0
    }
}

impl Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<ArcStr> for Symbol {
    fn from(value: ArcStr) -> Self {
        Self(value)
    }
}

impl From<Symbol> for ArcStr {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbols taken by top-level graph records.
#[derive(Debug, Default)]
pub(crate) struct SymbolTable {
    /// `None` until the graph is scanned.
    known: Option<HashMap<ArcStr, OpRef>>,
    /// Allocated symbols whose installers have not run yet.
    ///
    /// Survives invalidation.
    pending: HashSet<ArcStr>,
}

impl SymbolTable {
    fn scan(graph: &Graph) -> HashMap<ArcStr, OpRef> {
        let mut known = HashMap::new();
        for op in graph.top_level() {
            if let Ok(record) = graph.op(&op) {
                if let Some(name) = record.sym_name() {
                    known.entry(name.clone()).or_insert(op);
                }
            }
        }
        tracing::debug!(symbols = known.len(), "scanned top-level symbols");
        known
    }

    pub(crate) fn known(&mut self, graph: &Graph) -> &HashMap<ArcStr, OpRef> {
        self.known.get_or_insert_with(|| Self::scan(graph))
    }

    /// Picks a free symbol based on `base` and marks it as pending.
    fn reserve(
        &mut self,
        graph: &Graph,
        base: &str,
        registered: impl Fn(&str) -> bool,
    ) -> Symbol {
        let known = self.known.get_or_insert_with(|| Self::scan(graph));
        let pending = &self.pending;
        let name = uniquify::unique_name(base, |candidate| {
            known.contains_key(candidate) || pending.contains(candidate) || registered(candidate)
        });
        self.pending.insert(name.clone());
        Symbol(name)
    }

    pub(crate) fn lookup(&mut self, graph: &Graph, symbol: &str) -> Option<OpRef> {
        self.known(graph).get(symbol).cloned()
    }

    pub(crate) fn invalidate(&mut self) {
        self.known = None;
    }
}

/// The bidirectional mapping between definitions and their symbols.
///
/// Not a cache: entries survive invalidation.
#[derive(Debug, Default)]
pub(crate) struct DefinitionRegistry {
    module_symbols: HashMap<DefId, Symbol>,
    symbol_modules: HashMap<Symbol, DefId>,
}

/// Registers an allocated symbol once its module record exists.
#[must_use = "the symbol is not registered until the installer is invoked"]
#[derive(Debug)]
pub struct SymbolInstaller {
    def: DefId,
    symbol: Symbol,
}

impl SymbolInstaller {
    /// The symbol being installed.
    #[inline]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Records `op` as the module record of the allocated symbol.
    pub fn install(self, sys: &mut System, op: &OpRef) {
        tracing::debug!(
            def = %self.def,
            symbol = %self.symbol,
            record = %op.id(),
            "installing symbol"
        );
        sys.symbols.pending.remove(self.symbol.as_str());
        if let Some(known) = &mut sys.symbols.known {
            known.insert(self.symbol.as_arcstr().clone(), op.clone());
        }
        sys.registry
            .symbol_modules
            .insert(self.symbol.clone(), self.def);
        sys.registry.module_symbols.insert(self.def, self.symbol);
    }
}

impl System {
    /// Allocates a unique symbol for `def`.
    ///
    /// Returns [`None`] if `def` already has a symbol. Otherwise, returns the
    /// new symbol together with an installer that must be invoked with the
    /// module record once it has been created.
    ///
    /// The symbol is the definition's name if that is free, and the name with
    /// the smallest free `_N` suffix otherwise. A symbol stays taken from the
    /// moment it is allocated, even if its installer has not run yet.
    pub fn allocate_symbol(&mut self, def: DefId) -> Result<Option<(Symbol, SymbolInstaller)>> {
        if self.registry.module_symbols.contains_key(&def) {
            return Ok(None);
        }
        let base = self.defs.get(def)?.name.clone();
        let registered = &self.registry.symbol_modules;
        let symbol = self.symbols.reserve(&self.graph, &base, |candidate| {
            registered.contains_key(candidate)
        });
        tracing::debug!(%def, %symbol, "allocated symbol");
        Ok(Some((symbol.clone(), SymbolInstaller { def, symbol })))
    }

    /// The definition registered under `symbol`.
    pub fn resolve_definition(&self, symbol: &str) -> Result<DefId> {
        self.registry
            .symbol_modules
            .get(symbol)
            .copied()
            .ok_or_else(|| NotFound::Symbol(ArcStr::from(symbol)).into())
    }

    /// The symbol of `def`, if one has been installed.
    pub fn resolve_symbol(&self, def: DefId) -> Option<Symbol> {
        self.registry.module_symbols.get(&def).cloned()
    }

    /// Like [`System::resolve_symbol`], but fails if `def` has not been built.
    pub(crate) fn built_symbol(&self, def: DefId) -> Result<Symbol> {
        self.resolve_symbol(def)
            .ok_or_else(|| NotFound::Unbuilt(def).into())
    }

    /// The module record of `def`, or [`None`] if it has been removed from the graph.
    pub(crate) fn module_record(&mut self, def: DefId) -> Result<Option<OpRef>> {
        let symbol = self.built_symbol(def)?;
        Ok(self.symbols.lookup(&self.graph, &symbol))
    }
}
