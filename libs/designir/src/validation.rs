//! Structural validation of design graphs.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use diagnostics::{Diagnostic, IssueSet, Severity};
use tracing::{span, Level};

use super::*;

/// An issue identified during validation of a [`Graph`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidatorIssue {
    cause: Cause,
    severity: Severity,
}

/// The cause of a [`ValidatorIssue`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// Two top-level records share a symbol.
    DuplicateSymbol {
        /// The shared symbol.
        symbol: ArcStr,
    },
    /// Two records in the same module body share a name.
    DuplicateSiteName {
        /// The symbol of the module.
        module: ArcStr,
        /// The shared name.
        name: ArcStr,
    },
    /// An instance refers to a module symbol that does not exist.
    UnknownModule {
        /// The symbol of the module containing the instance.
        parent: ArcStr,
        /// The instance name.
        instance: ArcStr,
        /// The missing module symbol.
        target: ArcStr,
    },
    /// An instance hierarchy is rooted at a module symbol that does not exist.
    UnknownHierarchyTop {
        /// The missing module symbol.
        top: ArcStr,
    },
    /// A dynamic instance refers to a site that does not exist.
    DanglingDynamicInstance {
        /// The unresolved reference.
        instance_ref: InnerRef,
    },
}

impl Diagnostic for ValidatorIssue {
    fn severity(&self) -> Severity {
        self.severity
    }
}

impl ValidatorIssue {
    pub(crate) fn new(cause: Cause, severity: Severity) -> Self {
        Self { cause, severity }
    }

    /// The underlying cause of this issue.
    #[inline]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl Display for ValidatorIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSymbol { symbol } => write!(
                f,
                "duplicate symbol: found two or more top-level records named `{}`",
                symbol
            ),
            Self::DuplicateSiteName { module, name } => write!(
                f,
                "duplicate site names: found two or more records named `{}` in module `{}`",
                name, module
            ),
            Self::UnknownModule {
                parent,
                instance,
                target,
            } => write!(
                f,
                "unknown module: instance `{}` in module `{}` instantiates `{}`, which does not exist",
                instance, parent, target
            ),
            Self::UnknownHierarchyTop { top } => write!(
                f,
                "unknown module: instance hierarchy is rooted at `{}`, which does not exist",
                top
            ),
            Self::DanglingDynamicInstance { instance_ref } => write!(
                f,
                "dangling dynamic instance: `{}` does not name an existing site",
                instance_ref
            ),
        }
    }
}

impl Graph {
    /// Checks the graph for structural problems.
    ///
    /// Issues are logged as they are found.
    pub fn validate(&self) -> IssueSet<ValidatorIssue> {
        let _guard = span!(Level::INFO, "validating design graph", records = self.len()).entered();

        let mut issues = IssueSet::new();
        let mut error = |cause| issues.add_and_log(ValidatorIssue::new(cause, Severity::Error));

        let mut modules: HashMap<ArcStr, Option<HashSet<ArcStr>>> = HashMap::new();
        for top in self.top.iter() {
            let record = &self.records[top];
            let Some(symbol) = record.op.sym_name() else {
                continue;
            };
            if modules.contains_key(symbol) {
                error(Cause::DuplicateSymbol {
                    symbol: symbol.clone(),
                });
                continue;
            }
            let sites = record.body.as_ref().map(|body| {
                let mut names = HashSet::new();
                for child in body {
                    if let Some(name) = self.records[child].op.sym_name() {
                        if !names.insert(name.clone()) {
                            error(Cause::DuplicateSiteName {
                                module: symbol.clone(),
                                name: name.clone(),
                            });
                        }
                    }
                }
                names
            });
            modules.insert(symbol.clone(), sites);
        }

        for top in self.top.iter() {
            let record = &self.records[top];
            match &record.op {
                Op::Module { sym_name } => {
                    for child in record.body.iter().flatten() {
                        if let Op::Instance {
                            sym_name: instance,
                            module,
                        } = &self.records[child].op
                        {
                            if !modules.contains_key(module) {
                                error(Cause::UnknownModule {
                                    parent: sym_name.clone(),
                                    instance: instance.clone(),
                                    target: module.clone(),
                                });
                            }
                        }
                    }
                }
                Op::InstanceHierarchy { top_module } => {
                    if !modules.contains_key(top_module) {
                        error(Cause::UnknownHierarchyTop {
                            top: top_module.clone(),
                        });
                    }
                }
                _ => {}
            }
        }

        for record in self.records.values() {
            if let Op::DynamicInstance { instance_ref } = &record.op {
                let exists = modules
                    .get(&instance_ref.module)
                    .and_then(Option::as_ref)
                    .is_some_and(|sites| sites.contains(&instance_ref.name));
                if !exists {
                    error(Cause::DanglingDynamicInstance {
                        instance_ref: instance_ref.clone(),
                    });
                }
            }
        }

        issues
    }
}
