//! A library for assigning unique names.
//!
//! Names are derived from a base name by appending `_1`, `_2`, and so on
//! until an unused candidate is found.

use std::collections::HashSet;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Returns the first candidate derived from `base_name` for which `is_taken` returns `false`.
///
/// Candidates are tried in the order `base_name`, `base_name_1`, `base_name_2`, ...
///
/// # Examples
///
/// ```
/// let taken = ["core", "core_1"];
/// let name = uniquify::unique_name("core", |n| taken.contains(&n));
/// assert_eq!(name, "core_2");
/// ```
pub fn unique_name(base_name: &str, mut is_taken: impl FnMut(&str) -> bool) -> ArcStr {
    if !is_taken(base_name) {
        return base_name.into();
    }
    let mut i = 1;
    loop {
        let candidate = arcstr::format!("{}_{}", base_name, i);
        if !is_taken(&candidate) {
            break candidate;
        }
        i += 1;
    }
}

/// A set of names that have already been handed out.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Names {
    names: HashSet<ArcStr>,
}

impl Names {
    /// Creates a new, empty name set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Allocates a new, unique name based on `base_name` and marks it as used.
    pub fn assign_name(&mut self, base_name: &str) -> ArcStr {
        let name = unique_name(base_name, |n| self.names.contains(n));
        self.names.insert(name.clone());
        name
    }
}

impl<S: Into<ArcStr>> FromIterator<S> for Names {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
