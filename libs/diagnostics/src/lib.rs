//! Utilities for collecting and reporting diagnostics.
//!
//! Diagnostics here are advisory: collecting one never aborts the
//! operation that produced it.

#![warn(missing_docs)]

#[cfg(test)]
pub(crate) mod tests;

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

/// An issue that should be reported to users.
pub trait Diagnostic: Debug + Display {
    /// An optional hint telling users how to resolve the issue.
    fn help(&self) -> Option<Box<dyn Display>> {
        None
    }

    /// The severity of this issue.
    ///
    /// Defaults to [`Severity::default`].
    fn severity(&self) -> Severity {
        Default::default()
    }
}

/// Severity levels, ordered from least to most severe.
#[derive(
    Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum Severity {
    /// An informational message.
    Info,
    /// A warning.
    #[default]
    Warning,
    /// An error. Often, but not always, fatal.
    Error,
}

impl Severity {
    #[inline]
    const fn slot(&self) -> usize {
        match *self {
            Self::Info => 0,
            Self::Warning => 1,
            Self::Error => 2,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Emits `issue` as a `tracing` event at the level matching its severity.
pub fn log<T: Diagnostic>(issue: &T) {
    let help = issue.help().map(|h| h.to_string());
    match issue.severity() {
        Severity::Info => tracing::info!(issue = ?issue, help = ?help, "{}", issue),
        Severity::Warning => tracing::warn!(issue = ?issue, help = ?help, "{}", issue),
        Severity::Error => tracing::error!(issue = ?issue, help = ?help, "{}", issue),
    }
}

/// An ordered collection of issues with per-severity counters.
#[derive(Debug, Clone)]
pub struct IssueSet<T> {
    issues: Vec<T>,
    counts: [usize; 3],
}

impl<T> IssueSet<T> {
    /// Creates a new, empty issue set.
    #[inline]
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            counts: [0; 3],
        }
    }

    /// Iterates over the issues in the order they were added.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.issues.iter()
    }

    /// The number of issues in this set.
    #[inline]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if this set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<T: Diagnostic> IssueSet<T> {
    /// Adds `issue` to the set without logging it.
    pub fn add(&mut self, issue: T) {
        self.counts[issue.severity().slot()] += 1;
        self.issues.push(issue);
    }

    /// Logs `issue` through [`log`], then adds it to the set.
    pub fn add_and_log(&mut self, issue: T) {
        log(&issue);
        self.add(issue);
    }

    /// The number of issues with the given severity.
    #[inline]
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity.slot()]
    }

    /// Returns `true` if the set contains an issue of [`Severity::Error`].
    #[inline]
    pub fn has_error(&self) -> bool {
        self.num_errors() > 0
    }

    /// The number of errors in this set.
    #[inline]
    pub fn num_errors(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Returns `true` if the set contains an issue of [`Severity::Warning`].
    #[inline]
    pub fn has_warning(&self) -> bool {
        self.num_warnings() > 0
    }

    /// The number of warnings in this set.
    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.count(Severity::Warning)
    }
}

impl<T: Diagnostic> Extend<T> for IssueSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for issue in iter {
            self.add(issue);
        }
    }
}

impl<T> IntoIterator for IssueSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl<T> Default for IssueSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Display> Display for IssueSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for issue in self.issues.iter() {
            writeln!(f, "{}", issue)?;
        }
        Ok(())
    }
}
