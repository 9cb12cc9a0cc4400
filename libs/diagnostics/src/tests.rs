use std::fmt::Display;

use test_log::test;

use crate::*;

#[derive(Debug, Clone)]
pub struct StaleHandles {
    count: usize,
    severity: Severity,
}

impl Display for StaleHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} handles still live", self.count)
    }
}

impl Diagnostic for StaleHandles {
    fn severity(&self) -> Severity {
        self.severity
    }
}

fn issue(severity: Severity) -> StaleHandles {
    StaleHandles { count: 1, severity }
}

#[test]
fn counters_track_severity() {
    let mut issues: IssueSet<StaleHandles> = IssueSet::new();
    issues.add(issue(Severity::Info));
    assert_eq!(issues.count(Severity::Info), 1);
    assert!(!issues.has_error());
    assert!(!issues.has_warning());

    issues.add_and_log(issue(Severity::Warning));
    assert_eq!(issues.num_warnings(), 1);
    assert!(issues.has_warning());
    assert!(!issues.has_error());

    issues.extend([issue(Severity::Error), issue(Severity::Error)]);
    assert_eq!(issues.num_errors(), 2);
    assert!(issues.has_error());
    assert_eq!(issues.len(), 4);
}

#[test]
fn display_lists_issues_in_order() {
    let mut issues = IssueSet::new();
    issues.add(StaleHandles {
        count: 3,
        severity: Severity::Warning,
    });
    issues.add(StaleHandles {
        count: 1,
        severity: Severity::Info,
    });
    assert_eq!(
        issues.to_string(),
        "3 handles still live\n1 handles still live\n"
    );
}

#[test]
fn severities_are_ordered() {
    assert!(Severity::Info < Severity::Warning);
    assert!(Severity::Warning < Severity::Error);
    assert_eq!(Severity::default(), Severity::Warning);
}
