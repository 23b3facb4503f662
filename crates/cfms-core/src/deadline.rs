//! Deadline gate for the second (final-submission) edit window.
//!
//! Both deadlines are inclusive: a window is open while `now <= deadline`.
//! Nothing here is cached; callers rebuild the gate from stored deadlines and
//! the current time on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::FolderDeadline;
use crate::enums::DeadlineKind;

/// Whether a deadline has not yet passed.
#[must_use]
pub fn is_window_open(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now <= deadline
}

/// The two deadlines that apply to one folder's (term, department).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineGate {
    pub first_submission: Option<DateTime<Utc>>,
    pub final_submission: Option<DateTime<Utc>>,
}

impl DeadlineGate {
    /// Pick the effective deadlines for a department from a term's rows.
    ///
    /// A department-specific row wins over a term-wide one (no department).
    #[must_use]
    pub fn resolve(deadlines: &[FolderDeadline], term_id: &str, department_id: &str) -> Self {
        let pick = |kind: DeadlineKind| {
            let candidates = deadlines
                .iter()
                .filter(|d| d.kind == kind && d.term_id == term_id);
            candidates
                .clone()
                .find(|d| d.department_id.as_deref() == Some(department_id))
                .or_else(|| candidates.clone().find(|d| d.department_id.is_none()))
                .map(|d| d.deadline)
        };
        Self {
            first_submission: pick(DeadlineKind::FirstSubmission),
            final_submission: pick(DeadlineKind::FinalSubmission),
        }
    }

    /// First-submission window. Open when no deadline is configured.
    #[must_use]
    pub fn first_window_open(&self, now: DateTime<Utc>) -> bool {
        self.first_submission.is_none_or(|d| is_window_open(d, now))
    }

    /// The derived `canEditForFinalSubmission` flag.
    ///
    /// True only once the first activity is complete, the first deadline has
    /// passed (or none is set), and the final deadline has not (or none is
    /// set).
    #[must_use]
    pub fn final_window_open(&self, first_activity_completed: bool, now: DateTime<Utc>) -> bool {
        if !first_activity_completed {
            return false;
        }
        let after_first = self.first_submission.is_none_or(|d| now > d);
        let before_final = self.final_submission.is_none_or(|d| is_window_open(d, now));
        after_first && before_final
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
    }

    fn row(kind: DeadlineKind, dept: Option<&str>, at: DateTime<Utc>) -> FolderDeadline {
        FolderDeadline {
            id: format!("ddl-{kind}-{dept:?}"),
            kind,
            term_id: "fall".into(),
            department_id: dept.map(str::to_string),
            deadline: at,
            created_at: t(1),
            updated_at: t(1),
        }
    }

    #[test]
    fn window_is_inclusive() {
        assert!(is_window_open(t(5), t(5)));
        assert!(!is_window_open(t(5), t(5) + Duration::seconds(1)));
    }

    #[test]
    fn department_row_beats_term_wide() {
        let rows = vec![
            row(DeadlineKind::FirstSubmission, None, t(10)),
            row(DeadlineKind::FirstSubmission, Some("cs"), t(12)),
            row(DeadlineKind::FinalSubmission, None, t(20)),
        ];
        let gate = DeadlineGate::resolve(&rows, "fall", "cs");
        assert_eq!(gate.first_submission, Some(t(12)));
        assert_eq!(gate.final_submission, Some(t(20)));

        let gate = DeadlineGate::resolve(&rows, "fall", "ee");
        assert_eq!(gate.first_submission, Some(t(10)));
    }

    #[test]
    fn other_terms_are_ignored() {
        let rows = vec![row(DeadlineKind::FirstSubmission, None, t(10))];
        assert_eq!(DeadlineGate::resolve(&rows, "spring", "cs"), DeadlineGate::default());
    }

    #[test]
    fn final_window_requires_first_activity() {
        let gate = DeadlineGate {
            first_submission: Some(t(10)),
            final_submission: Some(t(20)),
        };
        assert!(!gate.final_window_open(false, t(15)));
        assert!(gate.final_window_open(true, t(15)));
    }

    #[test]
    fn final_window_bounds() {
        let gate = DeadlineGate {
            first_submission: Some(t(10)),
            final_submission: Some(t(20)),
        };
        assert!(!gate.final_window_open(true, t(10)));
        assert!(gate.final_window_open(true, t(20)));
        assert!(!gate.final_window_open(true, t(21)));
    }

    #[test]
    fn missing_deadlines_leave_window_open() {
        let gate = DeadlineGate::default();
        assert!(gate.first_window_open(t(1)));
        assert!(gate.final_window_open(true, t(1)));
    }
}
