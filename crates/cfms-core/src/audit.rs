//! Audit reports and their aggregation.
//!
//! An assigned auditor may submit (and later revise) a report while the
//! folder is `UNDER_AUDIT` or `AUDIT_COMPLETED`. The folder moves to
//! `AUDIT_COMPLETED` on the first rejecting report, or once every assigned
//! auditor has reported.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{AuditAssignment, CourseFolder};
use crate::enums::{AuditDecision, FolderStatus, Role, Verdict};
use crate::errors::{CoreError, TransitionError};
use crate::lifecycle::{
    Actor, FolderAction, FolderCommand, TransitionEnv, TransitionOutcome, transition,
};

/// One auditor's report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// `None` keeps the decision from any earlier report.
    pub decision: Option<Verdict>,
    pub overall_feedback: String,
    #[serde(default)]
    pub ratings: BTreeMap<String, f64>,
}

/// Result of recording a report.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReportOutcome {
    pub assignment: AuditAssignment,
    /// Present when this report completed the audit.
    pub completion: Option<TransitionOutcome>,
}

/// Record `report` for `actor` against the folder's current assignments.
///
/// # Errors
///
/// - `IllegalTransition` if the actor is not acting as an audit member, or
///   the folder is past the audit stage.
/// - `PermissionDenied` if the actor is not assigned to the folder.
/// - `Validation` if the overall feedback is blank.
pub fn record_report(
    folder: &CourseFolder,
    assignments: &[AuditAssignment],
    report: &AuditReport,
    actor: &Actor,
    env: &TransitionEnv,
) -> Result<AuditReportOutcome, CoreError> {
    if actor.role != Role::AuditMember {
        return Err(TransitionError::IllegalForRole {
            action: FolderAction::CompleteAudit,
            role: actor.role,
            status: folder.status,
        }
        .into());
    }
    let Some(current) = assignments.iter().find(|a| a.auditor_id == actor.user_id) else {
        return Err(CoreError::denied("you are not assigned to audit this folder"));
    };
    if !matches!(
        folder.status,
        FolderStatus::UnderAudit | FolderStatus::AuditCompleted
    ) {
        return Err(TransitionError::IllegalFromStatus {
            action: FolderAction::CompleteAudit,
            status: folder.status,
        }
        .into());
    }
    let feedback = report.overall_feedback.trim();
    if feedback.is_empty() {
        return Err(CoreError::Validation("overall feedback is required".into()));
    }

    let mut updated = current.clone();
    updated.overall_feedback = Some(feedback.to_string());
    updated.submitted_at = Some(env.now);
    if let Some(verdict) = report.decision {
        updated.decision = match verdict {
            Verdict::Approve => AuditDecision::Approved,
            Verdict::Reject => AuditDecision::Rejected,
        };
    }
    if !report.ratings.is_empty() {
        updated.ratings.clone_from(&report.ratings);
    }

    let all_reported = assignments
        .iter()
        .all(|a| a.auditor_id == actor.user_id || a.has_reported());
    let completes = folder.status == FolderStatus::UnderAudit
        && (updated.decision == AuditDecision::Rejected || all_reported);

    let completion = if completes {
        let mut outcome = transition(folder, &FolderCommand::CompleteAudit, actor, env)?;
        outcome.record.notes = Some(if updated.decision == AuditDecision::Rejected {
            "audit completed early: rejected by an auditor".to_string()
        } else {
            "audit completed: every auditor reported".to_string()
        });
        Some(outcome)
    } else {
        None
    };

    Ok(AuditReportOutcome {
        assignment: updated,
        completion,
    })
}

/// Aggregate view of every assignment on a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_assignments: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub overall_decision: AuditDecision,
    pub average_ratings: BTreeMap<String, f64>,
}

/// Any rejection wins, then any pending, else approved. No assignments is pending.
#[must_use]
pub fn summarize(assignments: &[AuditAssignment]) -> AuditSummary {
    let count = |d: AuditDecision| assignments.iter().filter(|a| a.decision == d).count();
    let approved = count(AuditDecision::Approved);
    let rejected = count(AuditDecision::Rejected);
    let pending = count(AuditDecision::Pending);

    let overall_decision = if rejected > 0 {
        AuditDecision::Rejected
    } else if pending > 0 || approved == 0 {
        AuditDecision::Pending
    } else {
        AuditDecision::Approved
    };

    let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for (key, value) in assignments.iter().flat_map(|a| a.ratings.iter()) {
        let entry = sums.entry(key.clone()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    let average_ratings = sums
        .into_iter()
        .map(|(k, (sum, n))| (k, sum / f64::from(n)))
        .collect();

    AuditSummary {
        total_assignments: assignments.len(),
        approved,
        rejected,
        pending,
        overall_decision,
        average_ratings,
    }
}
