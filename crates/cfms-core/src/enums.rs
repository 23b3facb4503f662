//! Status, role, decision and deadline enums for the folder pipeline.
//!
//! Status and role tokens are stored and exchanged as exact upper-case
//! strings (`SUBMITTED`, `AUDIT_MEMBER`, ...) via
//! `#[serde(rename_all = "SCREAMING_SNAKE_CASE")]`. Storage uses `as_str()`
//! and parses back through serde so both paths agree.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FolderStatus
// ---------------------------------------------------------------------------

/// Status of a course folder through the approval pipeline.
///
/// ```text
/// DRAFT → SUBMITTED → APPROVED_COORDINATOR → UNDER_AUDIT → AUDIT_COMPLETED → SUBMITTED_TO_HOD → APPROVED_BY_HOD
///                   → REJECTED_COORDINATOR                                 → REJECTED_BY_CONVENER              → REJECTED_BY_HOD
///
/// REJECTED_* and APPROVED_BY_HOD → SUBMITTED (resubmission)
/// each stage may re-decide its own outcome (re-review)
/// ```
///
/// `ASSIGNED_TO_CONVENER` is accepted as a stored value for folders handed
/// to a convener before auditors are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FolderStatus {
    Draft,
    Completed,
    Submitted,
    ApprovedCoordinator,
    RejectedCoordinator,
    AssignedToConvener,
    UnderAudit,
    AuditCompleted,
    RejectedByConvener,
    SubmittedToHod,
    ApprovedByHod,
    RejectedByHod,
}

impl FolderStatus {
    pub const ALL: [Self; 12] = [
        Self::Draft,
        Self::Completed,
        Self::Submitted,
        Self::ApprovedCoordinator,
        Self::RejectedCoordinator,
        Self::AssignedToConvener,
        Self::UnderAudit,
        Self::AuditCompleted,
        Self::RejectedByConvener,
        Self::SubmittedToHod,
        Self::ApprovedByHod,
        Self::RejectedByHod,
    ];

    /// Valid next states from the current state, across all actions.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft | Self::Completed => &[Self::Submitted],
            Self::Submitted => &[Self::ApprovedCoordinator, Self::RejectedCoordinator],
            Self::ApprovedCoordinator => &[
                Self::ApprovedCoordinator,
                Self::RejectedCoordinator,
                Self::UnderAudit,
            ],
            Self::RejectedCoordinator => &[
                Self::ApprovedCoordinator,
                Self::RejectedCoordinator,
                Self::Submitted,
            ],
            Self::AssignedToConvener => &[Self::UnderAudit],
            Self::UnderAudit => &[
                Self::UnderAudit,
                Self::AuditCompleted,
                Self::ApprovedCoordinator,
            ],
            Self::AuditCompleted => &[
                Self::AuditCompleted,
                Self::SubmittedToHod,
                Self::RejectedByConvener,
            ],
            Self::RejectedByConvener => &[
                Self::SubmittedToHod,
                Self::RejectedByConvener,
                Self::Submitted,
            ],
            Self::SubmittedToHod => &[
                Self::SubmittedToHod,
                Self::RejectedByConvener,
                Self::ApprovedByHod,
                Self::RejectedByHod,
            ],
            Self::ApprovedByHod => &[Self::ApprovedByHod, Self::RejectedByHod, Self::Submitted],
            Self::RejectedByHod => &[Self::ApprovedByHod, Self::RejectedByHod, Self::Submitted],
        }
    }

    /// Check whether transitioning to `next` is allowed by some action.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// One of the three `REJECTED_*` statuses.
    #[must_use]
    pub const fn is_rejected(self) -> bool {
        matches!(
            self,
            Self::RejectedCoordinator | Self::RejectedByConvener | Self::RejectedByHod
        )
    }

    /// Statuses in which faculty may read reviewer feedback.
    #[must_use]
    pub const fn is_reviewable(self) -> bool {
        matches!(
            self,
            Self::Submitted
                | Self::ApprovedCoordinator
                | Self::AssignedToConvener
                | Self::UnderAudit
                | Self::AuditCompleted
                | Self::SubmittedToHod
                | Self::ApprovedByHod
                | Self::Completed
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Completed => "COMPLETED",
            Self::Submitted => "SUBMITTED",
            Self::ApprovedCoordinator => "APPROVED_COORDINATOR",
            Self::RejectedCoordinator => "REJECTED_COORDINATOR",
            Self::AssignedToConvener => "ASSIGNED_TO_CONVENER",
            Self::UnderAudit => "UNDER_AUDIT",
            Self::AuditCompleted => "AUDIT_COMPLETED",
            Self::RejectedByConvener => "REJECTED_BY_CONVENER",
            Self::SubmittedToHod => "SUBMITTED_TO_HOD",
            Self::ApprovedByHod => "APPROVED_BY_HOD",
            Self::RejectedByHod => "REJECTED_BY_HOD",
        }
    }
}

impl fmt::Display for FolderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Primary role of a user account. Exactly one per user.
///
/// The legacy labels `AUDIT_TEAM` and `EVALUATOR` parse to `AUDIT_MEMBER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Faculty,
    Coordinator,
    Convener,
    Hod,
    #[serde(alias = "AUDIT_TEAM", alias = "EVALUATOR")]
    AuditMember,
}

impl Role {
    pub const ALL: [Self; 6] = [
        Self::Admin,
        Self::Faculty,
        Self::Coordinator,
        Self::Convener,
        Self::Hod,
        Self::AuditMember,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Faculty => "FACULTY",
            Self::Coordinator => "COORDINATOR",
            Self::Convener => "CONVENER",
            Self::Hod => "HOD",
            Self::AuditMember => "AUDIT_MEMBER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Approve or reject, as requested by a reviewing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored coordinator decision for the current review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinatorDecision {
    Approved,
    Disapproved,
}

impl CoordinatorDecision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Disapproved => "DISAPPROVED",
        }
    }
}

impl From<Verdict> for CoordinatorDecision {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Approve => Self::Approved,
            Verdict::Reject => Self::Disapproved,
        }
    }
}

impl fmt::Display for CoordinatorDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a convener does with an audited folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvenerDecision {
    ForwardToHod,
    Reject,
}

impl ConvenerDecision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForwardToHod => "forward_to_hod",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for ConvenerDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-auditor decision on an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditDecision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AuditDecision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for AuditDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DeadlineKind
// ---------------------------------------------------------------------------

/// The two term-scoped deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadlineKind {
    FirstSubmission,
    FinalSubmission,
}

impl DeadlineKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstSubmission => "FIRST_SUBMISSION",
            Self::FinalSubmission => "FINAL_SUBMISSION",
        }
    }
}

impl fmt::Display for DeadlineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AccessRequestStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a cross-role access request.
///
/// ```text
/// PENDING → APPROVED
///         → REJECTED → PENDING (re-request replaces the rejected row)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl AccessRequestStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Rejected => &[Self::Pending],
            Self::Approved => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for AccessRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Entity kinds named in errors and trail records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Folder,
    Deadline,
    AuditAssignment,
    AccessRequest,
    Share,
    Feedback,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Folder => "folder",
            Self::Deadline => "deadline",
            Self::AuditAssignment => "audit_assignment",
            Self::AccessRequest => "access_request",
            Self::Share => "share",
            Self::Feedback => "feedback",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TrailOp
// ---------------------------------------------------------------------------

/// Operation recorded in the JSONL decision trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailOp {
    Create,
    Update,
    Delete,
    Transition,
}

impl TrailOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Transition => "transition",
        }
    }
}

impl fmt::Display for TrailOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val: $ty = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let back: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(back, val);
                assert_eq!(val.as_str(), $expected_str);
            }
        };
    }

    test_serde_roundtrip!(status_draft, FolderStatus, FolderStatus::Draft, "DRAFT");
    test_serde_roundtrip!(
        status_approved_coordinator,
        FolderStatus,
        FolderStatus::ApprovedCoordinator,
        "APPROVED_COORDINATOR"
    );
    test_serde_roundtrip!(
        status_rejected_by_convener,
        FolderStatus,
        FolderStatus::RejectedByConvener,
        "REJECTED_BY_CONVENER"
    );
    test_serde_roundtrip!(
        status_submitted_to_hod,
        FolderStatus,
        FolderStatus::SubmittedToHod,
        "SUBMITTED_TO_HOD"
    );
    test_serde_roundtrip!(role_hod, Role, Role::Hod, "HOD");
    test_serde_roundtrip!(role_audit, Role, Role::AuditMember, "AUDIT_MEMBER");
    test_serde_roundtrip!(
        decision_disapproved,
        CoordinatorDecision,
        CoordinatorDecision::Disapproved,
        "DISAPPROVED"
    );
    test_serde_roundtrip!(
        deadline_final,
        DeadlineKind,
        DeadlineKind::FinalSubmission,
        "FINAL_SUBMISSION"
    );

    #[test]
    fn every_status_token_matches_serde() {
        for status in FolderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
        }
    }

    #[test]
    fn legacy_audit_labels_parse_to_audit_member() {
        for label in ["\"AUDIT_TEAM\"", "\"EVALUATOR\"", "\"AUDIT_MEMBER\""] {
            let role: Role = serde_json::from_str(label).unwrap();
            assert_eq!(role, Role::AuditMember);
        }
    }

    #[test]
    fn status_tokens_are_case_sensitive() {
        assert!(serde_json::from_str::<FolderStatus>("\"submitted\"").is_err());
    }

    #[test]
    fn rejected_statuses() {
        let rejected: Vec<_> = FolderStatus::ALL
            .into_iter()
            .filter(|s| s.is_rejected())
            .collect();
        assert_eq!(
            rejected,
            vec![
                FolderStatus::RejectedCoordinator,
                FolderStatus::RejectedByConvener,
                FolderStatus::RejectedByHod,
            ]
        );
    }

    #[test]
    fn draft_is_not_reviewable() {
        assert!(!FolderStatus::Draft.is_reviewable());
        assert!(FolderStatus::Submitted.is_reviewable());
        assert!(!FolderStatus::RejectedByHod.is_reviewable());
    }

    #[test]
    fn resubmission_edges() {
        assert!(FolderStatus::RejectedByHod.can_transition_to(FolderStatus::Submitted));
        assert!(FolderStatus::ApprovedByHod.can_transition_to(FolderStatus::Submitted));
        assert!(!FolderStatus::UnderAudit.can_transition_to(FolderStatus::Submitted));
    }

    #[test]
    fn access_request_transitions() {
        assert!(AccessRequestStatus::Pending.can_transition_to(AccessRequestStatus::Approved));
        assert!(AccessRequestStatus::Rejected.can_transition_to(AccessRequestStatus::Pending));
        assert!(!AccessRequestStatus::Approved.can_transition_to(AccessRequestStatus::Pending));
    }
}
