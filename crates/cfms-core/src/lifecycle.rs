//! Folder status machine.
//!
//! Two layers:
//!
//! - [`next_status`] is the bare transition table: given a status, an action
//!   and the acting role, it returns the next status or a
//!   [`TransitionError`]. Every action is owned by exactly one stage.
//! - [`transition`] applies a [`FolderCommand`] to a folder: it runs the
//!   table, checks the per-folder rules (ownership, original reviewer,
//!   required remarks, auditor list), and returns an updated copy plus a
//!   [`TransitionRecord`]. The input folder is never touched, so a refused
//!   command leaves nothing half-written.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deadline::DeadlineGate;
use crate::entities::CourseFolder;
use crate::enums::{ConvenerDecision, CoordinatorDecision, FolderStatus, Role, Verdict};
use crate::errors::{CoreError, TransitionError};
use crate::permissions::ViewerContext;

// ---------------------------------------------------------------------------
// FolderAction
// ---------------------------------------------------------------------------

/// A requested status change, independent of who asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderAction {
    Submit,
    Approve,
    Reject,
    AssignAudit,
    UnassignAudit,
    CompleteAudit,
    ForwardToHod,
    HodDecide(Verdict),
}

impl FolderAction {
    /// Roles that own this action at some stage.
    #[must_use]
    pub const fn owners(self) -> &'static [Role] {
        match self {
            Self::Submit => &[Role::Faculty],
            Self::Approve => &[Role::Coordinator],
            Self::Reject => &[Role::Coordinator, Role::Convener],
            Self::AssignAudit | Self::UnassignAudit | Self::ForwardToHod => &[Role::Convener],
            Self::CompleteAudit => &[Role::AuditMember],
            Self::HodDecide(_) => &[Role::Hod],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::AssignAudit => "assign_audit",
            Self::UnassignAudit => "unassign_audit",
            Self::CompleteAudit => "complete_audit",
            Self::ForwardToHod => "forward_to_hod",
            Self::HodDecide(_) => "hod_decide",
        }
    }
}

impl fmt::Display for FolderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HodDecide(v) => write!(f, "hod_decide({v})"),
            other => f.write_str(other.as_str()),
        }
    }
}

const COORDINATOR_STAGE: &[FolderStatus] = &[
    FolderStatus::Submitted,
    FolderStatus::ApprovedCoordinator,
    FolderStatus::RejectedCoordinator,
];

const CONVENER_DECISION_STAGE: &[FolderStatus] = &[
    FolderStatus::AuditCompleted,
    FolderStatus::SubmittedToHod,
    FolderStatus::RejectedByConvener,
];

const HOD_STAGE: &[FolderStatus] = &[
    FolderStatus::SubmittedToHod,
    FolderStatus::ApprovedByHod,
    FolderStatus::RejectedByHod,
];

/// Bare transition table.
///
/// # Errors
///
/// - `IllegalForRole` when `role` does not own `action`, or owns it only at a
///   different stage than the one `status` belongs to.
/// - `IllegalFromStatus` when no stage may perform `action` from `status`.
pub fn next_status(
    status: FolderStatus,
    action: FolderAction,
    role: Role,
) -> Result<FolderStatus, TransitionError> {
    let for_role = || TransitionError::IllegalForRole {
        action,
        role,
        status,
    };
    let from_status = || TransitionError::IllegalFromStatus { action, status };

    if !action.owners().contains(&role) {
        return Err(for_role());
    }

    let ok_from = |sources: &[FolderStatus], to: FolderStatus| {
        if sources.contains(&status) {
            Ok(to)
        } else {
            Err(from_status())
        }
    };

    match action {
        FolderAction::Submit => {
            if status == FolderStatus::Draft
                || status == FolderStatus::Completed
                || status == FolderStatus::ApprovedByHod
                || status.is_rejected()
            {
                Ok(FolderStatus::Submitted)
            } else {
                Err(from_status())
            }
        }
        FolderAction::Approve => ok_from(COORDINATOR_STAGE, FolderStatus::ApprovedCoordinator),
        FolderAction::Reject => {
            let stage_owner = if COORDINATOR_STAGE.contains(&status) {
                Role::Coordinator
            } else if CONVENER_DECISION_STAGE.contains(&status) {
                Role::Convener
            } else {
                return Err(from_status());
            };
            if stage_owner != role {
                return Err(for_role());
            }
            Ok(match role {
                Role::Coordinator => FolderStatus::RejectedCoordinator,
                _ => FolderStatus::RejectedByConvener,
            })
        }
        FolderAction::AssignAudit => ok_from(
            &[
                FolderStatus::ApprovedCoordinator,
                FolderStatus::AssignedToConvener,
                FolderStatus::UnderAudit,
            ],
            FolderStatus::UnderAudit,
        ),
        FolderAction::UnassignAudit => {
            ok_from(&[FolderStatus::UnderAudit], FolderStatus::ApprovedCoordinator)
        }
        FolderAction::CompleteAudit => ok_from(
            &[FolderStatus::UnderAudit, FolderStatus::AuditCompleted],
            FolderStatus::AuditCompleted,
        ),
        FolderAction::ForwardToHod => ok_from(CONVENER_DECISION_STAGE, FolderStatus::SubmittedToHod),
        FolderAction::HodDecide(verdict) => ok_from(
            HOD_STAGE,
            match verdict {
                Verdict::Approve => FolderStatus::ApprovedByHod,
                Verdict::Reject => FolderStatus::RejectedByHod,
            },
        ),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// The user performing a command, acting under one role of their effective set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// Request-scoped inputs the rules need besides the folder itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEnv {
    pub now: DateTime<Utc>,
    pub gate: DeadlineGate,
    pub require_rejection_remarks: bool,
    pub max_auditors: usize,
}

impl TransitionEnv {
    #[must_use]
    pub const fn new(now: DateTime<Utc>, gate: DeadlineGate) -> Self {
        Self {
            now,
            gate,
            require_rejection_remarks: true,
            max_auditors: 5,
        }
    }
}

/// A mutating request against one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FolderCommand {
    Submit,
    CoordinatorReview {
        verdict: Verdict,
        notes: String,
        remarks: Option<String>,
    },
    AssignAudit {
        auditor_ids: Vec<String>,
    },
    UnassignAudit,
    CompleteAudit,
    ConvenerReview {
        decision: ConvenerDecision,
        notes: String,
    },
    HodDecision {
        verdict: Verdict,
        notes: String,
        final_feedback: Option<String>,
    },
}

impl FolderCommand {
    #[must_use]
    pub const fn action(&self) -> FolderAction {
        match self {
            Self::Submit => FolderAction::Submit,
            Self::CoordinatorReview {
                verdict: Verdict::Approve,
                ..
            } => FolderAction::Approve,
            Self::CoordinatorReview {
                verdict: Verdict::Reject,
                ..
            }
            | Self::ConvenerReview {
                decision: ConvenerDecision::Reject,
                ..
            } => FolderAction::Reject,
            Self::AssignAudit { .. } => FolderAction::AssignAudit,
            Self::UnassignAudit => FolderAction::UnassignAudit,
            Self::CompleteAudit => FolderAction::CompleteAudit,
            Self::ConvenerReview {
                decision: ConvenerDecision::ForwardToHod,
                ..
            } => FolderAction::ForwardToHod,
            Self::HodDecision { verdict, .. } => FolderAction::HodDecide(*verdict),
        }
    }

    /// The role a user must act under to issue this command.
    #[must_use]
    pub const fn acting_role(&self) -> Role {
        match self {
            Self::Submit => Role::Faculty,
            Self::CoordinatorReview { .. } => Role::Coordinator,
            Self::AssignAudit { .. } | Self::UnassignAudit | Self::ConvenerReview { .. } => {
                Role::Convener
            }
            Self::CompleteAudit => Role::AuditMember,
            Self::HodDecision { .. } => Role::Hod,
        }
    }
}

/// What a committed transition did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub folder_id: String,
    pub from: FolderStatus,
    pub to: FolderStatus,
    pub action: FolderAction,
    pub actor: String,
    pub role: Role,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

/// The updated folder and the record of the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub folder: CourseFolder,
    pub record: TransitionRecord,
}

impl TransitionOutcome {
    /// Re-assigning the same auditors while under audit changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.record.from == self.record.to && self.record.action == FolderAction::AssignAudit
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn require_reason(text: &str, env: &TransitionEnv, what: &str) -> Result<(), CoreError> {
    if env.require_rejection_remarks && text.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "{what} requires a non-empty reason"
        )));
    }
    Ok(())
}

/// Dedupe auditor ids, preserving first-seen order.
fn normalize_auditors(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|seen| seen == id) {
            out.push(id.to_string());
        }
    }
    out
}

/// Apply `command` to `folder` on behalf of `actor`.
///
/// Returns a new folder with `version + 1`; the caller persists it with an
/// optimistic check against the original version.
///
/// # Errors
///
/// - `IllegalTransition` for a wrong role or source status.
/// - `PermissionDenied` for folder-level ownership rules.
/// - `Validation` for missing remarks or a bad auditor list.
#[allow(clippy::too_many_lines)]
pub fn transition(
    folder: &CourseFolder,
    command: &FolderCommand,
    actor: &Actor,
    env: &TransitionEnv,
) -> Result<TransitionOutcome, CoreError> {
    let action = command.action();
    let from = folder.status;
    let to = next_status(from, action, actor.role)?;
    let now = env.now;
    let mut next = folder.clone();
    let mut notes = None;

    match command {
        FolderCommand::Submit => {
            if !folder.is_owned_by(&actor.user_id) {
                return Err(CoreError::denied("only the owning faculty may submit a folder"));
            }
            if from == FolderStatus::ApprovedByHod {
                let mut current = folder.clone();
                current.can_edit_for_final_submission = env
                    .gate
                    .final_window_open(folder.first_activity_completed, now);
                if !ViewerContext::editor(Role::Faculty).can_edit(&current) {
                    return Err(CoreError::denied(
                        "the final-submission window is closed for this folder",
                    ));
                }
            }
            next.submitted_at = Some(now);
            notes = Some(
                if from == FolderStatus::ApprovedByHod && folder.first_activity_completed {
                    "second submission".to_string()
                } else {
                    "first submission".to_string()
                },
            );
        }
        FolderCommand::CoordinatorReview {
            verdict,
            notes: review_notes,
            remarks,
        } => {
            if from != FolderStatus::Submitted
                && folder
                    .coordinator_reviewed_by
                    .as_deref()
                    .is_some_and(|by| by != actor.user_id)
            {
                return Err(CoreError::denied(
                    "only the coordinator who reviewed this folder may change the decision",
                ));
            }
            if *verdict == Verdict::Reject {
                let reason = remarks
                    .as_deref()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or(review_notes);
                require_reason(reason, env, "coordinator rejection")?;
            }
            next.coordinator_decision = Some(CoordinatorDecision::from(*verdict));
            next.coordinator_notes = non_empty(review_notes);
            next.coordinator_remarks = remarks.as_deref().and_then(non_empty);
            next.coordinator_reviewed_at = Some(now);
            next.coordinator_reviewed_by = Some(actor.user_id.clone());
            notes = non_empty(review_notes);
        }
        FolderCommand::AssignAudit { auditor_ids } => {
            let auditors = normalize_auditors(auditor_ids);
            if auditors.is_empty() {
                return Err(CoreError::Validation(
                    "at least one auditor must be selected".into(),
                ));
            }
            if auditors.len() > env.max_auditors {
                return Err(CoreError::Validation(format!(
                    "at most {} auditors may be assigned",
                    env.max_auditors
                )));
            }
            // A team left over from an earlier cycle is replaced; only a
            // team currently auditing is protected.
            if from == FolderStatus::UnderAudit {
                let mut current = folder.assigned_auditors.clone();
                let mut requested = auditors.clone();
                current.sort();
                requested.sort();
                if current != requested {
                    return Err(TransitionError::AuditorsMidReview.into());
                }
                return Ok(TransitionOutcome {
                    folder: folder.clone(),
                    record: TransitionRecord {
                        folder_id: folder.id.clone(),
                        from,
                        to,
                        action,
                        actor: actor.user_id.clone(),
                        role: actor.role,
                        notes: None,
                        at: now,
                    },
                });
            }
            notes = Some(format!("assigned {} auditor(s)", auditors.len()));
            next.assigned_auditors = auditors;
            next.convener_assigned_by = Some(actor.user_id.clone());
            next.convener_assigned_at = Some(now);
        }
        FolderCommand::UnassignAudit => {
            notes = Some(format!(
                "unassigned {} auditor(s)",
                folder.assigned_auditors.len()
            ));
            next.assigned_auditors.clear();
            next.convener_assigned_by = None;
            next.convener_assigned_at = None;
        }
        FolderCommand::CompleteAudit => {
            if !folder.is_assigned_auditor(&actor.user_id) {
                return Err(CoreError::denied("you are not assigned to audit this folder"));
            }
        }
        FolderCommand::ConvenerReview {
            decision,
            notes: review_notes,
        } => {
            if *decision == ConvenerDecision::Reject {
                require_reason(review_notes, env, "convener rejection")?;
            }
            next.convener_notes = non_empty(review_notes);
            next.convener_reviewed_by = Some(actor.user_id.clone());
            next.convener_reviewed_at = Some(now);
            notes = non_empty(review_notes);
        }
        FolderCommand::HodDecision {
            verdict,
            notes: review_notes,
            final_feedback,
        } => {
            if *verdict == Verdict::Reject {
                let reason = final_feedback
                    .as_deref()
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or(review_notes);
                require_reason(reason, env, "HOD rejection")?;
            }
            next.hod_notes = non_empty(review_notes);
            next.hod_final_feedback = final_feedback.as_deref().and_then(non_empty);
            next.hod_reviewed_by = Some(actor.user_id.clone());
            next.hod_reviewed_at = Some(now);
            if *verdict == Verdict::Approve && !next.first_activity_completed {
                next.first_activity_completed = true;
            }
            notes = non_empty(review_notes);
        }
    }

    next.status = to;
    next.version = folder.version + 1;
    next.updated_at = now;
    next.can_edit_for_final_submission = env
        .gate
        .final_window_open(next.first_activity_completed, now);

    Ok(TransitionOutcome {
        record: TransitionRecord {
            folder_id: folder.id.clone(),
            from,
            to,
            action,
            actor: actor.user_id.clone(),
            role: actor.role,
            notes,
            at: now,
        },
        folder: next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_support::draft_folder;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn env() -> TransitionEnv {
        TransitionEnv::new(
            Utc.with_ymd_and_hms(2026, 10, 1, 10, 0, 0).unwrap(),
            DeadlineGate::default(),
        )
    }

    fn folder_in(status: FolderStatus) -> CourseFolder {
        let mut folder = draft_folder();
        folder.status = status;
        folder
    }

    #[rstest]
    #[case(FolderStatus::Submitted, FolderStatus::ApprovedCoordinator)]
    #[case(FolderStatus::RejectedCoordinator, FolderStatus::ApprovedCoordinator)]
    #[case(FolderStatus::ApprovedCoordinator, FolderStatus::ApprovedCoordinator)]
    fn coordinator_approve_sources(#[case] from: FolderStatus, #[case] to: FolderStatus) {
        assert_eq!(next_status(from, FolderAction::Approve, Role::Coordinator), Ok(to));
    }

    #[test]
    fn reject_routes_by_stage() {
        assert_eq!(
            next_status(FolderStatus::ApprovedCoordinator, FolderAction::Reject, Role::Coordinator),
            Ok(FolderStatus::RejectedCoordinator)
        );
        assert_eq!(
            next_status(FolderStatus::SubmittedToHod, FolderAction::Reject, Role::Convener),
            Ok(FolderStatus::RejectedByConvener)
        );
        assert!(matches!(
            next_status(FolderStatus::AuditCompleted, FolderAction::Reject, Role::Coordinator),
            Err(TransitionError::IllegalForRole { .. })
        ));
        assert!(matches!(
            next_status(FolderStatus::Draft, FolderAction::Reject, Role::Convener),
            Err(TransitionError::IllegalFromStatus { .. })
        ));
    }

    #[test]
    fn wrong_role_is_illegal_for_role() {
        let err = next_status(FolderStatus::Submitted, FolderAction::Approve, Role::Hod).unwrap_err();
        assert_eq!(
            err,
            TransitionError::IllegalForRole {
                action: FolderAction::Approve,
                role: Role::Hod,
                status: FolderStatus::Submitted,
            }
        );
    }

    #[test]
    fn assign_audit_from_submitted_is_illegal_from_status() {
        assert!(matches!(
            next_status(FolderStatus::Submitted, FolderAction::AssignAudit, Role::Convener),
            Err(TransitionError::IllegalFromStatus { .. })
        ));
    }

    #[test]
    fn hod_can_flip_final_decision() {
        assert_eq!(
            next_status(
                FolderStatus::ApprovedByHod,
                FolderAction::HodDecide(Verdict::Reject),
                Role::Hod
            ),
            Ok(FolderStatus::RejectedByHod)
        );
    }

    #[test]
    fn every_legal_move_is_in_the_edge_table() {
        let actions = [
            FolderAction::Submit,
            FolderAction::Approve,
            FolderAction::Reject,
            FolderAction::AssignAudit,
            FolderAction::UnassignAudit,
            FolderAction::CompleteAudit,
            FolderAction::ForwardToHod,
            FolderAction::HodDecide(Verdict::Approve),
            FolderAction::HodDecide(Verdict::Reject),
        ];
        for status in FolderStatus::ALL {
            for action in actions {
                for role in Role::ALL {
                    if let Ok(to) = next_status(status, action, role) {
                        assert!(
                            status.can_transition_to(to),
                            "{status} --{action}/{role}--> {to} missing from allowed_next_states"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn submit_requires_owner() {
        let folder = draft_folder();
        let err = transition(
            &folder,
            &FolderCommand::Submit,
            &Actor::new("usr-other", Role::Faculty),
            &env(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
    }

    #[test]
    fn submit_stamps_time_and_bumps_version() {
        let folder = draft_folder();
        let out = transition(
            &folder,
            &FolderCommand::Submit,
            &Actor::new("usr-faculty", Role::Faculty),
            &env(),
        )
        .unwrap();
        assert_eq!(out.folder.status, FolderStatus::Submitted);
        assert_eq!(out.folder.version, 2);
        assert_eq!(out.folder.submitted_at, Some(env().now));
        assert_eq!(folder.status, FolderStatus::Draft);
    }

    #[test]
    fn second_submission_needs_open_window() {
        let mut folder = folder_in(FolderStatus::ApprovedByHod);
        folder.first_activity_completed = true;
        let mut closed = env();
        closed.gate.final_submission = Some(closed.now - chrono::Duration::days(1));
        let err = transition(
            &folder,
            &FolderCommand::Submit,
            &Actor::new("usr-faculty", Role::Faculty),
            &closed,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));

        let out = transition(
            &folder,
            &FolderCommand::Submit,
            &Actor::new("usr-faculty", Role::Faculty),
            &env(),
        )
        .unwrap();
        assert_eq!(out.record.notes.as_deref(), Some("second submission"));
    }

    #[test]
    fn rejection_requires_reason() {
        let folder = folder_in(FolderStatus::Submitted);
        let cmd = FolderCommand::CoordinatorReview {
            verdict: Verdict::Reject,
            notes: "   ".into(),
            remarks: None,
        };
        let err = transition(&folder, &cmd, &Actor::new("usr-c", Role::Coordinator), &env())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut lenient = env();
        lenient.require_rejection_remarks = false;
        assert!(transition(&folder, &cmd, &Actor::new("usr-c", Role::Coordinator), &lenient).is_ok());
    }

    #[test]
    fn approval_does_not_need_notes() {
        let folder = folder_in(FolderStatus::Submitted);
        let out = transition(
            &folder,
            &FolderCommand::CoordinatorReview {
                verdict: Verdict::Approve,
                notes: String::new(),
                remarks: None,
            },
            &Actor::new("usr-c", Role::Coordinator),
            &env(),
        )
        .unwrap();
        assert_eq!(out.folder.coordinator_decision, Some(CoordinatorDecision::Approved));
        assert_eq!(out.folder.coordinator_notes, None);
    }

    #[test]
    fn re_review_is_limited_to_original_coordinator() {
        let mut folder = folder_in(FolderStatus::ApprovedCoordinator);
        folder.coordinator_reviewed_by = Some("usr-c1".into());
        let cmd = FolderCommand::CoordinatorReview {
            verdict: Verdict::Reject,
            notes: "missing log".into(),
            remarks: None,
        };
        let err = transition(&folder, &cmd, &Actor::new("usr-c2", Role::Coordinator), &env())
            .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
        let out = transition(&folder, &cmd, &Actor::new("usr-c1", Role::Coordinator), &env()).unwrap();
        assert_eq!(out.folder.status, FolderStatus::RejectedCoordinator);
        assert_eq!(out.folder.coordinator_decision, Some(CoordinatorDecision::Disapproved));
    }

    #[test]
    fn assign_dedupes_and_caps() {
        let folder = folder_in(FolderStatus::ApprovedCoordinator);
        let actor = Actor::new("usr-v", Role::Convener);
        let out = transition(
            &folder,
            &FolderCommand::AssignAudit {
                auditor_ids: vec!["a".into(), "b".into(), "a".into()],
            },
            &actor,
            &env(),
        )
        .unwrap();
        assert_eq!(out.folder.assigned_auditors, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(out.folder.convener_assigned_by.as_deref(), Some("usr-v"));

        let too_many = FolderCommand::AssignAudit {
            auditor_ids: (0..6).map(|i| format!("a{i}")).collect(),
        };
        assert!(matches!(
            transition(&folder, &too_many, &actor, &env()),
            Err(CoreError::Validation(_))
        ));
        let empty = FolderCommand::AssignAudit { auditor_ids: vec![] };
        assert!(matches!(
            transition(&folder, &empty, &actor, &env()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn reassigning_same_team_is_a_noop() {
        let mut folder = folder_in(FolderStatus::UnderAudit);
        folder.assigned_auditors = vec!["a".into(), "b".into()];
        let actor = Actor::new("usr-v", Role::Convener);
        let out = transition(
            &folder,
            &FolderCommand::AssignAudit {
                auditor_ids: vec!["b".into(), "a".into()],
            },
            &actor,
            &env(),
        )
        .unwrap();
        assert!(out.is_noop());
        assert_eq!(out.folder, folder);

        let err = transition(
            &folder,
            &FolderCommand::AssignAudit {
                auditor_ids: vec!["c".into()],
            },
            &actor,
            &env(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::IllegalTransition(TransitionError::AuditorsMidReview)
        ));
    }

    #[test]
    fn stale_team_from_earlier_cycle_is_replaced() {
        let mut folder = folder_in(FolderStatus::ApprovedCoordinator);
        folder.assigned_auditors = vec!["old".into()];
        let out = transition(
            &folder,
            &FolderCommand::AssignAudit {
                auditor_ids: vec!["new".into()],
            },
            &Actor::new("usr-v", Role::Convener),
            &env(),
        )
        .unwrap();
        assert_eq!(out.folder.assigned_auditors, vec!["new".to_string()]);
        assert_eq!(out.folder.status, FolderStatus::UnderAudit);
    }

    #[test]
    fn unassign_clears_team() {
        let mut folder = folder_in(FolderStatus::UnderAudit);
        folder.assigned_auditors = vec!["a".into()];
        folder.convener_assigned_by = Some("usr-v".into());
        let out = transition(
            &folder,
            &FolderCommand::UnassignAudit,
            &Actor::new("usr-v", Role::Convener),
            &env(),
        )
        .unwrap();
        assert_eq!(out.folder.status, FolderStatus::ApprovedCoordinator);
        assert!(out.folder.assigned_auditors.is_empty());
        assert_eq!(out.folder.convener_assigned_by, None);
    }

    #[test]
    fn hod_approval_completes_first_activity_once() {
        let folder = folder_in(FolderStatus::SubmittedToHod);
        let hod = Actor::new("usr-h", Role::Hod);
        let approve = FolderCommand::HodDecision {
            verdict: Verdict::Approve,
            notes: String::new(),
            final_feedback: None,
        };
        let out = transition(&folder, &approve, &hod, &env()).unwrap();
        assert!(out.folder.first_activity_completed);

        let reject = FolderCommand::HodDecision {
            verdict: Verdict::Reject,
            notes: "incomplete".into(),
            final_feedback: None,
        };
        let out = transition(&out.folder, &reject, &hod, &env()).unwrap();
        assert_eq!(out.folder.status, FolderStatus::RejectedByHod);
        assert!(out.folder.first_activity_completed);
    }

    #[test]
    fn complete_audit_requires_assignment() {
        let mut folder = folder_in(FolderStatus::UnderAudit);
        folder.assigned_auditors = vec!["usr-a".into()];
        assert!(matches!(
            transition(
                &folder,
                &FolderCommand::CompleteAudit,
                &Actor::new("usr-b", Role::AuditMember),
                &env()
            ),
            Err(CoreError::PermissionDenied { .. })
        ));
        let out = transition(
            &folder,
            &FolderCommand::CompleteAudit,
            &Actor::new("usr-a", Role::AuditMember),
            &env(),
        )
        .unwrap();
        assert_eq!(out.folder.status, FolderStatus::AuditCompleted);
    }
}
