//! Status transitions: the single write path for every `FolderCommand`.
//!
//! `apply_command` reads the folder fresh, evaluates the pure rule, and
//! commits the new row, its audit assignments and a history entry in one
//! transaction guarded by the folder `version`. The trail and
//! notifications follow the commit.

use chrono::Utc;

use cfms_core::access::EffectiveRoleSet;
use cfms_core::entities::CourseFolder;
use cfms_core::enums::{ConvenerDecision, EntityType, FolderStatus, Role, TrailOp, Verdict};
use cfms_core::errors::{CoreError, TransitionError};
use cfms_core::lifecycle::{Actor, FolderAction, FolderCommand, TransitionOutcome, transition};
use cfms_core::responses::TransitionResponse;
use cfms_core::trail::TrailOperation;

use crate::error::DatabaseError;
use crate::notify::{Notification, NotificationKind};
use crate::repos::folder::{check_expected_version, write_folder};
use crate::repos::history::append_history;
use crate::service::FolderService;

impl FolderService {
    /// Apply one command to a folder on behalf of `actor_id`.
    ///
    /// The actor acts under the role the command needs; if that role is not
    /// in their effective set the command fails with `IllegalForRole`.
    /// `expected_version` is the version the caller last saw, if any.
    ///
    /// # Errors
    ///
    /// - `IllegalTransition`, `PermissionDenied`, `Validation` from the rules.
    /// - `ConcurrencyConflict` when the folder changed since `expected_version`
    ///   or since it was read.
    pub async fn apply_command(
        &self,
        folder_id: &str,
        actor_id: &str,
        command: &FolderCommand,
        expected_version: Option<i64>,
    ) -> Result<TransitionResponse, DatabaseError> {
        let (user, roles) = self.resolve_user(actor_id).await?;
        let now = Utc::now();
        let folder = self.refresh_derived(self.load_folder(folder_id).await?, now).await?;
        check_expected_version(&folder, expected_version)?;

        let role = command.acting_role();
        if !roles.contains(role) {
            let err = TransitionError::IllegalForRole {
                action: command.action(),
                role: roles.primary(),
                status: folder.status,
            };
            tracing::warn!(folder = %folder.id, actor = %user.id, %err, "transition refused");
            return Err(err.into());
        }
        match command {
            FolderCommand::CompleteAudit => {
                return Err(CoreError::Validation(
                    "audits complete through submitted audit reports".into(),
                )
                .into());
            }
            FolderCommand::AssignAudit { auditor_ids } => {
                self.validate_auditors(auditor_ids).await?;
            }
            _ => {}
        }

        let gate = self.deadline_gate(&folder.term_id, &folder.department_id).await?;
        let env = self.transition_env(now, gate);
        let actor = Actor::new(user.id.as_str(), role);
        let outcome = match transition(&folder, command, &actor, &env) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    folder = %folder.id,
                    actor = %user.id,
                    action = %command.action(),
                    %err,
                    "transition refused"
                );
                return Err(err.into());
            }
        };

        if outcome.is_noop() {
            tracing::debug!(folder = %folder.id, "assignment unchanged; nothing to commit");
            return Ok(TransitionResponse {
                folder: outcome.folder,
                transition: outcome.record,
                unchanged: true,
            });
        }

        self.commit_transition(&folder, &outcome).await?;
        let notifications = self.transition_notifications(&outcome, command).await?;
        self.notify_all(&notifications);

        Ok(TransitionResponse {
            folder: outcome.folder,
            transition: outcome.record,
            unchanged: false,
        })
    }

    /// Persist an accepted transition: folder row, audit team changes and
    /// history in one transaction, then the trail.
    pub(crate) async fn commit_transition(
        &self,
        before: &CourseFolder,
        outcome: &TransitionOutcome,
    ) -> Result<(), DatabaseError> {
        let record = &outcome.record;
        let history_id = self.next_history_id().await?;

        let tx = self.db().conn().transaction().await?;
        write_folder(&tx, &outcome.folder, before.version).await?;
        match record.action {
            FolderAction::AssignAudit => {
                tx.execute(
                    "DELETE FROM audit_assignments WHERE folder_id = ?1",
                    [record.folder_id.as_str()],
                )
                .await?;
                for auditor in &outcome.folder.assigned_auditors {
                    tx.execute(
                        "INSERT INTO audit_assignments (folder_id, auditor_id, assigned_by, assigned_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        libsql::params![
                            record.folder_id.as_str(),
                            auditor.as_str(),
                            record.actor.as_str(),
                            record.at.to_rfc3339()
                        ],
                    )
                    .await?;
                }
            }
            FolderAction::UnassignAudit => {
                tx.execute(
                    "DELETE FROM audit_assignments WHERE folder_id = ?1",
                    [record.folder_id.as_str()],
                )
                .await?;
            }
            _ => {}
        }
        append_history(&tx, &history_id, record).await?;
        tx.commit().await?;

        tracing::info!(
            folder = %record.folder_id,
            from = %record.from,
            to = %record.to,
            actor = %record.actor,
            role = %record.role,
            version = outcome.folder.version,
            "transition committed"
        );

        self.trail().append(&TrailOperation {
            v: 1,
            ts: record.at.to_rfc3339(),
            folder: record.folder_id.clone(),
            op: TrailOp::Transition,
            entity: EntityType::Folder,
            id: record.folder_id.clone(),
            actor: record.actor.clone(),
            data: serde_json::to_value(record)?,
        })?;
        Ok(())
    }

    /// Auditors must be active, hold audit access, and not be a HOD.
    async fn validate_auditors(&self, auditor_ids: &[String]) -> Result<(), DatabaseError> {
        for id in auditor_ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let user = match self.get_user(id).await {
                Ok(user) => user,
                Err(DatabaseError::Core(CoreError::NotFound { .. })) => {
                    return Err(CoreError::Validation(format!("auditor {id} does not exist")).into());
                }
                Err(e) => return Err(e),
            };
            let roles = EffectiveRoleSet::resolve(user.role, user.capabilities());
            if !user.is_active || user.role == Role::Hod || !roles.contains(Role::AuditMember) {
                return Err(CoreError::Validation(format!(
                    "{id} cannot be assigned as an auditor"
                ))
                .into());
            }
        }
        Ok(())
    }

    async fn role_recipients(
        &self,
        role: Role,
        folder: &CourseFolder,
    ) -> Result<Vec<String>, DatabaseError> {
        Ok(self
            .users_with_role(role, &folder.department_id)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect())
    }

    /// Who hears about a committed transition, and what they are told.
    pub(crate) async fn transition_notifications(
        &self,
        outcome: &TransitionOutcome,
        command: &FolderCommand,
    ) -> Result<Vec<Notification>, DatabaseError> {
        let folder = &outcome.folder;
        let label = format!("{} - {}", folder.course_id, folder.section);
        let owner = vec![folder.faculty_id.clone()];

        let (kind, title, message, recipients) = match command {
            FolderCommand::Submit => (
                NotificationKind::FolderSubmitted,
                "Folder submitted",
                format!("{label} was submitted for coordinator review"),
                self.role_recipients(Role::Coordinator, folder).await?,
            ),
            FolderCommand::CoordinatorReview {
                verdict: Verdict::Approve,
                ..
            } => {
                let mut to = owner;
                to.extend(self.role_recipients(Role::Convener, folder).await?);
                (
                    NotificationKind::FolderApproved,
                    "Coordinator approved folder",
                    format!("{label} was approved by the coordinator and awaits audit assignment"),
                    to,
                )
            }
            FolderCommand::CoordinatorReview {
                verdict: Verdict::Reject,
                ..
            } => (
                NotificationKind::FolderReturned,
                "Folder returned by coordinator",
                format!("{label} was returned by the coordinator; see remarks"),
                owner,
            ),
            FolderCommand::AssignAudit { .. } => (
                NotificationKind::AuditAssigned,
                "Audit assignment",
                format!("You have been assigned to audit {label}"),
                folder.assigned_auditors.clone(),
            ),
            FolderCommand::UnassignAudit => return Ok(Vec::new()),
            FolderCommand::CompleteAudit => (
                NotificationKind::FolderSubmitted,
                "Audit completed",
                format!("The audit of {label} is complete and awaits your decision"),
                self.role_recipients(Role::Convener, folder).await?,
            ),
            FolderCommand::ConvenerReview {
                decision: ConvenerDecision::ForwardToHod,
                ..
            } => (
                NotificationKind::FolderSubmitted,
                "Folder forwarded to HOD",
                format!("{label} was forwarded for final approval"),
                self.role_recipients(Role::Hod, folder).await?,
            ),
            FolderCommand::ConvenerReview {
                decision: ConvenerDecision::Reject,
                ..
            } => (
                NotificationKind::FolderReturned,
                "Folder returned by convener",
                format!("{label} was returned by the convener; see notes"),
                owner,
            ),
            FolderCommand::HodDecision { verdict, .. } => {
                let (kind, title) = match verdict {
                    Verdict::Approve => (NotificationKind::FolderApproved, "Folder approved by HOD"),
                    Verdict::Reject => (NotificationKind::FolderReturned, "Folder returned by HOD"),
                };
                (
                    kind,
                    title,
                    format!("{label} is now {}", folder.status),
                    owner,
                )
            }
        };

        let mut seen = Vec::new();
        Ok(recipients
            .into_iter()
            .filter(|r| *r != outcome.record.actor)
            .filter(|r| {
                let fresh = !seen.contains(r);
                if fresh {
                    seen.push(r.clone());
                }
                fresh
            })
            .map(|recipient| Notification {
                recipient,
                kind,
                folder_id: folder.id.clone(),
                title: title.to_string(),
                message: message.clone(),
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Named entry points
    // -----------------------------------------------------------------------

    /// Owner faculty submits (or resubmits) a folder.
    pub async fn submit_folder(
        &self,
        folder_id: &str,
        actor_id: &str,
        expected_version: Option<i64>,
    ) -> Result<TransitionResponse, DatabaseError> {
        self.apply_command(folder_id, actor_id, &FolderCommand::Submit, expected_version)
            .await
    }

    /// Coordinator approves or rejects. A rejection needs notes or remarks.
    pub async fn coordinator_review(
        &self,
        folder_id: &str,
        actor_id: &str,
        verdict: Verdict,
        notes: &str,
        remarks: Option<&str>,
        expected_version: Option<i64>,
    ) -> Result<TransitionResponse, DatabaseError> {
        let command = FolderCommand::CoordinatorReview {
            verdict,
            notes: notes.to_string(),
            remarks: remarks.map(String::from),
        };
        self.apply_command(folder_id, actor_id, &command, expected_version).await
    }

    /// Convener assigns the audit team; the folder moves to `UNDER_AUDIT`.
    pub async fn assign_audit(
        &self,
        folder_id: &str,
        actor_id: &str,
        auditor_ids: &[String],
        expected_version: Option<i64>,
    ) -> Result<TransitionResponse, DatabaseError> {
        let command = FolderCommand::AssignAudit {
            auditor_ids: auditor_ids.to_vec(),
        };
        self.apply_command(folder_id, actor_id, &command, expected_version).await
    }

    /// Convener withdraws the audit team; the folder returns to
    /// `APPROVED_COORDINATOR`.
    pub async fn unassign_audit(
        &self,
        folder_id: &str,
        actor_id: &str,
        expected_version: Option<i64>,
    ) -> Result<TransitionResponse, DatabaseError> {
        self.apply_command(folder_id, actor_id, &FolderCommand::UnassignAudit, expected_version)
            .await
    }

    /// Convener forwards to the HOD or rejects after the audit.
    pub async fn convener_review(
        &self,
        folder_id: &str,
        actor_id: &str,
        decision: ConvenerDecision,
        notes: &str,
        expected_version: Option<i64>,
    ) -> Result<TransitionResponse, DatabaseError> {
        let command = FolderCommand::ConvenerReview {
            decision,
            notes: notes.to_string(),
        };
        self.apply_command(folder_id, actor_id, &command, expected_version).await
    }

    /// HOD final decision, re-decidable after the fact.
    pub async fn hod_decide(
        &self,
        folder_id: &str,
        actor_id: &str,
        verdict: Verdict,
        notes: &str,
        final_feedback: Option<&str>,
        expected_version: Option<i64>,
    ) -> Result<TransitionResponse, DatabaseError> {
        let command = FolderCommand::HodDecision {
            verdict,
            notes: notes.to_string(),
            final_feedback: final_feedback.map(String::from),
        };
        self.apply_command(folder_id, actor_id, &command, expected_version).await
    }

    /// Whether a folder currently sits in a status the given stage decides.
    #[must_use]
    pub fn awaiting(folder: &CourseFolder, role: Role) -> bool {
        match role {
            Role::Coordinator => folder.status == FolderStatus::Submitted,
            Role::Convener => matches!(
                folder.status,
                FolderStatus::ApprovedCoordinator | FolderStatus::AuditCompleted
            ),
            Role::AuditMember => folder.status == FolderStatus::UnderAudit,
            Role::Hod => folder.status == FolderStatus::SubmittedToHod,
            Role::Faculty => folder.status == FolderStatus::Draft || folder.status.is_rejected(),
            Role::Admin => false,
        }
    }
}
