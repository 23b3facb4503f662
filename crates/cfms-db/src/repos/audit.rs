//! Audit assignments and reports.

use std::collections::BTreeMap;

use chrono::Utc;

use cfms_core::audit::{AuditReport, AuditSummary, record_report, summarize};
use cfms_core::entities::{AuditAssignment, CourseFolder};
use cfms_core::enums::{EntityType, Role, TrailOp};
use cfms_core::errors::CoreError;
use cfms_core::lifecycle::{Actor, FolderCommand};
use cfms_core::responses::AuditReportResponse;
use cfms_core::trail::TrailOperation;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_datetime, get_opt_string, parse_datetime, parse_enum, parse_json_column, to_json_text};
use crate::repos::folder::{check_expected_version, write_folder};
use crate::repos::history::append_history;
use crate::service::FolderService;

const SELECT_COLS: &str =
    "folder_id, auditor_id, decision, overall_feedback, ratings, assigned_at, submitted_at";

fn row_to_assignment(row: &libsql::Row) -> Result<AuditAssignment, DatabaseError> {
    let ratings: BTreeMap<String, f64> = parse_json_column(&row.get::<String>(4)?)?;
    Ok(AuditAssignment {
        folder_id: row.get(0)?,
        auditor_id: row.get(1)?,
        decision: parse_enum(&row.get::<String>(2)?)?,
        overall_feedback: get_opt_string(row, 3)?,
        ratings,
        assigned_at: parse_datetime(&row.get::<String>(5)?)?,
        submitted_at: get_opt_datetime(row, 6)?,
    })
}

/// Assignments on a folder in assignment order, read on `conn`.
async fn assignments_on(conn: &libsql::Connection, folder_id: &str) -> Result<Vec<AuditAssignment>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {SELECT_COLS} FROM audit_assignments WHERE folder_id = ?1
                 ORDER BY assigned_at, rowid"
            ),
            [folder_id],
        )
        .await?;
    let mut assignments = Vec::new();
    while let Some(row) = rows.next().await? {
        assignments.push(row_to_assignment(&row)?);
    }
    Ok(assignments)
}

impl FolderService {
    /// Assignments on a folder in assignment order.
    pub async fn list_assignments(&self, folder_id: &str) -> Result<Vec<AuditAssignment>, DatabaseError> {
        assignments_on(self.db().conn(), folder_id).await
    }

    /// Folders an auditor is assigned to, with their own assignment.
    pub async fn audit_queue(
        &self,
        auditor_id: &str,
    ) -> Result<Vec<(CourseFolder, AuditAssignment)>, DatabaseError> {
        self.require_role(auditor_id, Role::AuditMember).await?;
        let mut rows = self.db().conn().query(
            &format!(
                "SELECT {SELECT_COLS} FROM audit_assignments WHERE auditor_id = ?1
                 ORDER BY assigned_at DESC"
            ),
            [auditor_id],
        ).await?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next().await? {
            assignments.push(row_to_assignment(&row)?);
        }
        let mut queue = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let folder = self.get_folder(&assignment.folder_id).await?;
            queue.push((folder, assignment));
        }
        Ok(queue)
    }

    /// Record (or revise) the acting auditor's report.
    ///
    /// The folder moves to `AUDIT_COMPLETED` on the first rejecting report or
    /// once every assigned auditor has reported.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the actor holds audit access and is assigned.
    /// - `IllegalTransition` once the folder has left the audit stage.
    /// - `Validation` for blank overall feedback.
    pub async fn submit_audit_report(
        &self,
        folder_id: &str,
        actor_id: &str,
        report: &AuditReport,
        expected_version: Option<i64>,
    ) -> Result<AuditReportResponse, DatabaseError> {
        let user = self.require_role(actor_id, Role::AuditMember).await?;
        let now = Utc::now();
        let folder = self.refresh_derived(self.load_folder(folder_id).await?, now).await?;
        check_expected_version(&folder, expected_version)?;

        let gate = self.deadline_gate(&folder.term_id, &folder.department_id).await?;
        let env = self.transition_env(now, gate);
        let actor = Actor::new(user.id.as_str(), Role::AuditMember);
        let history_id = self.next_history_id().await?;

        // Completion is judged on assignments read inside the write. Every
        // report moves the folder version, so concurrent reports serialize.
        let tx = self.db().conn().transaction().await?;
        let assignments = assignments_on(&tx, folder_id).await?;
        let outcome = record_report(&folder, &assignments, report, &actor, &env).map_err(|err| {
            tracing::warn!(folder = %folder.id, auditor = %user.id, %err, "audit report refused");
            err
        })?;
        let updated = &outcome.assignment;
        tx.execute(
            "UPDATE audit_assignments
             SET decision = ?1, overall_feedback = ?2, ratings = ?3, submitted_at = ?4
             WHERE folder_id = ?5 AND auditor_id = ?6",
            libsql::params![
                updated.decision.as_str(),
                updated.overall_feedback.as_deref(),
                to_json_text(&updated.ratings)?,
                updated.submitted_at.map(|t| t.to_rfc3339()),
                folder_id,
                user.id.as_str()
            ],
        )
        .await?;
        let next = match &outcome.completion {
            Some(done) => {
                append_history(&tx, &history_id, &done.record).await?;
                done.folder.clone()
            }
            None => {
                let mut touched = folder.clone();
                touched.version = folder.version + 1;
                touched.updated_at = now;
                touched
            }
        };
        write_folder(&tx, &next, folder.version).await?;
        tx.commit().await?;

        tracing::info!(
            folder = %folder_id,
            auditor = %user.id,
            decision = updated.decision.as_str(),
            "audit report recorded"
        );

        self.trail().append(&TrailOperation {
            v: 1,
            ts: now.to_rfc3339(),
            folder: folder_id.to_string(),
            op: TrailOp::Update,
            entity: EntityType::AuditAssignment,
            id: format!("{folder_id}:{}", user.id),
            actor: user.id.clone(),
            data: serde_json::to_value(updated)?,
        })?;

        let folder_status = if let Some(done) = &outcome.completion {
            tracing::info!(
                folder = %folder_id,
                from = %done.record.from,
                to = %done.record.to,
                actor = %done.record.actor,
                "transition committed"
            );
            self.trail().append(&TrailOperation {
                v: 1,
                ts: done.record.at.to_rfc3339(),
                folder: folder_id.to_string(),
                op: TrailOp::Transition,
                entity: EntityType::Folder,
                id: folder_id.to_string(),
                actor: done.record.actor.clone(),
                data: serde_json::to_value(&done.record)?,
            })?;
            let notifications = self
                .transition_notifications(done, &FolderCommand::CompleteAudit)
                .await?;
            self.notify_all(&notifications);
            done.folder.status
        } else {
            folder.status
        };

        let submitted = assignments
            .iter()
            .filter(|a| a.auditor_id == user.id || a.has_reported())
            .count();
        Ok(AuditReportResponse {
            assignment: outcome.assignment,
            folder_status,
            folder_version: next.version,
            submitted,
            total: assignments.len(),
        })
    }

    /// Aggregate of every report on a folder.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless the viewer is a convener, HOD, admin, or one
    /// of the folder's auditors.
    pub async fn audit_summary(&self, folder_id: &str, viewer_id: &str) -> Result<AuditSummary, DatabaseError> {
        let (user, roles) = self.resolve_user(viewer_id).await?;
        let folder = self.load_folder(folder_id).await?;
        if !roles.is_allowed(&[Role::Convener, Role::Hod, Role::Admin])
            && !folder.is_assigned_auditor(&user.id)
        {
            return Err(CoreError::denied("audit summaries are limited to conveners, HODs and the audit team").into());
        }
        Ok(summarize(&self.list_assignments(folder_id).await?))
    }
}
