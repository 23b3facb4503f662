//! Deadline repository: term-scoped submission deadlines and the gate
//! derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cfms_core::deadline::DeadlineGate;
use cfms_core::entities::FolderDeadline;
use cfms_core::enums::{DeadlineKind, Role};
use cfms_core::errors::CoreError;
use cfms_core::ids::PREFIX_DEADLINE;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::FolderService;

const SELECT_COLS: &str = "id, type, term_id, department_id, deadline, created_at, updated_at";

/// Roles allowed to set or remove deadlines.
const DEADLINE_ROLES: [Role; 3] = [Role::Admin, Role::Convener, Role::Hod];

fn row_to_deadline(row: &libsql::Row) -> Result<FolderDeadline, DatabaseError> {
    Ok(FolderDeadline {
        id: row.get(0)?,
        kind: parse_enum(&row.get::<String>(1)?)?,
        term_id: row.get(2)?,
        department_id: get_opt_string(row, 3)?,
        deadline: parse_datetime(&row.get::<String>(4)?)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// The gate as it applies to one folder right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineStatus {
    pub term_id: String,
    pub department_id: String,
    pub gate: DeadlineGate,
    pub first_window_open: bool,
    pub final_window_open: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl FolderService {
    /// Create or move the deadline for (kind, term, department).
    ///
    /// `department_id == None` sets the term-wide deadline.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless the actor is an admin, convener or HOD.
    pub async fn set_deadline(
        &self,
        actor_id: &str,
        kind: DeadlineKind,
        term_id: &str,
        department_id: Option<&str>,
        deadline: DateTime<Utc>,
    ) -> Result<FolderDeadline, DatabaseError> {
        let (_, roles) = self.resolve_user(actor_id).await?;
        if !roles.is_allowed(&DEADLINE_ROLES) {
            return Err(CoreError::denied("only admins, conveners and HODs may set deadlines").into());
        }
        if term_id.trim().is_empty() {
            return Err(CoreError::Validation("term_id is required".into()).into());
        }
        let now = Utc::now();

        let mut rows = self.db().conn().query(
            "SELECT id FROM folder_deadlines
             WHERE type = ?1 AND term_id = ?2 AND COALESCE(department_id, '') = COALESCE(?3, '')",
            libsql::params![kind.as_str(), term_id, department_id],
        ).await?;
        let existing: Option<String> = match rows.next().await? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };

        let id = if let Some(id) = existing {
            self.db().conn().execute(
                "UPDATE folder_deadlines SET deadline = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![deadline.to_rfc3339(), now.to_rfc3339(), id.as_str()],
            ).await?;
            id
        } else {
            let id = self.db().generate_id(PREFIX_DEADLINE).await?;
            self.db().conn().execute(
                &format!(
                    "INSERT INTO folder_deadlines ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                libsql::params![
                    id.as_str(),
                    kind.as_str(),
                    term_id,
                    department_id,
                    deadline.to_rfc3339(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            ).await?;
            id
        };

        tracing::info!(
            deadline = %id,
            kind = kind.as_str(),
            term = term_id,
            department = department_id.unwrap_or("*"),
            at = %deadline,
            "deadline set"
        );
        self.get_deadline(&id).await
    }

    pub async fn get_deadline(&self, id: &str) -> Result<FolderDeadline, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!("SELECT {SELECT_COLS} FROM folder_deadlines WHERE id = ?1"),
            [id],
        ).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("deadline", id))?;
        row_to_deadline(&row)
    }

    /// Deadlines, optionally narrowed to one term, latest first.
    pub async fn list_deadlines(&self, term_id: Option<&str>) -> Result<Vec<FolderDeadline>, DatabaseError> {
        let mut rows = match term_id {
            Some(term) => {
                self.db().conn().query(
                    &format!(
                        "SELECT {SELECT_COLS} FROM folder_deadlines WHERE term_id = ?1
                         ORDER BY deadline DESC"
                    ),
                    [term],
                ).await?
            }
            None => {
                self.db().conn().query(
                    &format!("SELECT {SELECT_COLS} FROM folder_deadlines ORDER BY deadline DESC"),
                    (),
                ).await?
            }
        };
        let mut deadlines = Vec::new();
        while let Some(row) = rows.next().await? {
            deadlines.push(row_to_deadline(&row)?);
        }
        Ok(deadlines)
    }

    pub async fn delete_deadline(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let (_, roles) = self.resolve_user(actor_id).await?;
        if !roles.is_allowed(&DEADLINE_ROLES) {
            return Err(CoreError::denied("only admins, conveners and HODs may remove deadlines").into());
        }
        let changed = self
            .db()
            .conn()
            .execute("DELETE FROM folder_deadlines WHERE id = ?1", [id])
            .await?;
        if changed == 0 {
            return Err(CoreError::not_found("deadline", id).into());
        }
        tracing::info!(deadline = %id, "deadline removed");
        Ok(())
    }

    /// Effective deadlines for a (term, department): the department's own
    /// row wins over the term-wide one.
    pub async fn deadline_gate(&self, term_id: &str, department_id: &str) -> Result<DeadlineGate, DatabaseError> {
        let deadlines = self.list_deadlines(Some(term_id)).await?;
        Ok(DeadlineGate::resolve(&deadlines, term_id, department_id))
    }

    /// Evaluate both windows for a folder at the current time.
    pub async fn folder_deadline_status(&self, folder_id: &str) -> Result<DeadlineStatus, DatabaseError> {
        let folder = self.load_folder(folder_id).await?;
        let gate = self.deadline_gate(&folder.term_id, &folder.department_id).await?;
        let now = Utc::now();
        Ok(DeadlineStatus {
            first_window_open: gate.first_window_open(now),
            final_window_open: gate.final_window_open(folder.first_activity_completed, now),
            term_id: folder.term_id,
            department_id: folder.department_id,
            gate,
            evaluated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{Cast, test_service};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn set_is_an_upsert_per_scope() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let t1 = Utc::now() + Duration::days(10);
        let t2 = Utc::now() + Duration::days(20);

        let a = svc
            .set_deadline(&cast.admin, DeadlineKind::FinalSubmission, "fall-2026", Some("se"), t1)
            .await
            .unwrap();
        let b = svc
            .set_deadline(&cast.admin, DeadlineKind::FinalSubmission, "fall-2026", Some("se"), t2)
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.deadline, t2);

        let wide = svc
            .set_deadline(&cast.admin, DeadlineKind::FinalSubmission, "fall-2026", None, t1)
            .await
            .unwrap();
        assert_ne!(wide.id, a.id);
        assert_eq!(svc.list_deadlines(Some("fall-2026")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn department_row_wins_in_gate() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let dept = Utc::now() + Duration::days(3);
        let wide = Utc::now() + Duration::days(30);
        svc.set_deadline(&cast.hod, DeadlineKind::FinalSubmission, "fall-2026", None, wide)
            .await
            .unwrap();
        svc.set_deadline(&cast.hod, DeadlineKind::FinalSubmission, "fall-2026", Some("se"), dept)
            .await
            .unwrap();

        let gate = svc.deadline_gate("fall-2026", "se").await.unwrap();
        assert_eq!(gate.final_submission, Some(dept));
        let gate = svc.deadline_gate("fall-2026", "cs").await.unwrap();
        assert_eq!(gate.final_submission, Some(wide));
    }

    #[tokio::test]
    async fn faculty_cannot_set_deadlines() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let err = svc
            .set_deadline(&cast.faculty, DeadlineKind::FirstSubmission, "fall-2026", None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn delete_missing_deadline_is_not_found() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        assert!(matches!(
            svc.delete_deadline(&cast.admin, "ddl-nope").await.unwrap_err(),
            DatabaseError::Core(CoreError::NotFound { .. })
        ));
    }
}
