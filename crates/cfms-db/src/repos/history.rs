//! Status history: one append-only row per committed transition.

use cfms_core::entities::StatusHistoryEntry;
use cfms_core::errors::CoreError;
use cfms_core::feedback::visible_feedback;
use cfms_core::ids::PREFIX_HISTORY;
use cfms_core::lifecycle::TransitionRecord;
use cfms_core::trail::TrailOperation;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::FolderService;

const SELECT_COLS: &str = "id, folder_id, status, changed_by, notes, created_at";

fn row_to_entry(row: &libsql::Row) -> Result<StatusHistoryEntry, DatabaseError> {
    Ok(StatusHistoryEntry {
        id: row.get(0)?,
        folder_id: row.get(1)?,
        status: parse_enum(&row.get::<String>(2)?)?,
        changed_by: row.get(3)?,
        notes: get_opt_string(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

/// Insert the history row for `record` on the caller's transaction.
pub(crate) async fn append_history(
    conn: &libsql::Connection,
    id: &str,
    record: &TransitionRecord,
) -> Result<StatusHistoryEntry, DatabaseError> {
    let entry = StatusHistoryEntry {
        id: id.to_string(),
        folder_id: record.folder_id.clone(),
        status: record.to,
        changed_by: record.actor.clone(),
        notes: record.notes.clone(),
        created_at: record.at,
    };
    conn.execute(
        &format!("INSERT INTO folder_status_history ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        libsql::params![
            entry.id.as_str(),
            entry.folder_id.as_str(),
            entry.status.as_str(),
            entry.changed_by.as_str(),
            entry.notes.as_deref(),
            entry.created_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(entry)
}

impl FolderService {
    pub(crate) async fn next_history_id(&self) -> Result<String, DatabaseError> {
        self.db().generate_id(PREFIX_HISTORY).await
    }

    /// Every recorded status change for a folder, oldest first.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown folder, `PermissionDenied` when `viewer_id`
    /// cannot read it.
    pub async fn folder_history(
        &self,
        folder_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<StatusHistoryEntry>, DatabaseError> {
        let folder = self.load_folder(folder_id).await?;
        self.authorize_read(&folder, viewer_id).await?;
        let mut rows = self.db().conn().query(
            &format!(
                "SELECT {SELECT_COLS} FROM folder_status_history
                 WHERE folder_id = ?1 ORDER BY created_at, rowid"
            ),
            [folder_id],
        ).await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }

    /// The folder's trail for `viewer_id`.
    ///
    /// Trail entries carry every stage's remarks, so the reader must be able
    /// to see all feedback on the folder.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown folder, `PermissionDenied` otherwise.
    pub async fn folder_trail(
        &self,
        folder_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<TrailOperation>, DatabaseError> {
        let folder = self.load_folder(folder_id).await?;
        let role = self.authorize_read(&folder, viewer_id).await?;
        let visible = visible_feedback(&folder, role);
        if visible.coordinator.is_none() || visible.audit_member.is_none() {
            return Err(CoreError::denied(format!("{role} cannot read the trail of this folder")).into());
        }
        self.trail().read_folder(&folder.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{Cast, add_user, seed_folder, test_service_with_trail};
    use cfms_core::enums::{Role, TrailOp};
    use tempfile::TempDir;

    #[tokio::test]
    async fn history_and_trail_follow_read_access() {
        let dir = TempDir::new().unwrap();
        let svc = test_service_with_trail(dir.path().join("trail")).await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;
        svc.submit_folder(&folder.id, &cast.faculty, None).await.unwrap();
        let outsider = add_user(&svc, "ee-hod", Role::Hod, "ee").await.id;

        assert_eq!(svc.folder_history(&folder.id, &cast.faculty).await.unwrap().len(), 1);
        assert!(svc.folder_history(&folder.id, &outsider).await.is_err());

        let trail = svc.folder_trail(&folder.id, &cast.hod).await.unwrap();
        assert_eq!(trail.first().map(|op| op.op), Some(TrailOp::Create));
        // Coordinators never see audit remarks, so the trail stays closed.
        assert!(svc.folder_trail(&folder.id, &cast.coordinator).await.is_err());
        assert!(svc.folder_trail(&folder.id, &outsider).await.is_err());
    }
}
