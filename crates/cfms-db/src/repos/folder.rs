//! Folder repository: creation, reads with the derived edit flag, listing,
//! content edits, and the version-checked write every mutation goes through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cfms_core::access::{FolderReader, folder_read_role};
use cfms_core::entities::{CourseFolder, NewFolder};
use cfms_core::enums::{EntityType, FolderStatus, Role, TrailOp};
use cfms_core::errors::CoreError;
use cfms_core::feedback::redact_feedback;
use cfms_core::ids::PREFIX_FOLDER;
use cfms_core::permissions::{ViewMode, ViewerContext};
use cfms_core::responses::{EditCheckResponse, StatusCount};
use cfms_core::trail::TrailOperation;

use crate::error::DatabaseError;
use crate::helpers::{
    get_bool, get_opt_datetime, get_opt_string, opt_datetime_value, opt_text_value,
    parse_datetime, parse_enum, parse_json_column, to_json_text,
};
use crate::service::FolderService;

pub(crate) const SELECT_COLS: &str = "id, faculty_id, course_allocation_id, course_id, section, \
     term_id, department_id, program_id, status, version, first_activity_completed, submitted_at, \
     coordinator_decision, coordinator_notes, coordinator_remarks, coordinator_reviewed_by, \
     coordinator_reviewed_at, convener_assigned_by, convener_assigned_at, convener_notes, \
     convener_reviewed_by, convener_reviewed_at, assigned_auditors, hod_notes, hod_final_feedback, \
     hod_reviewed_by, hod_reviewed_at, coordinator_feedback, audit_member_feedback, outline_content, \
     created_at, updated_at";

/// Stored row to entity. `can_edit_for_final_submission` is left `false`;
/// callers recompute it against the deadline gate.
fn row_to_folder(row: &libsql::Row) -> Result<CourseFolder, DatabaseError> {
    let coordinator_decision = get_opt_string(row, 12)?
        .map(|s| parse_enum(&s))
        .transpose()?;
    Ok(CourseFolder {
        id: row.get(0)?,
        faculty_id: row.get(1)?,
        course_allocation_id: row.get(2)?,
        course_id: row.get(3)?,
        section: row.get(4)?,
        term_id: row.get(5)?,
        department_id: row.get(6)?,
        program_id: get_opt_string(row, 7)?,
        status: parse_enum(&row.get::<String>(8)?)?,
        version: row.get(9)?,
        first_activity_completed: get_bool(row, 10)?,
        can_edit_for_final_submission: false,
        submitted_at: get_opt_datetime(row, 11)?,
        coordinator_decision,
        coordinator_notes: get_opt_string(row, 13)?,
        coordinator_remarks: get_opt_string(row, 14)?,
        coordinator_reviewed_by: get_opt_string(row, 15)?,
        coordinator_reviewed_at: get_opt_datetime(row, 16)?,
        convener_assigned_by: get_opt_string(row, 17)?,
        convener_assigned_at: get_opt_datetime(row, 18)?,
        convener_notes: get_opt_string(row, 19)?,
        convener_reviewed_by: get_opt_string(row, 20)?,
        convener_reviewed_at: get_opt_datetime(row, 21)?,
        assigned_auditors: parse_json_column(&row.get::<String>(22)?)?,
        hod_notes: get_opt_string(row, 23)?,
        hod_final_feedback: get_opt_string(row, 24)?,
        hod_reviewed_by: get_opt_string(row, 25)?,
        hod_reviewed_at: get_opt_datetime(row, 26)?,
        coordinator_feedback: parse_json_column(&row.get::<String>(27)?)?,
        audit_member_feedback: parse_json_column(&row.get::<String>(28)?)?,
        outline_content: parse_json_column(&row.get::<String>(29)?)?,
        created_at: parse_datetime(&row.get::<String>(30)?)?,
        updated_at: parse_datetime(&row.get::<String>(31)?)?,
    })
}

/// Write every mutable column of `folder`, but only if the stored row is
/// still at `expected_version`.
///
/// Runs on whatever connection or transaction the caller passes.
///
/// # Errors
///
/// `ConcurrencyConflict` when the row moved on since it was read.
pub(crate) async fn write_folder(
    conn: &libsql::Connection,
    folder: &CourseFolder,
    expected_version: i64,
) -> Result<(), DatabaseError> {
    let params: Vec<libsql::Value> = vec![
        folder.status.as_str().into(),
        folder.version.into(),
        i64::from(folder.first_activity_completed).into(),
        opt_datetime_value(folder.submitted_at),
        opt_text_value(folder.coordinator_decision.map(|d| d.as_str())),
        opt_text_value(folder.coordinator_notes.as_deref()),
        opt_text_value(folder.coordinator_remarks.as_deref()),
        opt_text_value(folder.coordinator_reviewed_by.as_deref()),
        opt_datetime_value(folder.coordinator_reviewed_at),
        opt_text_value(folder.convener_assigned_by.as_deref()),
        opt_datetime_value(folder.convener_assigned_at),
        opt_text_value(folder.convener_notes.as_deref()),
        opt_text_value(folder.convener_reviewed_by.as_deref()),
        opt_datetime_value(folder.convener_reviewed_at),
        to_json_text(&folder.assigned_auditors)?.into(),
        opt_text_value(folder.hod_notes.as_deref()),
        opt_text_value(folder.hod_final_feedback.as_deref()),
        opt_text_value(folder.hod_reviewed_by.as_deref()),
        opt_datetime_value(folder.hod_reviewed_at),
        to_json_text(&folder.coordinator_feedback)?.into(),
        to_json_text(&folder.audit_member_feedback)?.into(),
        to_json_text(&folder.outline_content)?.into(),
        folder.updated_at.to_rfc3339().into(),
        folder.id.clone().into(),
        expected_version.into(),
    ];
    let changed = conn.execute(
        "UPDATE course_folders SET
            status = ?1, version = ?2, first_activity_completed = ?3, submitted_at = ?4,
            coordinator_decision = ?5, coordinator_notes = ?6, coordinator_remarks = ?7,
            coordinator_reviewed_by = ?8, coordinator_reviewed_at = ?9,
            convener_assigned_by = ?10, convener_assigned_at = ?11, convener_notes = ?12,
            convener_reviewed_by = ?13, convener_reviewed_at = ?14, assigned_auditors = ?15,
            hod_notes = ?16, hod_final_feedback = ?17, hod_reviewed_by = ?18, hod_reviewed_at = ?19,
            coordinator_feedback = ?20, audit_member_feedback = ?21, outline_content = ?22,
            updated_at = ?23
         WHERE id = ?24 AND version = ?25",
        libsql::params_from_iter(params),
    ).await?;

    if changed == 0 {
        let mut rows = conn
            .query("SELECT version FROM course_folders WHERE id = ?1", [folder.id.as_str()])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("folder", folder.id.as_str()))?;
        let actual_version: i64 = row.get(0)?;
        tracing::warn!(
            folder = %folder.id,
            expected = expected_version,
            actual = actual_version,
            "stale folder write refused"
        );
        return Err(CoreError::ConcurrencyConflict {
            folder_id: folder.id.clone(),
            expected_version,
            actual_version,
        }
        .into());
    }
    Ok(())
}

/// Refuse to act on a folder the caller saw at a different version.
pub(crate) fn check_expected_version(
    folder: &CourseFolder,
    expected: Option<i64>,
) -> Result<(), DatabaseError> {
    match expected {
        Some(v) if v != folder.version => {
            tracing::warn!(folder = %folder.id, expected = v, actual = folder.version, "stale request");
            Err(CoreError::ConcurrencyConflict {
                folder_id: folder.id.clone(),
                expected_version: v,
                actual_version: folder.version,
            }
            .into())
        }
        _ => Ok(()),
    }
}

/// Recursively merge `patch` into `target`. Objects merge; everything else replaces.
pub(crate) fn deep_merge(target: &mut serde_json::Value, patch: serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(existing), serde_json::Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) if slot.is_object() && value.is_object() => deep_merge(slot, value),
                    _ => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Filters for `list_folders`.
#[derive(Debug, Clone, Default)]
pub struct FolderFilter {
    pub status: Option<FolderStatus>,
    pub faculty_id: Option<String>,
    pub term_id: Option<String>,
    pub department_id: Option<String>,
    pub limit: Option<u32>,
}

/// A content edit. With `section`, only that top-level key is replaced;
/// otherwise `content` is deep-merged into the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlinePatch {
    pub section: Option<String>,
    pub content: serde_json::Value,
}

impl FolderService {
    /// Open a `DRAFT` folder for one (faculty, course allocation) pair.
    ///
    /// The actor must be the owning faculty, or an admin creating on their
    /// behalf.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` for anyone else.
    /// - `Validation` when the pair already has a folder or a reference is blank.
    pub async fn create_folder(
        &self,
        actor_id: &str,
        new: &NewFolder,
    ) -> Result<CourseFolder, DatabaseError> {
        let (_, roles) = self.resolve_user(actor_id).await?;
        let acting_for_self = actor_id == new.faculty_id && roles.contains(Role::Faculty);
        if !acting_for_self && !roles.contains(Role::Admin) {
            return Err(CoreError::denied("only the owning faculty or an admin may create a folder").into());
        }
        let owner = self.get_user(&new.faculty_id).await?;
        if !cfms_core::access::EffectiveRoleSet::resolve(owner.role, owner.capabilities())
            .contains(Role::Faculty)
        {
            return Err(CoreError::Validation(format!("{} is not a faculty member", owner.id)).into());
        }
        for (field, value) in [
            ("course_allocation_id", &new.course_allocation_id),
            ("course_id", &new.course_id),
            ("section", &new.section),
            ("term_id", &new.term_id),
            ("department_id", &new.department_id),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{field} is required")).into());
            }
        }

        let mut existing = self.db().conn().query(
            "SELECT id FROM course_folders WHERE faculty_id = ?1 AND course_allocation_id = ?2",
            [new.faculty_id.as_str(), new.course_allocation_id.as_str()],
        ).await?;
        if let Some(row) = existing.next().await? {
            let id: String = row.get(0)?;
            return Err(CoreError::Validation(format!(
                "a folder already exists for this course allocation ({id})"
            ))
            .into());
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_FOLDER).await?;
        let folder = CourseFolder::new_draft(id.clone(), new.clone(), now);

        self.db().conn().execute(
            "INSERT INTO course_folders (id, faculty_id, course_allocation_id, course_id, section,
                 term_id, department_id, program_id, status, version, outline_content,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            libsql::params![
                id.as_str(),
                folder.faculty_id.as_str(),
                folder.course_allocation_id.as_str(),
                folder.course_id.as_str(),
                folder.section.as_str(),
                folder.term_id.as_str(),
                folder.department_id.as_str(),
                folder.program_id.as_deref(),
                folder.status.as_str(),
                folder.version,
                to_json_text(&folder.outline_content)?,
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        ).await?;

        tracing::info!(folder = %id, faculty = %folder.faculty_id, "folder created");

        self.trail().append(&TrailOperation {
            v: 1,
            ts: now.to_rfc3339(),
            folder: id.clone(),
            op: TrailOp::Create,
            entity: EntityType::Folder,
            id: id.clone(),
            actor: actor_id.to_string(),
            data: serde_json::to_value(&folder)?,
        })?;

        self.get_folder(&id).await
    }

    /// Stored row as-is, without recomputing derived flags.
    pub(crate) async fn load_folder(&self, id: &str) -> Result<CourseFolder, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!("SELECT {SELECT_COLS} FROM course_folders WHERE id = ?1"),
            [id],
        ).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("folder", id))?;
        row_to_folder(&row)
    }

    /// Recompute `can_edit_for_final_submission` for `now`.
    pub(crate) async fn refresh_derived(
        &self,
        mut folder: CourseFolder,
        now: DateTime<Utc>,
    ) -> Result<CourseFolder, DatabaseError> {
        let gate = self.deadline_gate(&folder.term_id, &folder.department_id).await?;
        folder.can_edit_for_final_submission =
            gate.final_window_open(folder.first_activity_completed, now);
        Ok(folder)
    }

    /// Load a folder with its derived edit flag evaluated against the
    /// current deadlines. No read check; callers authorize first.
    ///
    /// # Errors
    ///
    /// `NotFound` when no folder has this id.
    pub(crate) async fn get_folder(&self, id: &str) -> Result<CourseFolder, DatabaseError> {
        let folder = self.load_folder(id).await?;
        self.refresh_derived(folder, Utc::now()).await
    }

    /// The role `viewer_id` reads `folder` as.
    ///
    /// Viewer grants are only consulted when the viewer's own roles fall
    /// short on an approved folder.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when no role or grant reaches the folder.
    pub(crate) async fn authorize_read(
        &self,
        folder: &CourseFolder,
        viewer_id: &str,
    ) -> Result<Role, DatabaseError> {
        let (user, roles) = self.resolve_user(viewer_id).await?;
        let mut reader = FolderReader {
            user_id: &user.id,
            department_id: user.department_id.as_deref(),
            roles: &roles,
            has_viewer_grant: false,
        };
        let decided = match folder_read_role(folder, &reader) {
            Err(_) if folder.status == FolderStatus::ApprovedByHod => {
                reader.has_viewer_grant = self.has_viewer_grant(&folder.id, &user.id).await?;
                folder_read_role(folder, &reader)
            }
            other => other,
        };
        decided.map_err(|err| {
            tracing::warn!(folder = %folder.id, viewer = %user.id, roles = %roles, "folder read refused");
            err.into()
        })
    }

    /// Load a folder for `viewer_id`, with feedback the viewer may not read
    /// emptied.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no folder has this id.
    /// - `PermissionDenied` when the viewer cannot read it.
    pub async fn view_folder(&self, folder_id: &str, viewer_id: &str) -> Result<CourseFolder, DatabaseError> {
        let folder = self.get_folder(folder_id).await?;
        let role = self.authorize_read(&folder, viewer_id).await?;
        Ok(redact_feedback(&folder, role))
    }

    /// `list_folders` restricted to what `viewer_id` may read, redacted the
    /// same way as `view_folder`.
    pub async fn visible_folders(
        &self,
        viewer_id: &str,
        filter: &FolderFilter,
    ) -> Result<Vec<CourseFolder>, DatabaseError> {
        self.resolve_user(viewer_id).await?;
        let mut visible = Vec::new();
        for folder in self.list_folders(filter).await? {
            match self.authorize_read(&folder, viewer_id).await {
                Ok(role) => visible.push(redact_feedback(&folder, role)),
                Err(DatabaseError::Core(CoreError::PermissionDenied { .. })) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(visible)
    }

    pub async fn list_folders(&self, filter: &FolderFilter) -> Result<Vec<CourseFolder>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        for (column, value) in [
            ("faculty_id", &filter.faculty_id),
            ("term_id", &filter.term_id),
            ("department_id", &filter.department_id),
        ] {
            if let Some(v) = value {
                params.push(v.clone().into());
                conditions.push(format!("{column} = ?{}", params.len()));
            }
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(u32::MAX);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM course_folders {where_clause}
             ORDER BY updated_at DESC, id LIMIT {limit}"
        );
        let mut rows = self.db().conn().query(&sql, libsql::params_from_iter(params)).await?;
        let now = Utc::now();
        let mut stored = Vec::new();
        while let Some(row) = rows.next().await? {
            stored.push(row_to_folder(&row)?);
        }
        let mut folders = Vec::with_capacity(stored.len());
        for folder in stored {
            folders.push(self.refresh_derived(folder, now).await?);
        }
        Ok(folders)
    }

    /// Per-status folder counts. Conveners see their own department unless
    /// `all_departments` is set; admins always see everything.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for other roles.
    pub async fn status_counts(
        &self,
        actor_id: &str,
        all_departments: bool,
    ) -> Result<Vec<StatusCount>, DatabaseError> {
        let (user, roles) = self.resolve_user(actor_id).await?;
        let scope = if roles.contains(Role::Admin) {
            None
        } else if roles.contains(Role::Convener) {
            if all_departments { None } else { user.department_id }
        } else {
            return Err(CoreError::denied("status counts are limited to conveners and admins").into());
        };

        let mut rows = match scope {
            Some(dept) => {
                self.db().conn().query(
                    "SELECT status, COUNT(*) FROM course_folders WHERE department_id = ?1
                     GROUP BY status ORDER BY status",
                    [dept],
                ).await?
            }
            None => {
                self.db().conn().query(
                    "SELECT status, COUNT(*) FROM course_folders GROUP BY status ORDER BY status",
                    (),
                ).await?
            }
        };
        let mut counts = Vec::new();
        while let Some(row) = rows.next().await? {
            let count: i64 = row.get(1)?;
            counts.push(StatusCount {
                status: parse_enum(&row.get::<String>(0)?)?,
                count: u64::try_from(count).unwrap_or_default(),
            });
        }
        Ok(counts)
    }

    /// Evaluate the edit verdict for a viewer.
    ///
    /// Without an explicit `mode`, the owner views as editor and everyone
    /// else in their primary role's review mode.
    pub async fn can_edit_folder(
        &self,
        folder_id: &str,
        viewer_id: &str,
        mode: Option<ViewMode>,
    ) -> Result<EditCheckResponse, DatabaseError> {
        let (user, roles) = self.resolve_user(viewer_id).await?;
        let folder = self.get_folder(folder_id).await?;
        let mode = mode.unwrap_or_else(|| {
            if folder.is_owned_by(&user.id) {
                ViewMode::Editor
            } else {
                ViewMode::for_role(roles.primary())
            }
        });
        let ctx = ViewerContext::new(roles.primary(), mode);
        // Only the owner ever edits content; everyone else is read-only.
        let can_edit = folder.is_owned_by(&user.id) && ctx.can_edit(&folder);
        tracing::debug!(
            folder = %folder.id,
            viewer = %user.id,
            ?mode,
            status = %folder.status,
            can_edit,
            "edit permission evaluated"
        );
        Ok(EditCheckResponse {
            folder_id: folder.id,
            status: folder.status,
            first_activity_completed: folder.first_activity_completed,
            can_edit_for_final_submission: folder.can_edit_for_final_submission,
            can_edit,
        })
    }

    /// Apply a content edit as the owning faculty.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` for non-owners or a folder the resolver locks.
    /// - `ConcurrencyConflict` when `expected_version` is stale.
    pub async fn update_outline(
        &self,
        folder_id: &str,
        actor_id: &str,
        patch: OutlinePatch,
        expected_version: Option<i64>,
    ) -> Result<CourseFolder, DatabaseError> {
        let (user, roles) = self.resolve_user(actor_id).await?;
        let now = Utc::now();
        let folder = self.refresh_derived(self.load_folder(folder_id).await?, now).await?;
        check_expected_version(&folder, expected_version)?;

        if !roles.contains(Role::Faculty) || !folder.is_owned_by(&user.id) {
            return Err(CoreError::denied("you can only edit your own folders").into());
        }
        if !ViewerContext::editor(Role::Faculty).can_edit(&folder) {
            tracing::warn!(folder = %folder.id, status = %folder.status, "edit refused on locked folder");
            return Err(CoreError::denied(format!(
                "folder is read-only while {}",
                folder.status
            ))
            .into());
        }

        let mut next = folder.clone();
        if !next.outline_content.is_object() {
            next.outline_content = serde_json::Value::Object(serde_json::Map::new());
        }
        let changed_keys: Vec<String> = match &patch.section {
            Some(section) => {
                let value = patch
                    .content
                    .get(section)
                    .cloned()
                    .unwrap_or_else(|| patch.content.clone());
                if let Some(map) = next.outline_content.as_object_mut() {
                    map.insert(section.clone(), value);
                }
                vec![section.clone()]
            }
            None => {
                let keys = patch
                    .content
                    .as_object()
                    .map(|m| m.keys().cloned().collect())
                    .unwrap_or_default();
                deep_merge(&mut next.outline_content, patch.content.clone());
                keys
            }
        };
        next.version = folder.version + 1;
        next.updated_at = now;

        let tx = self.db().conn().transaction().await?;
        write_folder(&tx, &next, folder.version).await?;
        tx.commit().await?;

        tracing::info!(folder = %next.id, version = next.version, "outline updated");

        self.trail().append(&TrailOperation {
            v: 1,
            ts: now.to_rfc3339(),
            folder: next.id.clone(),
            op: TrailOp::Update,
            entity: EntityType::Folder,
            id: next.id.clone(),
            actor: actor_id.to_string(),
            data: serde_json::json!({ "outline_keys": changed_keys, "version": next.version }),
        })?;

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{Cast, add_user, folder_under_audit, seed_folder, test_service};
    use cfms_core::feedback::FeedbackStage;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_replaces_leaves() {
        let mut target = json!({"a": {"x": 1, "y": [1, 2]}, "b": "keep"});
        deep_merge(&mut target, json!({"a": {"y": [3], "z": true}, "c": 4}));
        assert_eq!(target, json!({"a": {"x": 1, "y": [3], "z": true}, "b": "keep", "c": 4}));
    }

    #[tokio::test]
    async fn create_and_get_folder() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;
        assert_eq!(folder.status, FolderStatus::Draft);
        assert_eq!(folder.version, 1);
        assert!(folder.id.starts_with("fld-"));
        let loaded = svc.get_folder(&folder.id).await.unwrap();
        assert_eq!(loaded, folder);
    }

    #[tokio::test]
    async fn one_folder_per_allocation() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;
        let again = NewFolder {
            faculty_id: folder.faculty_id.clone(),
            course_allocation_id: folder.course_allocation_id.clone(),
            course_id: "SE999".into(),
            section: "Z".into(),
            term_id: folder.term_id.clone(),
            department_id: folder.department_id.clone(),
            program_id: None,
        };
        let err = svc.create_folder(&cast.faculty, &again).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn other_faculty_cannot_create_for_owner() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let new = NewFolder {
            faculty_id: cast.faculty.clone(),
            course_allocation_id: "alloc-2".into(),
            course_id: "SE101".into(),
            section: "A".into(),
            term_id: "fall-2026".into(),
            department_id: "se".into(),
            program_id: None,
        };
        let err = svc.create_folder(&cast.coordinator, &new).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::PermissionDenied { .. })));
        assert!(svc.create_folder(&cast.admin, &new).await.is_ok());
    }

    #[tokio::test]
    async fn outline_section_replace_and_merge() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;

        let f = svc
            .update_outline(
                &folder.id,
                &cast.faculty,
                OutlinePatch {
                    section: None,
                    content: json!({"objectives": {"a": 1}}),
                },
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(f.version, 2);

        let f = svc
            .update_outline(
                &folder.id,
                &cast.faculty,
                OutlinePatch {
                    section: Some("textbooks".into()),
                    content: json!(["SICP"]),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(f.outline_content, json!({"objectives": {"a": 1}, "textbooks": ["SICP"]}));
        assert_eq!(svc.get_folder(&folder.id).await.unwrap().outline_content, f.outline_content);
    }

    #[tokio::test]
    async fn stale_outline_edit_conflicts() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;
        let patch = OutlinePatch {
            section: Some("creditHours".into()),
            content: json!(3),
        };
        svc.update_outline(&folder.id, &cast.faculty, patch.clone(), Some(1)).await.unwrap();
        let err = svc
            .update_outline(&folder.id, &cast.faculty, patch, Some(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Core(CoreError::ConcurrencyConflict {
                expected_version: 1,
                actual_version: 2,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn write_folder_refuses_stale_version() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let mut folder = seed_folder(&svc, &cast).await;
        folder.version = 2;
        write_folder(svc.db().conn(), &folder, 1).await.unwrap();
        folder.version = 3;
        let err = write_folder(svc.db().conn(), &folder, 1).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::ConcurrencyConflict { actual_version: 2, .. })));
    }

    #[tokio::test]
    async fn reviewer_view_is_read_only() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;
        assert!(svc.can_edit_folder(&folder.id, &cast.faculty, None).await.unwrap().can_edit);
        assert!(!svc.can_edit_folder(&folder.id, &cast.hod, None).await.unwrap().can_edit);
        assert!(
            !svc.can_edit_folder(&folder.id, &cast.faculty, Some(ViewMode::AuditReview))
                .await
                .unwrap()
                .can_edit
        );
    }

    #[tokio::test]
    async fn status_counts_are_role_gated() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        seed_folder(&svc, &cast).await;
        let counts = svc.status_counts(&cast.convener, false).await.unwrap();
        assert_eq!(counts, vec![StatusCount { status: FolderStatus::Draft, count: 1 }]);
        assert!(svc.status_counts(&cast.faculty, false).await.is_err());
    }

    #[tokio::test]
    async fn coordinator_view_hides_audit_feedback() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = folder_under_audit(&svc, &cast).await;
        svc.save_feedback(
            &folder.id,
            &cast.auditor_a,
            FeedbackStage::AuditMember,
            "outline",
            "secret audit note",
            None,
        )
        .await
        .unwrap();

        let seen = svc.view_folder(&folder.id, &cast.coordinator).await.unwrap();
        assert!(seen.audit_member_feedback.is_empty());
        let seen = svc.view_folder(&folder.id, &cast.convener).await.unwrap();
        assert_eq!(seen.audit_member_feedback.len(), 1);
    }

    #[tokio::test]
    async fn folders_are_not_readable_across_departments() {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;
        let outsider = add_user(&svc, "ee-coordinator", Role::Coordinator, "ee").await.id;
        let other_faculty = add_user(&svc, "se-faculty-2", Role::Faculty, "se").await.id;

        for viewer in [&outsider, &other_faculty] {
            let err = svc.view_folder(&folder.id, viewer).await.unwrap_err();
            assert!(matches!(err, DatabaseError::Core(CoreError::PermissionDenied { .. })));
        }
        assert!(svc.visible_folders(&outsider, &FolderFilter::default()).await.unwrap().is_empty());
        assert_eq!(svc.visible_folders(&cast.faculty, &FolderFilter::default()).await.unwrap().len(), 1);
        assert!(svc.view_folder(&folder.id, &cast.admin).await.is_ok());
    }

    #[rstest]
    #[case(Role::Coordinator, "se", true)]
    #[case(Role::Coordinator, "ee", false)]
    #[case(Role::Convener, "se", true)]
    #[case(Role::Convener, "ee", false)]
    #[case(Role::Hod, "ee", false)]
    #[case(Role::Faculty, "se", false)]
    #[case(Role::AuditMember, "se", false)]
    #[case(Role::Admin, "ee", true)]
    #[tokio::test]
    async fn draft_read_access_by_role_and_department(
        #[case] role: Role,
        #[case] department: &str,
        #[case] allowed: bool,
    ) {
        let svc = test_service().await;
        let cast = Cast::new(&svc).await;
        let folder = seed_folder(&svc, &cast).await;
        let reader = add_user(&svc, "reader", role, department).await.id;
        assert_eq!(svc.view_folder(&folder.id, &reader).await.is_ok(), allowed);
    }
}
