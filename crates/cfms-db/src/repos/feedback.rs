//! Per-section reviewer feedback and the rejection banner.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use cfms_core::access::{FolderReader, can_read_as};
use cfms_core::entities::CourseFolder;
use cfms_core::enums::{EntityType, Role, TrailOp};
use cfms_core::errors::CoreError;
use cfms_core::feedback::{
    FeedbackStage, RejectionBanner, SectionKey, VisibleFeedback, record_feedback, redact_feedback,
    rejection_banner, visible_feedback,
};
use cfms_core::trail::TrailOperation;

use crate::error::DatabaseError;
use crate::repos::folder::{check_expected_version, write_folder};
use crate::service::FolderService;

/// Feedback visible to one viewer, tagged with the role it was read as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackView {
    pub folder_id: String,
    pub viewer_role: Role,
    #[serde(flatten)]
    pub feedback: VisibleFeedback,
}

impl FolderService {
    /// Write one section remark for `stage`.
    ///
    /// Coordinator remarks may be written by any coordinator while the stage
    /// holds review; audit remarks only by an auditor assigned to the folder.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` when the actor cannot write this stage now.
    /// - `Validation` for an unknown section key or blank text.
    /// - `ConcurrencyConflict` when `expected_version` is stale.
    pub async fn save_feedback(
        &self,
        folder_id: &str,
        actor_id: &str,
        stage: FeedbackStage,
        section: &str,
        text: &str,
        expected_version: Option<i64>,
    ) -> Result<CourseFolder, DatabaseError> {
        let key = SectionKey::parse(section)?;
        let author = stage.author_role();
        let user = self.require_role(actor_id, author).await?;
        let now = Utc::now();
        let folder = self.refresh_derived(self.load_folder(folder_id).await?, now).await?;
        check_expected_version(&folder, expected_version)?;

        if stage == FeedbackStage::AuditMember && !folder.is_assigned_auditor(&user.id) {
            return Err(CoreError::denied("you are not assigned to audit this folder").into());
        }

        let mut next = folder.clone();
        record_feedback(&mut next, key.clone(), stage, author, text)?;
        next.version = folder.version + 1;
        next.updated_at = now;

        let tx = self.db().conn().transaction().await?;
        write_folder(&tx, &next, folder.version).await?;
        tx.commit().await?;

        tracing::info!(folder = %next.id, %stage, section = %key, "feedback saved");

        self.trail().append(&TrailOperation {
            v: 1,
            ts: now.to_rfc3339(),
            folder: next.id.clone(),
            op: TrailOp::Update,
            entity: EntityType::Feedback,
            id: format!("{}:{stage}:{key}", next.id),
            actor: user.id.clone(),
            data: serde_json::json!({ "stage": stage, "section": key, "text": text.trim() }),
        })?;

        Ok(next)
    }

    /// Feedback maps a viewer may read.
    ///
    /// `as_role` picks which of the viewer's effective roles to read as; it
    /// must itself reach the folder. The default is the role the viewer's
    /// read access resolves to.
    pub async fn folder_feedback(
        &self,
        folder_id: &str,
        viewer_id: &str,
        as_role: Option<Role>,
    ) -> Result<FeedbackView, DatabaseError> {
        let folder = self.get_folder(folder_id).await?;
        let granted = self.authorize_read(&folder, viewer_id).await?;
        let role = match as_role {
            None => granted,
            Some(role) if role == granted => granted,
            Some(role) => {
                let (user, roles) = self.resolve_user(viewer_id).await?;
                if !roles.contains(role) {
                    return Err(CoreError::denied(format!("you do not hold the {role} role")).into());
                }
                let has_viewer_grant = self.has_viewer_grant(&folder.id, &user.id).await?;
                let reader = FolderReader {
                    user_id: &user.id,
                    department_id: user.department_id.as_deref(),
                    roles: &roles,
                    has_viewer_grant,
                };
                if !can_read_as(&folder, &reader, role) {
                    return Err(CoreError::denied(format!("you cannot read this folder as {role}")).into());
                }
                role
            }
        };
        Ok(FeedbackView {
            folder_id: folder.id.clone(),
            viewer_role: role,
            feedback: visible_feedback(&folder, role),
        })
    }

    /// The rejection banner for a folder, if it is rejected.
    ///
    /// Section remarks are limited to the stages the viewer may read.
    pub async fn folder_banner(
        &self,
        folder_id: &str,
        viewer_id: &str,
    ) -> Result<Option<RejectionBanner>, DatabaseError> {
        let folder = self.get_folder(folder_id).await?;
        let role = self.authorize_read(&folder, viewer_id).await?;
        Ok(rejection_banner(&redact_feedback(&folder, role)))
    }
}
