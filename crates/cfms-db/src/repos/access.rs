//! Viewer grants on approved folders, plus the route guard.
//!
//! Conveners and HODs outside the normal review path reach an approved
//! folder either by an admin-approved access request or by an admin share
//! with their role.

use chrono::Utc;

use cfms_core::access::{EffectiveRoleSet, check_route};
use cfms_core::entities::{FolderAccessRequest, FolderShare};
use cfms_core::enums::{AccessRequestStatus, EntityType, Role, TrailOp, Verdict};
use cfms_core::errors::CoreError;
use cfms_core::grants::{RequestPlan, check_share, plan_access_request, resolve_access_request};
use cfms_core::ids::PREFIX_ACCESS_REQUEST;
use cfms_core::responses::{RouteCheckResponse, ShareResponse};
use cfms_core::trail::TrailOperation;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_datetime, get_opt_string, parse_datetime, parse_enum};
use crate::notify::{Notification, NotificationKind};
use crate::service::FolderService;

const REQUEST_COLS: &str = "id, folder_id, requested_by, requester_role, status, admin_notes, \
     resolved_by, created_at, resolved_at";

const SHARE_COLS: &str = "folder_id, role, shared_by, created_at";

fn row_to_request(row: &libsql::Row) -> Result<FolderAccessRequest, DatabaseError> {
    Ok(FolderAccessRequest {
        id: row.get(0)?,
        folder_id: row.get(1)?,
        requested_by: row.get(2)?,
        requester_role: parse_enum(&row.get::<String>(3)?)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        admin_notes: get_opt_string(row, 5)?,
        resolved_by: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        resolved_at: get_opt_datetime(row, 8)?,
    })
}

fn row_to_share(row: &libsql::Row) -> Result<FolderShare, DatabaseError> {
    Ok(FolderShare {
        folder_id: row.get(0)?,
        role: parse_enum(&row.get::<String>(1)?)?,
        shared_by: row.get(2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

/// The role a convener/HOD requests under: the first grantable role they hold.
fn requesting_role(roles: &EffectiveRoleSet) -> Role {
    if roles.contains(Role::Hod) {
        Role::Hod
    } else if roles.contains(Role::Convener) {
        Role::Convener
    } else {
        roles.primary()
    }
}

impl FolderService {
    async fn find_request(
        &self,
        folder_id: &str,
        requested_by: &str,
    ) -> Result<Option<FolderAccessRequest>, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!("SELECT {REQUEST_COLS} FROM folder_access_requests WHERE folder_id = ?1 AND requested_by = ?2"),
            [folder_id, requested_by],
        ).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_request(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_access_request(&self, id: &str) -> Result<FolderAccessRequest, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!("SELECT {REQUEST_COLS} FROM folder_access_requests WHERE id = ?1"),
            [id],
        ).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("access_request", id))?;
        row_to_request(&row)
    }

    /// Ask for read access to an approved folder.
    ///
    /// A rejected earlier request is replaced in place and returns to pending.
    /// Admins are notified.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the actor is a convener or HOD.
    /// - `Validation` for unapproved folders or an open/approved request.
    pub async fn request_access(
        &self,
        folder_id: &str,
        actor_id: &str,
    ) -> Result<FolderAccessRequest, DatabaseError> {
        let (user, roles) = self.resolve_user(actor_id).await?;
        let role = requesting_role(&roles);
        let folder = self.get_folder(folder_id).await?;
        let existing = self.find_request(folder_id, &user.id).await?;
        let plan = plan_access_request(&folder, role, existing.as_ref())?;
        let now = Utc::now();

        let request = match (plan, existing) {
            (RequestPlan::ReplaceRejected, Some(old)) => {
                self.db().conn().execute(
                    "UPDATE folder_access_requests
                     SET status = 'PENDING', requester_role = ?1, admin_notes = NULL,
                         resolved_by = NULL, resolved_at = NULL, created_at = ?2
                     WHERE id = ?3",
                    libsql::params![role.as_str(), now.to_rfc3339(), old.id.as_str()],
                )
                .await?;
                FolderAccessRequest {
                    requester_role: role,
                    status: AccessRequestStatus::Pending,
                    admin_notes: None,
                    resolved_by: None,
                    created_at: now,
                    resolved_at: None,
                    ..old
                }
            }
            _ => {
                let request = FolderAccessRequest {
                    id: self.db().generate_id(PREFIX_ACCESS_REQUEST).await?,
                    folder_id: folder.id.clone(),
                    requested_by: user.id.clone(),
                    requester_role: role,
                    status: AccessRequestStatus::Pending,
                    admin_notes: None,
                    resolved_by: None,
                    created_at: now,
                    resolved_at: None,
                };
                self.db().conn().execute(
                    "INSERT INTO folder_access_requests (id, folder_id, requested_by, requester_role, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    libsql::params![
                        request.id.as_str(),
                        request.folder_id.as_str(),
                        request.requested_by.as_str(),
                        role.as_str(),
                        request.status.as_str(),
                        now.to_rfc3339()
                    ],
                )
                .await?;
                request
            }
        };

        tracing::info!(request = %request.id, folder = %folder.id, requester = %user.id, ?plan, "access requested");

        self.trail().append(&TrailOperation {
            v: 1,
            ts: now.to_rfc3339(),
            folder: folder.id.clone(),
            op: TrailOp::Create,
            entity: EntityType::AccessRequest,
            id: request.id.clone(),
            actor: user.id.clone(),
            data: serde_json::to_value(&request)?,
        })?;

        let admins = self.users_with_role(Role::Admin, &folder.department_id).await?;
        let notifications: Vec<_> = admins
            .into_iter()
            .map(|admin| Notification {
                recipient: admin.id,
                kind: NotificationKind::AccessRequested,
                folder_id: folder.id.clone(),
                title: "Folder access requested".into(),
                message: format!(
                    "{} ({role}) asked to view {} - {}",
                    user.name, folder.course_id, folder.section
                ),
            })
            .collect();
        self.notify_all(&notifications);

        Ok(request)
    }

    /// Admins see every request; anyone else sees only their own.
    pub async fn list_access_requests(
        &self,
        actor_id: &str,
        status: Option<AccessRequestStatus>,
    ) -> Result<Vec<FolderAccessRequest>, DatabaseError> {
        let (user, roles) = self.resolve_user(actor_id).await?;
        let mut sql = format!("SELECT {REQUEST_COLS} FROM folder_access_requests WHERE 1=1");
        let mut params: Vec<libsql::Value> = Vec::new();
        if !roles.contains(Role::Admin) {
            params.push(user.id.clone().into());
            sql.push_str(&format!(" AND requested_by = ?{}", params.len()));
        }
        if let Some(status) = status {
            params.push(status.as_str().into());
            sql.push_str(&format!(" AND status = ?{}", params.len()));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await? {
            requests.push(row_to_request(&row)?);
        }
        Ok(requests)
    }

    /// Approve or reject a pending request as an admin. The requester is told.
    pub async fn resolve_access(
        &self,
        request_id: &str,
        actor_id: &str,
        verdict: Verdict,
        notes: &str,
    ) -> Result<FolderAccessRequest, DatabaseError> {
        let (user, roles) = self.resolve_user(actor_id).await?;
        let role = if roles.contains(Role::Admin) { Role::Admin } else { roles.primary() };
        let request = self.get_access_request(request_id).await?;
        let now = Utc::now();
        let resolved = resolve_access_request(&request, &user.id, role, verdict, notes, now)?;

        let changed = self.db().conn().execute(
            "UPDATE folder_access_requests
             SET status = ?1, admin_notes = ?2, resolved_by = ?3, resolved_at = ?4
             WHERE id = ?5 AND status = 'PENDING'",
            libsql::params![
                resolved.status.as_str(),
                resolved.admin_notes.as_deref(),
                user.id.as_str(),
                now.to_rfc3339(),
                request.id.as_str()
            ],
        )
        .await?;
        if changed == 0 {
            return Err(CoreError::Validation(format!("access request {request_id} was already resolved")).into());
        }

        tracing::info!(request = %resolved.id, status = %resolved.status, admin = %user.id, "access request resolved");

        self.trail().append(&TrailOperation {
            v: 1,
            ts: now.to_rfc3339(),
            folder: resolved.folder_id.clone(),
            op: TrailOp::Update,
            entity: EntityType::AccessRequest,
            id: resolved.id.clone(),
            actor: user.id.clone(),
            data: serde_json::json!({
                "status": resolved.status,
                "admin_notes": resolved.admin_notes,
            }),
        })?;

        let (kind, title) = match verdict {
            Verdict::Approve => (NotificationKind::FolderApproved, "Access request approved"),
            Verdict::Reject => (NotificationKind::FolderReturned, "Access request rejected"),
        };
        self.notify_all(&[Notification {
            recipient: resolved.requested_by.clone(),
            kind,
            folder_id: resolved.folder_id.clone(),
            title: title.into(),
            message: resolved
                .admin_notes
                .clone()
                .unwrap_or_else(|| format!("Your request is {}", resolved.status)),
        }]);

        Ok(resolved)
    }

    /// Share an approved folder with every convener or every HOD.
    ///
    /// Sharing again with the same role refreshes the share.
    pub async fn share_with_role(
        &self,
        folder_id: &str,
        actor_id: &str,
        target: Role,
    ) -> Result<ShareResponse, DatabaseError> {
        let (user, roles) = self.resolve_user(actor_id).await?;
        let sharer = if roles.contains(Role::Admin) { Role::Admin } else { roles.primary() };
        let folder = self.get_folder(folder_id).await?;
        check_share(&folder, sharer, target)?;

        let share = FolderShare {
            folder_id: folder.id.clone(),
            role: target,
            shared_by: user.id.clone(),
            created_at: Utc::now(),
        };
        self.db().conn().execute(
            &format!("INSERT OR REPLACE INTO folder_shares ({SHARE_COLS}) VALUES (?1, ?2, ?3, ?4)"),
            libsql::params![
                share.folder_id.as_str(),
                target.as_str(),
                share.shared_by.as_str(),
                share.created_at.to_rfc3339()
            ],
        )
        .await?;

        tracing::info!(folder = %folder.id, role = %target, admin = %user.id, "folder shared");

        self.trail().append(&TrailOperation {
            v: 1,
            ts: share.created_at.to_rfc3339(),
            folder: folder.id.clone(),
            op: TrailOp::Create,
            entity: EntityType::Share,
            id: format!("{}:{target}", folder.id),
            actor: user.id.clone(),
            data: serde_json::to_value(&share)?,
        })?;

        let notified: Vec<String> = self
            .users_with_role(target, &folder.department_id)
            .await?
            .into_iter()
            .map(|u| u.id)
            .filter(|id| *id != user.id)
            .collect();
        let notifications: Vec<_> = notified
            .iter()
            .map(|recipient| Notification {
                recipient: recipient.clone(),
                kind: NotificationKind::FolderShared,
                folder_id: folder.id.clone(),
                title: "Folder shared with you".into(),
                message: format!("{} - {} was shared with all {target} users", folder.course_id, folder.section),
            })
            .collect();
        self.notify_all(&notifications);

        Ok(ShareResponse { share, notified })
    }

    pub async fn list_shares(&self, folder_id: &str) -> Result<Vec<FolderShare>, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!("SELECT {SHARE_COLS} FROM folder_shares WHERE folder_id = ?1 ORDER BY created_at"),
            [folder_id],
        ).await?;
        let mut shares = Vec::new();
        while let Some(row) = rows.next().await? {
            shares.push(row_to_share(&row)?);
        }
        Ok(shares)
    }

    /// Whether a user reaches a folder through a share or an approved request.
    pub async fn has_viewer_grant(&self, folder_id: &str, user_id: &str) -> Result<bool, DatabaseError> {
        let (user, roles) = self.resolve_user(user_id).await?;
        if let Some(request) = self.find_request(folder_id, &user.id).await? {
            if request.status == AccessRequestStatus::Approved {
                return Ok(true);
            }
        }
        Ok(self
            .list_shares(folder_id)
            .await?
            .iter()
            .any(|share| roles.contains(share.role)))
    }

    /// Guard `path` for a caller. Unknown or deactivated users count as
    /// unauthenticated.
    pub async fn check_route(
        &self,
        user_id: Option<&str>,
        path: &str,
    ) -> Result<RouteCheckResponse, DatabaseError> {
        let roles = match user_id {
            None => None,
            Some(id) => match self.resolve_user(id).await {
                Ok((_, roles)) => Some(roles),
                Err(DatabaseError::Core(CoreError::NotFound { .. } | CoreError::PermissionDenied { .. })) => None,
                Err(e) => return Err(e),
            },
        };
        Ok(RouteCheckResponse {
            path: path.to_string(),
            decision: check_route(path, roles.as_ref()),
        })
    }
}
