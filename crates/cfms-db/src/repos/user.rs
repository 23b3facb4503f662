//! User repository: accounts, capability flags and effective roles.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use cfms_core::access::{CapabilityFlags, EffectiveRoleSet, landing_path};
use cfms_core::entities::UserAccount;
use cfms_core::enums::Role;
use cfms_core::errors::CoreError;
use cfms_core::ids::PREFIX_USER;
use cfms_core::responses::RolesResponse;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, parse_datetime, parse_enum};
use crate::service::FolderService;

const SELECT_COLS: &str = "id, name, email, role, department_id, has_audit_access, \
     has_coordinator_access, is_active, created_at, updated_at";

fn row_to_user(row: &libsql::Row) -> Result<UserAccount, DatabaseError> {
    Ok(UserAccount {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: parse_enum(&row.get::<String>(3)?)?,
        department_id: get_opt_string(row, 4)?,
        has_audit_access: get_bool(row, 5)?,
        has_coordinator_access: get_bool(row, 6)?,
        is_active: get_bool(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

/// Fields for a new account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub department_id: Option<String>,
    #[serde(default)]
    pub capabilities: CapabilityFlags,
}

/// Filters for `list_users`.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub department_id: Option<String>,
    pub active_only: bool,
    pub limit: Option<u32>,
}

impl FolderService {
    /// Create a user account. Accounts default to `FACULTY`.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name/email or an email already in use.
    pub async fn create_user(&self, new: &NewUser) -> Result<UserAccount, DatabaseError> {
        let name = new.name.trim();
        let email = new.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() {
            return Err(CoreError::Validation("name and email are required".into()).into());
        }
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(CoreError::Validation(format!("email {email} is already registered")).into());
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_USER).await?;
        let role = new.role.unwrap_or(Role::Faculty);

        self.db().conn().execute(
            &format!(
                "INSERT INTO users ({SELECT_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)"
            ),
            libsql::params![
                id.as_str(),
                name,
                email.as_str(),
                role.as_str(),
                new.department_id.as_deref(),
                i64::from(new.capabilities.has_audit_access),
                i64::from(new.capabilities.has_coordinator_access),
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        ).await?;

        tracing::info!(user = %id, role = %role, "user created");

        Ok(UserAccount {
            id,
            name: name.to_string(),
            email,
            role,
            department_id: new.department_id.clone(),
            has_audit_access: new.capabilities.has_audit_access,
            has_coordinator_access: new.capabilities.has_coordinator_access,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no user has this id.
    pub async fn get_user(&self, id: &str) -> Result<UserAccount, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!("SELECT {SELECT_COLS} FROM users WHERE id = ?1"),
            [id],
        ).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("user", id))?;
        row_to_user(&row)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!("SELECT {SELECT_COLS} FROM users WHERE email = ?1"),
            [email.trim().to_lowercase()],
        ).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserAccount>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(role) = filter.role {
            params.push(role.as_str().into());
            conditions.push(format!("role = ?{}", params.len()));
        }
        if let Some(ref dept) = filter.department_id {
            params.push(dept.clone().into());
            conditions.push(format!("department_id = ?{}", params.len()));
        }
        if filter.active_only {
            conditions.push("is_active = 1".to_string());
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(u32::MAX);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM users {where_clause} ORDER BY created_at, id LIMIT {limit}"
        );
        let mut rows = self.db().conn().query(&sql, libsql::params_from_iter(params)).await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Active users of a department whose effective role set contains `role`.
    ///
    /// Users without a department match every department.
    pub async fn users_with_role(
        &self,
        role: Role,
        department_id: &str,
    ) -> Result<Vec<UserAccount>, DatabaseError> {
        let mut rows = self.db().conn().query(
            &format!(
                "SELECT {SELECT_COLS} FROM users
                 WHERE is_active = 1 AND (department_id = ?1 OR department_id IS NULL)
                 ORDER BY id"
            ),
            [department_id],
        ).await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            let user = row_to_user(&row)?;
            if EffectiveRoleSet::resolve(user.role, user.capabilities()).contains(role) {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Load an active user and resolve their effective role set once.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `PermissionDenied` for a deactivated account.
    pub async fn resolve_user(&self, user_id: &str) -> Result<(UserAccount, EffectiveRoleSet), DatabaseError> {
        let user = self.get_user(user_id).await?;
        if !user.is_active {
            return Err(CoreError::denied(format!("account {user_id} is deactivated")).into());
        }
        let roles = EffectiveRoleSet::resolve(user.role, user.capabilities());
        tracing::debug!(user = %user.id, roles = %roles, "resolved effective roles");
        Ok((user, roles))
    }

    /// Resolve a user and require that they may act as `role`.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when `role` is not in the user's effective set.
    pub async fn require_role(&self, user_id: &str, role: Role) -> Result<UserAccount, DatabaseError> {
        let (user, roles) = self.resolve_user(user_id).await?;
        if !roles.contains(role) {
            tracing::warn!(user = %user_id, required = %role, roles = %roles, "role check failed");
            return Err(CoreError::denied(format!("{role} access is required")).into());
        }
        Ok(user)
    }

    /// Effective roles and landing page for a user.
    pub async fn user_roles(&self, user_id: &str) -> Result<RolesResponse, DatabaseError> {
        let (user, roles) = self.resolve_user(user_id).await?;
        Ok(RolesResponse {
            user_id: user.id,
            primary: user.role,
            landing: landing_path(roles.primary()).to_string(),
            effective: roles,
        })
    }

    /// Grant or revoke capability flags. Admin only.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless `admin_id` acts as admin.
    pub async fn set_capabilities(
        &self,
        admin_id: &str,
        user_id: &str,
        flags: CapabilityFlags,
    ) -> Result<UserAccount, DatabaseError> {
        self.require_role(admin_id, Role::Admin).await?;
        let now = Utc::now();
        let changed = self.db().conn().execute(
            "UPDATE users SET has_audit_access = ?1, has_coordinator_access = ?2, updated_at = ?3
             WHERE id = ?4",
            libsql::params![
                i64::from(flags.has_audit_access),
                i64::from(flags.has_coordinator_access),
                now.to_rfc3339(),
                user_id
            ],
        ).await?;
        if changed == 0 {
            return Err(CoreError::not_found("user", user_id).into());
        }
        tracing::info!(
            user = %user_id,
            audit = flags.has_audit_access,
            coordinator = flags.has_coordinator_access,
            "capabilities updated"
        );
        self.get_user(user_id).await
    }

    /// Activate or deactivate an account. Admin only.
    pub async fn set_user_active(
        &self,
        admin_id: &str,
        user_id: &str,
        active: bool,
    ) -> Result<UserAccount, DatabaseError> {
        self.require_role(admin_id, Role::Admin).await?;
        let changed = self.db().conn().execute(
            "UPDATE users SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            libsql::params![i64::from(active), Utc::now().to_rfc3339(), user_id],
        ).await?;
        if changed == 0 {
            return Err(CoreError::not_found("user", user_id).into());
        }
        self.get_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{add_user, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let svc = test_service().await;
        let user = add_user(&svc, "Ayesha", Role::Coordinator, "se").await;
        let loaded = svc.get_user(&user.id).await.unwrap();
        assert_eq!(loaded, user);
        assert!(user.id.starts_with("usr-"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let svc = test_service().await;
        add_user(&svc, "Bilal", Role::Faculty, "se").await;
        let err = svc
            .create_user(&NewUser {
                name: "Other".into(),
                email: "BILAL@example.edu".into(),
                ..NewUser::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let svc = test_service().await;
        let err = svc.get_user("usr-nope").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn capability_grant_extends_roles() {
        let svc = test_service().await;
        let admin = add_user(&svc, "Admin", Role::Admin, "se").await;
        let fac = add_user(&svc, "Fatima", Role::Faculty, "se").await;

        assert!(svc.require_role(&fac.id, Role::AuditMember).await.is_err());
        svc.set_capabilities(
            &admin.id,
            &fac.id,
            CapabilityFlags {
                has_audit_access: true,
                has_coordinator_access: false,
            },
        )
        .await
        .unwrap();
        assert!(svc.require_role(&fac.id, Role::AuditMember).await.is_ok());

        let auditors = svc.users_with_role(Role::AuditMember, "se").await.unwrap();
        assert_eq!(auditors.iter().map(|u| u.id.clone()).collect::<Vec<_>>(), vec![fac.id.clone()]);
    }

    #[tokio::test]
    async fn only_admin_grants_capabilities() {
        let svc = test_service().await;
        let fac = add_user(&svc, "Fatima", Role::Faculty, "se").await;
        let err = svc
            .set_capabilities(&fac.id, &fac.id, CapabilityFlags::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn deactivated_user_cannot_act() {
        let svc = test_service().await;
        let admin = add_user(&svc, "Admin", Role::Admin, "se").await;
        let hod = add_user(&svc, "Hamid", Role::Hod, "se").await;
        svc.set_user_active(&admin.id, &hod.id, false).await.unwrap();
        assert!(matches!(
            svc.resolve_user(&hod.id).await.unwrap_err(),
            DatabaseError::Core(CoreError::PermissionDenied { .. })
        ));
    }

    #[tokio::test]
    async fn roles_response_uses_primary_landing() {
        let svc = test_service().await;
        let aud = add_user(&svc, "Usman", Role::AuditMember, "se").await;
        let roles = svc.user_roles(&aud.id).await.unwrap();
        assert_eq!(roles.landing, "/audit-member/dashboard");
        assert!(roles.effective.contains(Role::Faculty));
    }
}
