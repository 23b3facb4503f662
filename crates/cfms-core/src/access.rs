//! Role/capability access matrix and landing routes.
//!
//! A request first resolves the caller's [`EffectiveRoleSet`] once, then
//! checks it against the route's allowed roles. Capability flags only ever
//! add roles.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::CourseFolder;
use crate::enums::{FolderStatus, Role};
use crate::errors::CoreError;
use crate::grants::GRANTABLE_ROLES;

/// Cross-role grants attached to a user, orthogonal to the primary role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub has_audit_access: bool,
    pub has_coordinator_access: bool,
}

/// Primary role plus every role granted through capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRoleSet {
    primary: Role,
    roles: BTreeSet<Role>,
}

impl EffectiveRoleSet {
    #[must_use]
    pub fn resolve(primary: Role, flags: CapabilityFlags) -> Self {
        let mut roles = BTreeSet::from([primary]);
        // Audit members also teach, so they reach faculty folder routes.
        if primary == Role::AuditMember {
            roles.insert(Role::Faculty);
        }
        if flags.has_audit_access {
            roles.insert(Role::AuditMember);
        }
        if flags.has_coordinator_access {
            roles.insert(Role::Coordinator);
        }
        Self { primary, roles }
    }

    #[must_use]
    pub const fn primary(&self) -> Role {
        self.primary
    }

    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    /// Whether any role in the set is allowed on the route.
    #[must_use]
    pub fn is_allowed(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|r| self.roles.contains(r))
    }
}

impl fmt::Display for EffectiveRoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.roles.iter().map(|r| r.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

// ---------------------------------------------------------------------------
// Route guard
// ---------------------------------------------------------------------------

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Outcome of guarding one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "path", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    Redirect(String),
    NotFound,
}

/// Guard a gated route. `None` means the caller is not authenticated.
#[must_use]
pub fn guard(roles: Option<&EffectiveRoleSet>, allowed: &[Role]) -> RouteDecision {
    match roles {
        None => RouteDecision::Redirect(LOGIN_PATH.to_string()),
        Some(set) if set.is_allowed(allowed) => RouteDecision::Allow,
        Some(_) => RouteDecision::Redirect(UNAUTHORIZED_PATH.to_string()),
    }
}

const ALL_ROLES: &[Role] = &Role::ALL;

/// Gated route prefixes and the roles they admit.
const ROUTES: &[(&str, &[Role])] = &[
    ("/admin", &[Role::Admin]),
    ("/faculty", &[Role::Faculty]),
    ("/coordinator", &[Role::Coordinator]),
    ("/audit-member", &[Role::AuditMember]),
    ("/convener", &[Role::Convener]),
    ("/hod", &[Role::Hod]),
    ("/folders", ALL_ROLES),
];

/// Allowed roles for a path, matched on whole path segments.
#[must_use]
pub fn route_roles(path: &str) -> Option<&'static [Role]> {
    ROUTES.iter().find_map(|(prefix, roles)| {
        let rest = path.strip_prefix(prefix)?;
        (rest.is_empty() || rest.starts_with('/')).then_some(*roles)
    })
}

/// Static role → landing page table.
#[must_use]
pub const fn landing_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Faculty => "/faculty/dashboard",
        Role::Coordinator => "/coordinator/dashboard",
        Role::Convener => "/convener/dashboard",
        Role::Hod => "/hod/dashboard",
        Role::AuditMember => "/audit-member/dashboard",
    }
}

/// Resolve any path for a caller: public pages, landing aliases, gated routes.
#[must_use]
pub fn check_route(path: &str, roles: Option<&EffectiveRoleSet>) -> RouteDecision {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    match path {
        LOGIN_PATH | UNAUTHORIZED_PATH => RouteDecision::Allow,
        "/" | "/dashboard" | "/profile" => RouteDecision::Redirect(
            roles.map_or(LOGIN_PATH, |set| landing_path(set.primary())).to_string(),
        ),
        _ => route_roles(path).map_or(RouteDecision::NotFound, |allowed| guard(roles, allowed)),
    }
}

// ---------------------------------------------------------------------------
// Folder reads
// ---------------------------------------------------------------------------

/// Who is asking to read a folder.
#[derive(Debug, Clone, Copy)]
pub struct FolderReader<'a> {
    pub user_id: &'a str,
    pub department_id: Option<&'a str>,
    pub roles: &'a EffectiveRoleSet,
    /// An approved access request or an admin share reaches this user.
    pub has_viewer_grant: bool,
}

/// Order in which a reader's roles are tried; the first match decides
/// which feedback the reader sees.
const READ_ORDER: [Role; 6] = [
    Role::Admin,
    Role::Faculty,
    Role::AuditMember,
    Role::Hod,
    Role::Convener,
    Role::Coordinator,
];

/// Whether `reader` may read `folder` while acting as `role`.
///
/// Faculty read only their own folders and auditors only folders they are
/// assigned to. Department reviewers read their department's folders;
/// conveners and HODs also read approved folders through a viewer grant.
#[must_use]
pub fn can_read_as(folder: &CourseFolder, reader: &FolderReader<'_>, role: Role) -> bool {
    if !reader.roles.contains(role) {
        return false;
    }
    let same_department = reader.department_id == Some(folder.department_id.as_str());
    match role {
        Role::Admin => true,
        Role::Faculty => folder.is_owned_by(reader.user_id),
        Role::AuditMember => folder.is_assigned_auditor(reader.user_id),
        Role::Coordinator => same_department,
        Role::Convener | Role::Hod => {
            same_department
                || (reader.has_viewer_grant
                    && folder.status == FolderStatus::ApprovedByHod
                    && GRANTABLE_ROLES.contains(&role))
        }
    }
}

/// The role `reader` reads `folder` as.
///
/// # Errors
///
/// `PermissionDenied` when none of the reader's roles reaches the folder.
pub fn folder_read_role(folder: &CourseFolder, reader: &FolderReader<'_>) -> Result<Role, CoreError> {
    READ_ORDER
        .into_iter()
        .find(|role| can_read_as(folder, reader, *role))
        .ok_or_else(|| CoreError::denied(format!("you cannot view folder {}", folder.id)))
}
