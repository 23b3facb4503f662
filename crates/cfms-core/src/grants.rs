//! Extra viewer grants on approved folders: access requests and admin shares.
//!
//! Neither changes folder status. Both are limited to `APPROVED_BY_HOD`
//! folders and to the convener and HOD roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{CourseFolder, FolderAccessRequest};
use crate::enums::{AccessRequestStatus, FolderStatus, Role, Verdict};
use crate::errors::CoreError;

/// Roles that may request or be shared an approved folder.
pub const GRANTABLE_ROLES: [Role; 2] = [Role::Convener, Role::Hod];

fn require_approved(folder: &CourseFolder) -> Result<(), CoreError> {
    if folder.status == FolderStatus::ApprovedByHod {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "only approved folders can be shared or requested (folder is {})",
            folder.status
        )))
    }
}

/// What to do with a new access request given any earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPlan {
    Create,
    /// A rejected request exists and is replaced.
    ReplaceRejected,
}

/// Check a convener/HOD request for access to `folder`.
///
/// # Errors
///
/// - `PermissionDenied` for other roles.
/// - `Validation` when the folder is not approved, or a pending or approved
///   request already exists for this requester.
pub fn plan_access_request(
    folder: &CourseFolder,
    requester_role: Role,
    existing: Option<&FolderAccessRequest>,
) -> Result<RequestPlan, CoreError> {
    if !GRANTABLE_ROLES.contains(&requester_role) {
        return Err(CoreError::denied(
            "only conveners and HODs can request folder access",
        ));
    }
    require_approved(folder)?;
    match existing.map(|r| r.status) {
        None => Ok(RequestPlan::Create),
        Some(AccessRequestStatus::Pending) => Err(CoreError::Validation(
            "you already have a pending request for this folder".into(),
        )),
        Some(AccessRequestStatus::Approved) => Err(CoreError::Validation(
            "you already have access to this folder".into(),
        )),
        Some(AccessRequestStatus::Rejected) => Ok(RequestPlan::ReplaceRejected),
    }
}

/// Resolve a pending request as an admin. Returns the updated request.
///
/// # Errors
///
/// - `PermissionDenied` unless `resolver_role` is admin.
/// - `Validation` when the request is not pending, or a rejection has no notes.
pub fn resolve_access_request(
    request: &FolderAccessRequest,
    resolver_id: &str,
    resolver_role: Role,
    verdict: Verdict,
    notes: &str,
    now: DateTime<Utc>,
) -> Result<FolderAccessRequest, CoreError> {
    if resolver_role != Role::Admin {
        return Err(CoreError::denied("only admins can resolve access requests"));
    }
    let next = match verdict {
        Verdict::Approve => AccessRequestStatus::Approved,
        Verdict::Reject => AccessRequestStatus::Rejected,
    };
    if !request.status.can_transition_to(next) {
        return Err(CoreError::Validation(format!(
            "access request is already {}",
            request.status
        )));
    }
    let notes = notes.trim();
    if verdict == Verdict::Reject && notes.is_empty() {
        return Err(CoreError::Validation(
            "notes are required when rejecting a request".into(),
        ));
    }
    let mut resolved = request.clone();
    resolved.status = next;
    resolved.admin_notes = (!notes.is_empty()).then(|| notes.to_string());
    resolved.resolved_by = Some(resolver_id.to_string());
    resolved.resolved_at = Some(now);
    Ok(resolved)
}

/// Check an admin share of `folder` with `target`.
///
/// # Errors
///
/// - `PermissionDenied` unless `sharer_role` is admin.
/// - `Validation` for a non-grantable target role or unapproved folder.
pub fn check_share(folder: &CourseFolder, sharer_role: Role, target: Role) -> Result<(), CoreError> {
    if sharer_role != Role::Admin {
        return Err(CoreError::denied("only admins can share folders"));
    }
    if !GRANTABLE_ROLES.contains(&target) {
        return Err(CoreError::Validation(format!(
            "folders can only be shared with CONVENER or HOD, not {target}"
        )));
    }
    require_approved(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_support::draft_folder;
    use chrono::TimeZone;

    fn approved() -> CourseFolder {
        let mut folder = draft_folder();
        folder.status = FolderStatus::ApprovedByHod;
        folder
    }

    fn request(status: AccessRequestStatus) -> FolderAccessRequest {
        FolderAccessRequest {
            id: "acr-1".into(),
            folder_id: "fld-00000001".into(),
            requested_by: "usr-hod".into(),
            requester_role: Role::Hod,
            status,
            admin_notes: None,
            resolved_by: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            resolved_at: None,
        }
    }

    #[test]
    fn only_convener_and_hod_may_request() {
        assert!(matches!(
            plan_access_request(&approved(), Role::Faculty, None),
            Err(CoreError::PermissionDenied { .. })
        ));
        assert_eq!(
            plan_access_request(&approved(), Role::Convener, None).unwrap(),
            RequestPlan::Create
        );
    }

    #[test]
    fn duplicate_requests() {
        let pending = request(AccessRequestStatus::Pending);
        assert!(plan_access_request(&approved(), Role::Hod, Some(&pending)).is_err());
        let rejected = request(AccessRequestStatus::Rejected);
        assert_eq!(
            plan_access_request(&approved(), Role::Hod, Some(&rejected)).unwrap(),
            RequestPlan::ReplaceRejected
        );
    }

    #[test]
    fn unapproved_folder_cannot_be_requested() {
        assert!(matches!(
            plan_access_request(&draft_folder(), Role::Hod, None),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rejecting_needs_notes() {
        let now = Utc.with_ymd_and_hms(2026, 10, 2, 0, 0, 0).unwrap();
        let pending = request(AccessRequestStatus::Pending);
        assert!(matches!(
            resolve_access_request(&pending, "usr-admin", Role::Admin, Verdict::Reject, "", now),
            Err(CoreError::Validation(_))
        ));
        let done =
            resolve_access_request(&pending, "usr-admin", Role::Admin, Verdict::Approve, "", now)
                .unwrap();
        assert_eq!(done.status, AccessRequestStatus::Approved);
        assert_eq!(done.resolved_at, Some(now));
        assert!(
            resolve_access_request(&done, "usr-admin", Role::Admin, Verdict::Reject, "x", now)
                .is_err()
        );
    }

    #[test]
    fn share_rules() {
        assert!(check_share(&approved(), Role::Admin, Role::Hod).is_ok());
        assert!(check_share(&approved(), Role::Hod, Role::Hod).is_err());
        assert!(check_share(&approved(), Role::Admin, Role::Faculty).is_err());
        assert!(check_share(&draft_folder(), Role::Admin, Role::Convener).is_err());
    }
}
