//! Edit permission resolver.
//!
//! Decides whether a folder is editable or read-only for a viewer. The
//! verdict is per folder; reviewer contexts are always read-only.

use serde::{Deserialize, Serialize};

use crate::entities::CourseFolder;
use crate::enums::{FolderStatus, Role};

/// Core edit rule over raw inputs. Total over every combination.
#[must_use]
#[allow(clippy::fn_params_excessive_bools)]
pub const fn can_edit(
    status: FolderStatus,
    first_activity_completed: bool,
    can_edit_for_final_submission: bool,
    is_audit_review: bool,
    is_convener_review: bool,
    is_hod_review: bool,
) -> bool {
    if is_audit_review || is_convener_review || is_hod_review {
        return false;
    }
    match status {
        FolderStatus::Draft
        | FolderStatus::RejectedCoordinator
        | FolderStatus::RejectedByConvener
        | FolderStatus::RejectedByHod => true,
        FolderStatus::ApprovedByHod => {
            !first_activity_completed || can_edit_for_final_submission
        }
        FolderStatus::Completed
        | FolderStatus::Submitted
        | FolderStatus::ApprovedCoordinator
        | FolderStatus::AssignedToConvener
        | FolderStatus::UnderAudit
        | FolderStatus::AuditCompleted
        | FolderStatus::SubmittedToHod => false,
    }
}

/// How a viewer is looking at a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// The owning faculty (or a coordinator acting as editor).
    Editor,
    CoordinatorReview,
    AuditReview,
    ConvenerReview,
    HodReview,
}

impl ViewMode {
    /// The review mode a role naturally views folders in.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Faculty | Role::Admin => Self::Editor,
            Role::Coordinator => Self::CoordinatorReview,
            Role::AuditMember => Self::AuditReview,
            Role::Convener => Self::ConvenerReview,
            Role::Hod => Self::HodReview,
        }
    }

    #[must_use]
    pub const fn is_review_only(self) -> bool {
        matches!(
            self,
            Self::AuditReview | Self::ConvenerReview | Self::HodReview
        )
    }
}

/// The explicit viewing context threaded through permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerContext {
    pub role: Role,
    pub mode: ViewMode,
}

impl ViewerContext {
    #[must_use]
    pub const fn new(role: Role, mode: ViewMode) -> Self {
        Self { role, mode }
    }

    #[must_use]
    pub const fn editor(role: Role) -> Self {
        Self::new(role, ViewMode::Editor)
    }

    /// Resolve the edit verdict for `folder`. `can_edit_for_final_submission`
    /// must already be recomputed for the current time.
    #[must_use]
    pub const fn can_edit(&self, folder: &CourseFolder) -> bool {
        can_edit(
            folder.status,
            folder.first_activity_completed,
            folder.can_edit_for_final_submission,
            matches!(self.mode, ViewMode::AuditReview),
            matches!(self.mode, ViewMode::ConvenerReview),
            matches!(self.mode, ViewMode::HodReview),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FolderStatus::Draft, true)]
    #[case(FolderStatus::RejectedCoordinator, true)]
    #[case(FolderStatus::RejectedByConvener, true)]
    #[case(FolderStatus::RejectedByHod, true)]
    #[case(FolderStatus::Submitted, false)]
    #[case(FolderStatus::ApprovedCoordinator, false)]
    #[case(FolderStatus::UnderAudit, false)]
    #[case(FolderStatus::AuditCompleted, false)]
    #[case(FolderStatus::SubmittedToHod, false)]
    #[case(FolderStatus::Completed, false)]
    fn editor_by_status(#[case] status: FolderStatus, #[case] expected: bool) {
        assert_eq!(can_edit(status, false, false, false, false, false), expected);
        assert_eq!(can_edit(status, true, true, false, false, false), expected);
    }

    #[rstest]
    #[case(false, false, true)]
    #[case(false, true, true)]
    #[case(true, true, true)]
    #[case(true, false, false)]
    fn approved_by_hod_windows(
        #[case] first_done: bool,
        #[case] final_open: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(
            can_edit(FolderStatus::ApprovedByHod, first_done, final_open, false, false, false),
            expected
        );
    }

    #[test]
    fn reviewer_flags_always_lock() {
        for status in FolderStatus::ALL {
            for bits in 0u8..64 {
                let first = bits & 1 != 0;
                let final_open = bits & 2 != 0;
                let audit = bits & 4 != 0;
                let convener = bits & 8 != 0;
                let hod = bits & 16 != 0;
                if audit || convener || hod {
                    assert!(!can_edit(status, first, final_open, audit, convener, hod));
                }
            }
        }
    }

    #[test]
    fn view_modes_for_roles() {
        assert_eq!(ViewMode::for_role(Role::Faculty), ViewMode::Editor);
        assert!(ViewMode::for_role(Role::Hod).is_review_only());
        assert!(!ViewMode::for_role(Role::Coordinator).is_review_only());
    }
}
