//! Cross-cutting error types for the folder pipeline.
//!
//! Persistence errors (`DatabaseError`) and configuration errors
//! (`ConfigError`) live in their own crates. The binary converges all of
//! them through `anyhow`.

use thiserror::Error;

use crate::enums::{FolderStatus, Role};
use crate::lifecycle::FolderAction;

/// A status machine move that was refused. The folder is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The acting role does not own the stage that performs `action`.
    #[error("{role} may not {action} a folder in {status}")]
    IllegalForRole {
        action: FolderAction,
        role: Role,
        status: FolderStatus,
    },

    /// The action is not legal from the current status for any role.
    #[error("cannot {action} a folder in {status}")]
    IllegalFromStatus {
        action: FolderAction,
        status: FolderStatus,
    },

    /// A different auditor set is already reviewing the folder.
    #[error("auditors are already mid-review; unassign them before assigning a different team")]
    AuditorsMidReview,
}

/// Errors that can be raised by any crate in the pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Wrong role or wrong source status for a status change.
    #[error("Illegal transition: {0}")]
    IllegalTransition(#[from] TransitionError),

    /// The caller may not perform this action on this folder right now.
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    /// Data failed validation (missing remarks, empty lists, bad keys).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The folder changed between read and write.
    #[error(
        "Concurrency conflict on folder {folder_id}: expected version {expected_version}, found {actual_version}"
    )]
    ConcurrencyConflict {
        folder_id: String,
        expected_version: i64,
        actual_version: i64,
    },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }
}
