//! Response types returned as JSON by `cfms` commands.

use serde::{Deserialize, Serialize};

use crate::access::{EffectiveRoleSet, RouteDecision};
use crate::entities::{AuditAssignment, CourseFolder, FolderShare};
use crate::enums::{FolderStatus, Role};
use crate::lifecycle::TransitionRecord;

/// Response from any status-changing command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionResponse {
    pub folder: CourseFolder,
    pub transition: TransitionRecord,
    /// True when the command was accepted but changed nothing.
    pub unchanged: bool,
}

/// Response from `cfms audit report`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditReportResponse {
    pub assignment: AuditAssignment,
    pub folder_status: FolderStatus,
    /// Folder version after the report; every report moves it.
    pub folder_version: i64,
    pub submitted: usize,
    pub total: usize,
}

/// Response from `cfms folder can-edit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditCheckResponse {
    pub folder_id: String,
    pub status: FolderStatus,
    pub first_activity_completed: bool,
    pub can_edit_for_final_submission: bool,
    pub can_edit: bool,
}

/// Response from `cfms user roles`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolesResponse {
    pub user_id: String,
    pub primary: Role,
    pub effective: EffectiveRoleSet,
    pub landing: String,
}

/// Response from `cfms access check`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteCheckResponse {
    pub path: String,
    pub decision: RouteDecision,
}

/// Response from `cfms access share`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShareResponse {
    pub share: FolderShare,
    pub notified: Vec<String>,
}

/// One row of `cfms folder counts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: FolderStatus,
    pub count: u64,
}
