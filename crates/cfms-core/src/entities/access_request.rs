use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{AccessRequestStatus, Role};

/// A convener or HOD asking an admin for access to an approved folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderAccessRequest {
    pub id: String,
    pub folder_id: String,
    pub requested_by: String,
    pub requester_role: Role,
    pub status: AccessRequestStatus,
    pub admin_notes: Option<String>,
    pub resolved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
