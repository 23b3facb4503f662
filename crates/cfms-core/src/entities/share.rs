use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// An extra viewer role granted on a folder by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderShare {
    pub folder_id: String,
    pub role: Role,
    pub shared_by: String,
    pub created_at: DateTime<Utc>,
}
