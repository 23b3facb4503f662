use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::FolderStatus;

/// Append-only record of one committed status change.
///
/// Re-reviews overwrite the decision fields on the folder; this log keeps
/// every prior decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusHistoryEntry {
    pub id: String,
    pub folder_id: String,
    pub status: FolderStatus,
    pub changed_by: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
