use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::DeadlineKind;

/// A term-scoped submission deadline, optionally narrowed to one department.
///
/// A row with `department_id == None` applies term-wide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderDeadline {
    pub id: String,
    pub kind: DeadlineKind,
    pub term_id: String,
    pub department_id: Option<String>,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FolderDeadline {
    /// Derived, never stored.
    #[must_use]
    pub fn is_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }
}
