use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::CapabilityFlags;
use crate::enums::Role;

/// A user account with exactly one primary role and optional capability flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department_id: Option<String>,
    pub has_audit_access: bool,
    pub has_coordinator_access: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    #[must_use]
    pub const fn capabilities(&self) -> CapabilityFlags {
        CapabilityFlags {
            has_audit_access: self.has_audit_access,
            has_coordinator_access: self.has_coordinator_access,
        }
    }
}
