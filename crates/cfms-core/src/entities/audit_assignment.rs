use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::AuditDecision;

/// One auditor assigned to one folder, with their report once submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditAssignment {
    pub folder_id: String,
    pub auditor_id: String,
    pub decision: AuditDecision,
    pub overall_feedback: Option<String>,
    pub ratings: BTreeMap<String, f64>,
    pub assigned_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl AuditAssignment {
    #[must_use]
    pub const fn has_reported(&self) -> bool {
        self.submitted_at.is_some()
    }
}
