use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{CoordinatorDecision, FolderStatus};
use crate::feedback::FeedbackMap;

/// References needed to open a new folder for one course allocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewFolder {
    pub faculty_id: String,
    pub course_allocation_id: String,
    pub course_id: String,
    pub section: String,
    pub term_id: String,
    pub department_id: String,
    pub program_id: Option<String>,
}

/// The per-(faculty, course allocation) record moving through the pipeline.
///
/// `version` is the optimistic concurrency token: every committed mutation
/// increments it. `can_edit_for_final_submission` is derived from the
/// deadline gate on every read and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseFolder {
    pub id: String,
    pub faculty_id: String,
    pub course_allocation_id: String,
    pub course_id: String,
    pub section: String,
    pub term_id: String,
    pub department_id: String,
    pub program_id: Option<String>,
    pub status: FolderStatus,
    pub version: i64,
    pub first_activity_completed: bool,
    #[serde(default)]
    pub can_edit_for_final_submission: bool,
    pub submitted_at: Option<DateTime<Utc>>,

    pub coordinator_decision: Option<CoordinatorDecision>,
    pub coordinator_notes: Option<String>,
    pub coordinator_remarks: Option<String>,
    pub coordinator_reviewed_by: Option<String>,
    pub coordinator_reviewed_at: Option<DateTime<Utc>>,

    pub convener_assigned_by: Option<String>,
    pub convener_assigned_at: Option<DateTime<Utc>>,
    pub convener_notes: Option<String>,
    pub convener_reviewed_by: Option<String>,
    pub convener_reviewed_at: Option<DateTime<Utc>>,
    pub assigned_auditors: Vec<String>,

    pub hod_notes: Option<String>,
    pub hod_final_feedback: Option<String>,
    pub hod_reviewed_by: Option<String>,
    pub hod_reviewed_at: Option<DateTime<Utc>>,

    pub coordinator_feedback: FeedbackMap,
    pub audit_member_feedback: FeedbackMap,
    pub outline_content: serde_json::Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseFolder {
    /// A fresh `DRAFT` folder at version 1.
    #[must_use]
    pub fn new_draft(id: String, new: NewFolder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            faculty_id: new.faculty_id,
            course_allocation_id: new.course_allocation_id,
            course_id: new.course_id,
            section: new.section,
            term_id: new.term_id,
            department_id: new.department_id,
            program_id: new.program_id,
            status: FolderStatus::Draft,
            version: 1,
            first_activity_completed: false,
            can_edit_for_final_submission: false,
            submitted_at: None,
            coordinator_decision: None,
            coordinator_notes: None,
            coordinator_remarks: None,
            coordinator_reviewed_by: None,
            coordinator_reviewed_at: None,
            convener_assigned_by: None,
            convener_assigned_at: None,
            convener_notes: None,
            convener_reviewed_by: None,
            convener_reviewed_at: None,
            assigned_auditors: Vec::new(),
            hod_notes: None,
            hod_final_feedback: None,
            hod_reviewed_by: None,
            hod_reviewed_at: None,
            coordinator_feedback: FeedbackMap::new(),
            audit_member_feedback: FeedbackMap::new(),
            outline_content: serde_json::Value::Object(serde_json::Map::new()),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.faculty_id == user_id
    }

    #[must_use]
    pub fn is_assigned_auditor(&self, user_id: &str) -> bool {
        self.assigned_auditors.iter().any(|a| a == user_id)
    }
}
