//! Entity structs for every stored object in the pipeline.
//!
//! Each entity maps to a table in the libSQL database (see
//! `cfms-db/migrations/001_initial.sql`). All structs derive `Serialize` and
//! `Deserialize` for JSON output and trail records.

mod access_request;
mod audit_assignment;
mod deadline;
mod folder;
mod history;
mod share;
mod user;

pub use access_request::FolderAccessRequest;
pub use audit_assignment::AuditAssignment;
pub use deadline::FolderDeadline;
pub use folder::{CourseFolder, NewFolder};
pub use history::StatusHistoryEntry;
pub use share::FolderShare;
pub use user::UserAccount;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};

    use super::{CourseFolder, NewFolder};

    pub fn draft_folder() -> CourseFolder {
        CourseFolder::new_draft(
            "fld-00000001".into(),
            NewFolder {
                faculty_id: "usr-faculty".into(),
                course_allocation_id: "alloc-1".into(),
                course_id: "CS101".into(),
                section: "A".into(),
                term_id: "fall-2026".into(),
                department_id: "cs".into(),
                program_id: Some("bscs".into()),
            },
            Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap(),
        )
    }
}
