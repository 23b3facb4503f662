//! JSONL decision trail envelope.
//!
//! Every committed mutation on a folder is appended as a `TrailOperation`
//! to `{trail_dir}/{folder_id}.jsonl`. The trail is append-only, so prior
//! decisions survive re-reviews that overwrite fields on the folder row.
//!
//! Old trail lines without a `v` field deserialize with `v == 1`.

use serde::{Deserialize, Serialize};

use crate::enums::{EntityType, TrailOp};

const fn default_trail_version() -> u32 {
    1
}

/// A single operation recorded in the JSONL trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrailOperation {
    /// Schema version. Defaults to 1 for lines without this field.
    #[serde(default = "default_trail_version")]
    pub v: u32,

    /// RFC 3339 timestamp of the operation.
    pub ts: String,

    /// Folder the operation belongs to (also the trail file name).
    pub folder: String,

    pub op: TrailOp,
    pub entity: EntityType,

    /// ID of the affected entity.
    pub id: String,

    /// User who performed the operation.
    pub actor: String,

    /// Payload. Full entity for `create`, the transition record for
    /// `transition`, changed fields for `update`.
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_version_defaults_to_one() {
        let json = r#"{"ts":"2026-10-01T00:00:00Z","folder":"fld-1","op":"transition","entity":"folder","id":"fld-1","actor":"usr-1","data":{}}"#;
        let op: TrailOperation = serde_json::from_str(json).unwrap();
        assert_eq!(op.v, 1);
        assert_eq!(op.op, TrailOp::Transition);
    }

    #[test]
    fn explicit_version_is_kept() {
        let op = TrailOperation {
            v: 2,
            ts: "2026-10-01T00:00:00Z".into(),
            folder: "fld-1".into(),
            op: TrailOp::Update,
            entity: EntityType::Feedback,
            id: "fld-1".into(),
            actor: "usr-1".into(),
            data: serde_json::json!({"section": "COURSE_LOG"}),
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"v\":2"));
        assert!(json.contains("\"entity\":\"feedback\""));
    }
}
