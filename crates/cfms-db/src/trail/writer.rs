//! JSONL trail writer.
//!
//! Appends `TrailOperation` records to per-folder `.cfms/trail/{folder_id}.jsonl`
//! files. Uses `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::{Path, PathBuf};

use cfms_core::trail::TrailOperation;

use crate::error::DatabaseError;

/// Appends trail operations to per-folder JSONL files.
///
/// `FolderService` calls `append()` after the database transaction commits,
/// so a refused mutation never reaches the trail.
pub struct TrailWriter {
    trail_dir: PathBuf,
    enabled: bool,
}

impl TrailWriter {
    /// Create a new `TrailWriter` pointing at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(trail_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self {
            trail_dir,
            enabled: true,
        })
    }

    /// Create a disabled writer.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            trail_dir: PathBuf::new(),
            enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append a trail operation to the folder's JSONL file.
    ///
    /// File path: `{trail_dir}/{op.folder}.jsonl`
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file write fails.
    pub fn append(&self, op: &TrailOperation) -> Result<(), DatabaseError> {
        if !self.enabled {
            return Ok(());
        }

        let path = self.trail_dir.join(format!("{}.jsonl", op.folder));
        serde_jsonlines::append_json_lines(&path, [op])
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(())
    }

    /// Read back every operation recorded for one folder, oldest first.
    ///
    /// A missing file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file exists but cannot be parsed.
    pub fn read_folder(&self, folder_id: &str) -> Result<Vec<TrailOperation>, DatabaseError> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        let path = self.trail_dir.join(format!("{folder_id}.jsonl"));
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)
            .map_err(|e| DatabaseError::Other(e.into()))?
            .collect::<std::io::Result<Vec<TrailOperation>>>()
            .map_err(|e| DatabaseError::Other(e.into()))
    }

    /// The directory where trail files are stored.
    #[must_use]
    pub fn trail_dir(&self) -> &Path {
        &self.trail_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfms_core::enums::{EntityType, TrailOp};
    use tempfile::TempDir;

    fn op(folder: &str, n: u32) -> TrailOperation {
        TrailOperation {
            v: 1,
            ts: "2026-10-19T09:00:00+00:00".into(),
            folder: folder.into(),
            op: TrailOp::Transition,
            entity: EntityType::Folder,
            id: folder.into(),
            actor: "usr-1".into(),
            data: serde_json::json!({ "n": n }),
        }
    }

    #[test]
    fn appends_per_folder_files() {
        let dir = TempDir::new().unwrap();
        let writer = TrailWriter::new(dir.path().join("trail")).unwrap();
        writer.append(&op("fld-a", 1)).unwrap();
        writer.append(&op("fld-a", 2)).unwrap();
        writer.append(&op("fld-b", 3)).unwrap();

        let a = writer.read_folder("fld-a").unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[1].data["n"], 2);
        assert_eq!(writer.read_folder("fld-b").unwrap().len(), 1);
        assert!(writer.read_folder("fld-c").unwrap().is_empty());
    }

    #[test]
    fn disabled_writer_is_a_noop() {
        let writer = TrailWriter::disabled();
        assert!(!writer.is_enabled());
        writer.append(&op("fld-a", 1)).unwrap();
        assert!(writer.read_folder("fld-a").unwrap().is_empty());
    }
}
