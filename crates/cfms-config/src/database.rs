//! Local libSQL database and decision trail locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".cfms/cfms.db".to_string()
}

fn default_trail_dir() -> String {
    ".cfms/trail".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database file, relative to the project root unless absolute.
    /// `:memory:` keeps everything in memory.
    #[serde(default = "default_path")]
    pub path: String,

    /// Directory for per-folder JSONL trail files. Empty disables the trail.
    #[serde(default = "default_trail_dir")]
    pub trail_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            trail_dir: default_trail_dir(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// Database path resolved against `root`. `:memory:` passes through.
    #[must_use]
    pub fn resolved_path(&self, root: &Path) -> String {
        if self.is_in_memory() {
            return self.path.clone();
        }
        let path = Path::new(&self.path);
        if path.is_absolute() {
            self.path.clone()
        } else {
            root.join(path).to_string_lossy().into_owned()
        }
    }

    /// Trail directory resolved against `root`, or `None` when disabled.
    #[must_use]
    pub fn resolved_trail_dir(&self, root: &Path) -> Option<PathBuf> {
        if self.trail_dir.trim().is_empty() {
            return None;
        }
        let dir = Path::new(&self.trail_dir);
        Some(if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        })
    }
}
