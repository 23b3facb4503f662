use clap::Subcommand;

/// Course folder commands.
#[derive(Clone, Debug, Subcommand)]
pub enum FolderCommands {
    /// Create a draft folder for a course allocation.
    Create {
        #[arg(long)]
        allocation: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        section: String,
        #[arg(long)]
        term: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        program: Option<String>,
        /// Owner faculty (defaults to the acting user).
        #[arg(long)]
        faculty: Option<String>,
    },
    /// Get a folder by ID.
    Get { id: String },
    /// List folders.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        faculty: Option<String>,
        #[arg(long)]
        term: Option<String>,
        #[arg(long)]
        department: Option<String>,
        /// Only folders awaiting a decision from this role.
        #[arg(long)]
        awaiting: Option<String>,
    },
    /// Submit (or resubmit) a folder.
    Submit {
        id: String,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Whether the acting user may edit a folder.
    CanEdit {
        id: String,
        /// View mode: editor, coordinator_review, audit_review, convener_review, hod_review
        #[arg(long)]
        mode: Option<String>,
    },
    /// Merge JSON content into the folder outline.
    Edit {
        id: String,
        /// JSON object to merge.
        #[arg(long)]
        content: String,
        /// Replace a single top-level section instead of merging.
        #[arg(long)]
        section: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Status history, oldest first.
    History { id: String },
    /// Feedback visible to the acting user.
    Feedback {
        id: String,
        /// Read as this role from the acting user's effective set.
        #[arg(long = "as-role")]
        as_role: Option<String>,
    },
    /// Rejection banner for a rejected folder.
    Banner { id: String },
    /// Folder counts per status.
    Counts {
        /// Count every department, not just the acting user's.
        #[arg(long)]
        all_departments: bool,
    },
    /// Deadline windows for a folder.
    Deadlines { id: String },
    /// JSONL trail operations recorded for a folder.
    Trail { id: String },
}
