use clap::Subcommand;

/// Audit commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuditCommands {
    /// Assign the audit team (convener).
    Assign {
        id: String,
        /// Auditor user IDs.
        #[arg(long = "auditor", required = true)]
        auditors: Vec<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Withdraw the audit team (convener).
    Unassign {
        id: String,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Submit or revise the acting auditor's report.
    Report {
        id: String,
        /// approve | reject (omit to keep an earlier decision)
        #[arg(long)]
        decision: Option<String>,
        #[arg(long)]
        feedback: String,
        /// Ratings as key=value, repeatable.
        #[arg(long = "rating")]
        ratings: Vec<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Aggregate of every report on a folder.
    Summary { id: String },
    /// Assignments on a folder.
    Assignments { id: String },
    /// Folders assigned to the acting auditor.
    Queue,
}
