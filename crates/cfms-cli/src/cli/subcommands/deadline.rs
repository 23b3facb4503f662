use clap::Subcommand;

/// Deadline commands.
#[derive(Clone, Debug, Subcommand)]
pub enum DeadlineCommands {
    /// Create or move a deadline.
    Set {
        /// first_submission | final_submission
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        term: String,
        /// Omit for a term-wide deadline.
        #[arg(long)]
        department: Option<String>,
        /// RFC 3339 timestamp.
        #[arg(long)]
        at: String,
    },
    /// List deadlines.
    List {
        #[arg(long)]
        term: Option<String>,
    },
    /// Effective deadlines and open windows for a term and department.
    Status {
        #[arg(long)]
        term: String,
        #[arg(long)]
        department: String,
    },
    /// Delete a deadline.
    Delete { id: String },
}
