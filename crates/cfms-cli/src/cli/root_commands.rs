use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    AccessCommands, AuditCommands, DeadlineCommands, FeedbackCommands, FolderCommands,
    ReviewCommands, UserCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Initialize a cfms project and its first admin.
    Init(InitArgs),
    /// Users, roles and capability grants.
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Course folders.
    Folder {
        #[command(subcommand)]
        action: FolderCommands,
    },
    /// Coordinator, convener and HOD decisions.
    Review {
        #[command(subcommand)]
        action: ReviewCommands,
    },
    /// Audit team assignment and reports.
    Audit {
        #[command(subcommand)]
        action: AuditCommands,
    },
    /// Per-section reviewer feedback.
    Feedback {
        #[command(subcommand)]
        action: FeedbackCommands,
    },
    /// Submission deadlines.
    Deadline {
        #[command(subcommand)]
        action: DeadlineCommands,
    },
    /// Route checks, access requests and shares.
    Access {
        #[command(subcommand)]
        action: AccessCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Name of the first admin account.
    #[arg(long)]
    pub admin_name: String,
    /// Email of the first admin account.
    #[arg(long)]
    pub admin_email: String,
    /// Directory to initialize (defaults to the current directory).
    #[arg(long)]
    pub path: Option<String>,
}
