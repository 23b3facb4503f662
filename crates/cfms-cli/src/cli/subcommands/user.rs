use clap::Subcommand;

/// User commands.
#[derive(Clone, Debug, Subcommand)]
pub enum UserCommands {
    /// Create a user (admin only).
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Primary role (defaults to FACULTY).
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        audit_access: bool,
        #[arg(long)]
        coordinator_access: bool,
    },
    /// Get a user by ID.
    Get { id: String },
    /// List users.
    List {
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        department: Option<String>,
        /// Include deactivated accounts.
        #[arg(long)]
        all: bool,
    },
    /// Effective role set of a user (defaults to the acting user).
    Roles { id: Option<String> },
    /// Landing page for a user (defaults to the acting user).
    Landing { id: Option<String> },
    /// Set capability flags (admin only).
    Grant {
        id: String,
        #[arg(long)]
        audit_access: Option<bool>,
        #[arg(long)]
        coordinator_access: Option<bool>,
    },
    /// Deactivate or reactivate an account (admin only).
    Activate {
        id: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
    },
}
