use clap::Subcommand;

/// Access commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AccessCommands {
    /// Guard a route for the acting user (or anonymously).
    Check { path: String },
    /// Request read access to an approved folder.
    Request { folder: String },
    /// List access requests.
    Requests {
        /// pending | approved | rejected
        #[arg(long)]
        status: Option<String>,
    },
    /// Approve or reject a pending request (admin).
    Resolve {
        id: String,
        /// approve | reject
        #[arg(long)]
        verdict: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Share an approved folder with a role (admin).
    Share {
        folder: String,
        /// CONVENER | HOD
        #[arg(long)]
        role: String,
    },
    /// Shares recorded on a folder.
    Shares { folder: String },
}
