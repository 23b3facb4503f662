use clap::Subcommand;

/// Stage decisions.
#[derive(Clone, Debug, Subcommand)]
pub enum ReviewCommands {
    /// Coordinator approves or rejects a submitted folder.
    Coordinator {
        id: String,
        /// approve | reject
        #[arg(long)]
        verdict: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Remarks shown to the faculty on rejection.
        #[arg(long)]
        remarks: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Convener forwards to the HOD or rejects after audit.
    Convener {
        id: String,
        /// forward_to_hod | reject
        #[arg(long)]
        decision: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// HOD final decision.
    Hod {
        id: String,
        /// approve | reject
        #[arg(long)]
        verdict: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long)]
        final_feedback: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
}
