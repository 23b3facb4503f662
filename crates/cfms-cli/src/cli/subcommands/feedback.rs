use clap::Subcommand;

/// Feedback commands.
#[derive(Clone, Debug, Subcommand)]
pub enum FeedbackCommands {
    /// Write one section remark.
    Set {
        id: String,
        /// coordinator | audit_member
        #[arg(long)]
        stage: String,
        /// Section key, e.g. COURSE_OUTLINE, outline, ASSIGNMENT_2_SOLUTION
        #[arg(long)]
        section: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        expected_version: Option<i64>,
    },
}
