use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{ColorMode, GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `cfms` binary.
#[derive(Debug, Parser)]
#[command(
    name = "cfms",
    version,
    about = "Course folder submission and approval pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root path (defaults to auto-detect via .cfms)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Table coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorMode,

    /// Act as this user id (defaults to $CFMS_USER)
    #[arg(long = "as", global = true, value_name = "USER_ID")]
    pub acting_user: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            project: self.project.clone(),
            color: self.color,
            acting_user: self
                .acting_user
                .clone()
                .or_else(|| std::env::var("CFMS_USER").ok().filter(|v| !v.trim().is_empty())),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::subcommands::{FolderCommands, ReviewCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "cfms", "--format", "table", "--limit", "10", "--as", "usr-1", "folder", "list",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.limit, Some(10));
        assert_eq!(cli.acting_user.as_deref(), Some("usr-1"));
        assert!(matches!(
            cli.command,
            Commands::Folder {
                action: FolderCommands::List { .. }
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["cfms", "folder", "get", "fld-1", "--format", "raw", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["cfms", "--format", "xml", "folder", "list"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn review_hod_takes_verdict_and_feedback() {
        let cli = Cli::try_parse_from([
            "cfms",
            "review",
            "hod",
            "fld-1",
            "--verdict",
            "reject",
            "--final-feedback",
            "missing lab manuals",
        ])
        .expect("cli should parse");
        match cli.command {
            Commands::Review {
                action: ReviewCommands::Hod {
                    final_feedback, ..
                },
            } => assert_eq!(final_feedback.as_deref(), Some("missing lab manuals")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
