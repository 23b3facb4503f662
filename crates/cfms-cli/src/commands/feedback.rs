use cfms_core::feedback::FeedbackStage;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::FeedbackCommands;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `cfms feedback`.
pub async fn handle(action: &FeedbackCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        FeedbackCommands::Set {
            id,
            stage,
            section,
            text,
            expected_version,
        } => {
            let actor = require_actor(flags)?;
            let stage = parse_enum::<FeedbackStage>(stage, "stage")?;
            let folder = ctx
                .service
                .save_feedback(id, actor, stage, section, text, *expected_version)
                .await?;
            output(&folder, flags.format)
        }
    }
}
