use cfms_core::enums::{ConvenerDecision, Verdict};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ReviewCommands;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `cfms review`.
pub async fn handle(action: &ReviewCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = require_actor(flags)?;
    let response = match action {
        ReviewCommands::Coordinator {
            id,
            verdict,
            notes,
            remarks,
            expected_version,
        } => {
            let verdict = parse_enum::<Verdict>(verdict, "verdict")?;
            ctx.service
                .coordinator_review(id, actor, verdict, notes, remarks.as_deref(), *expected_version)
                .await?
        }
        ReviewCommands::Convener {
            id,
            decision,
            notes,
            expected_version,
        } => {
            let decision = parse_enum::<ConvenerDecision>(decision, "decision")?;
            ctx.service
                .convener_review(id, actor, decision, notes, *expected_version)
                .await?
        }
        ReviewCommands::Hod {
            id,
            verdict,
            notes,
            final_feedback,
            expected_version,
        } => {
            let verdict = parse_enum::<Verdict>(verdict, "verdict")?;
            ctx.service
                .hod_decide(id, actor, verdict, notes, final_feedback.as_deref(), *expected_version)
                .await?
        }
    };
    if response.unchanged {
        tracing::info!(folder = %response.folder.id, "decision accepted without a status change");
    }
    output(&response, flags.format)
}
