use cfms_core::deadline::DeadlineGate;
use cfms_core::entities::FolderDeadline;
use cfms_core::enums::DeadlineKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::DeadlineCommands;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::parse::{parse_enum, parse_timestamp};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DeadlineListResponse {
    deadlines: Vec<FolderDeadline>,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    id: String,
    deleted: bool,
}

/// Windows for a term and department, before any folder is involved.
#[derive(Debug, Serialize)]
struct WindowResponse {
    term_id: String,
    department_id: String,
    gate: DeadlineGate,
    first_window_open: bool,
    /// Final window as seen by a folder whose first activity is complete.
    final_window_open: bool,
    evaluated_at: DateTime<Utc>,
}

/// Handle `cfms deadline`.
pub async fn handle(action: &DeadlineCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        DeadlineCommands::Set {
            kind,
            term,
            department,
            at,
        } => {
            let actor = require_actor(flags)?;
            let kind = parse_enum::<DeadlineKind>(kind, "type")?;
            let at = parse_timestamp(at)?;
            let deadline = ctx
                .service
                .set_deadline(actor, kind, term, department.as_deref(), at)
                .await?;
            output(&deadline, flags.format)
        }
        DeadlineCommands::List { term } => {
            let deadlines = ctx.service.list_deadlines(term.as_deref()).await?;
            output(&DeadlineListResponse { deadlines }, flags.format)
        }
        DeadlineCommands::Status { term, department } => {
            let gate = ctx.service.deadline_gate(term, department).await?;
            let now = Utc::now();
            output(
                &WindowResponse {
                    term_id: term.clone(),
                    department_id: department.clone(),
                    first_window_open: gate.first_window_open(now),
                    final_window_open: gate.final_window_open(true, now),
                    gate,
                    evaluated_at: now,
                },
                flags.format,
            )
        }
        DeadlineCommands::Delete { id } => {
            let actor = require_actor(flags)?;
            ctx.service.delete_deadline(actor, id).await?;
            output(
                &DeletedResponse {
                    id: id.clone(),
                    deleted: true,
                },
                flags.format,
            )
        }
    }
}
