mod edit;
mod list;

use cfms_core::entities::{NewFolder, StatusHistoryEntry};
use cfms_core::enums::Role;
use cfms_core::feedback::RejectionBanner;
use cfms_core::permissions::ViewMode;
use cfms_core::trail::TrailOperation;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::FolderCommands;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct HistoryResponse {
    folder_id: String,
    history: Vec<StatusHistoryEntry>,
}

#[derive(Debug, Serialize)]
struct TrailResponse {
    folder_id: String,
    operations: Vec<TrailOperation>,
}

#[derive(Debug, Serialize)]
struct BannerResponse {
    folder_id: String,
    banner: Option<RejectionBanner>,
}

/// Handle `cfms folder`.
pub async fn handle(action: &FolderCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        FolderCommands::Create {
            allocation,
            course,
            section,
            term,
            department,
            program,
            faculty,
        } => {
            let actor = require_actor(flags)?;
            let new = NewFolder {
                faculty_id: faculty.clone().unwrap_or_else(|| actor.to_string()),
                course_allocation_id: allocation.clone(),
                course_id: course.clone(),
                section: section.clone(),
                term_id: term.clone(),
                department_id: department.clone(),
                program_id: program.clone(),
            };
            output(&ctx.service.create_folder(actor, &new).await?, flags.format)
        }
        FolderCommands::Get { id } => {
            let viewer = require_actor(flags)?;
            output(&ctx.service.view_folder(id, viewer).await?, flags.format)
        }
        FolderCommands::List {
            status,
            faculty,
            term,
            department,
            awaiting,
        } => {
            let args = list::ListArgs {
                status: status.as_deref(),
                faculty: faculty.as_deref(),
                term: term.as_deref(),
                department: department.as_deref(),
                awaiting: awaiting.as_deref(),
            };
            list::run(&args, ctx, flags).await
        }
        FolderCommands::Submit { id, expected_version } => {
            let actor = require_actor(flags)?;
            output(
                &ctx.service.submit_folder(id, actor, *expected_version).await?,
                flags.format,
            )
        }
        FolderCommands::CanEdit { id, mode } => {
            let viewer = require_actor(flags)?;
            let mode = mode
                .as_deref()
                .map(|m| parse_enum::<ViewMode>(m, "mode"))
                .transpose()?;
            output(&ctx.service.can_edit_folder(id, viewer, mode).await?, flags.format)
        }
        FolderCommands::Edit {
            id,
            content,
            section,
            expected_version,
        } => edit::run(id, content, section.as_deref(), *expected_version, ctx, flags).await,
        FolderCommands::History { id } => {
            let viewer = require_actor(flags)?;
            let history = ctx.service.folder_history(id, viewer).await?;
            output(
                &HistoryResponse {
                    folder_id: id.clone(),
                    history,
                },
                flags.format,
            )
        }
        FolderCommands::Feedback { id, as_role } => {
            let viewer = require_actor(flags)?;
            let as_role = as_role
                .as_deref()
                .map(|r| parse_enum::<Role>(r, "role"))
                .transpose()?;
            output(&ctx.service.folder_feedback(id, viewer, as_role).await?, flags.format)
        }
        FolderCommands::Banner { id } => {
            let viewer = require_actor(flags)?;
            let banner = ctx.service.folder_banner(id, viewer).await?;
            output(
                &BannerResponse {
                    folder_id: id.clone(),
                    banner,
                },
                flags.format,
            )
        }
        FolderCommands::Counts { all_departments } => {
            let actor = require_actor(flags)?;
            output(&ctx.service.status_counts(actor, *all_departments).await?, flags.format)
        }
        FolderCommands::Deadlines { id } => {
            output(&ctx.service.folder_deadline_status(id).await?, flags.format)
        }
        FolderCommands::Trail { id } => {
            let viewer = require_actor(flags)?;
            let operations = ctx.service.folder_trail(id, viewer).await?;
            output(
                &TrailResponse {
                    folder_id: id.clone(),
                    operations,
                },
                flags.format,
            )
        }
    }
}
