use cfms_core::entities::{FolderAccessRequest, FolderShare};
use cfms_core::enums::{AccessRequestStatus, Role, Verdict};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AccessCommands;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct RequestListResponse {
    requests: Vec<FolderAccessRequest>,
}

#[derive(Debug, Serialize)]
struct ShareListResponse {
    shares: Vec<FolderShare>,
    /// Whether the acting user holds a share or an approved request.
    #[serde(skip_serializing_if = "Option::is_none")]
    viewer_granted: Option<bool>,
}

/// Handle `cfms access`.
pub async fn handle(action: &AccessCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        // Anonymous checks are allowed: no acting user means "not logged in".
        AccessCommands::Check { path } => output(
            &ctx.service.check_route(flags.acting_user.as_deref(), path).await?,
            flags.format,
        ),
        AccessCommands::Request { folder } => {
            let actor = require_actor(flags)?;
            output(&ctx.service.request_access(folder, actor).await?, flags.format)
        }
        AccessCommands::Requests { status } => {
            let actor = require_actor(flags)?;
            let status = status
                .as_deref()
                .map(|s| parse_enum::<AccessRequestStatus>(s, "status"))
                .transpose()?;
            let requests = ctx.service.list_access_requests(actor, status).await?;
            output(&RequestListResponse { requests }, flags.format)
        }
        AccessCommands::Resolve { id, verdict, notes } => {
            let actor = require_actor(flags)?;
            let verdict = parse_enum::<Verdict>(verdict, "verdict")?;
            output(&ctx.service.resolve_access(id, actor, verdict, notes).await?, flags.format)
        }
        AccessCommands::Share { folder, role } => {
            let actor = require_actor(flags)?;
            let role = parse_enum::<Role>(role, "role")?;
            output(&ctx.service.share_with_role(folder, actor, role).await?, flags.format)
        }
        AccessCommands::Shares { folder } => {
            let shares = ctx.service.list_shares(folder).await?;
            let viewer_granted = match flags.acting_user.as_deref() {
                Some(user) => Some(ctx.service.has_viewer_grant(folder, user).await?),
                None => None,
            };
            output(
                &ShareListResponse {
                    shares,
                    viewer_granted,
                },
                flags.format,
            )
        }
    }
}
