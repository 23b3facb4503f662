use cfms_core::access::CapabilityFlags;
use cfms_core::entities::UserAccount;
use cfms_core::enums::Role;
use cfms_db::repos::user::{NewUser, UserFilter};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::UserCommands;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct UserListResponse {
    users: Vec<UserAccount>,
}

#[derive(Debug, Serialize)]
struct LandingResponse {
    user_id: String,
    landing: String,
}

/// Handle `cfms user`.
pub async fn handle(action: &UserCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        UserCommands::Add {
            name,
            email,
            role,
            department,
            audit_access,
            coordinator_access,
        } => {
            let admin = require_actor(flags)?;
            ctx.service.require_role(admin, Role::Admin).await?;
            let role = role.as_deref().map(|r| parse_enum::<Role>(r, "role")).transpose()?;
            let user = ctx
                .service
                .create_user(&NewUser {
                    name: name.clone(),
                    email: email.clone(),
                    role,
                    department_id: department.clone(),
                    capabilities: CapabilityFlags {
                        has_audit_access: *audit_access,
                        has_coordinator_access: *coordinator_access,
                    },
                })
                .await?;
            output(&user, flags.format)
        }
        UserCommands::Get { id } => output(&ctx.service.get_user(id).await?, flags.format),
        UserCommands::List {
            role,
            department,
            all,
        } => {
            let filter = UserFilter {
                role: role.as_deref().map(|r| parse_enum::<Role>(r, "role")).transpose()?,
                department_id: department.clone(),
                active_only: !all,
                limit: Some(effective_limit(flags.limit, ctx.config.general.default_limit)),
            };
            let users = ctx.service.list_users(&filter).await?;
            output(&UserListResponse { users }, flags.format)
        }
        UserCommands::Roles { id } => {
            let id = subject(id.as_deref(), flags)?;
            output(&ctx.service.user_roles(id).await?, flags.format)
        }
        UserCommands::Landing { id } => {
            let id = subject(id.as_deref(), flags)?;
            let roles = ctx.service.user_roles(id).await?;
            output(
                &LandingResponse {
                    user_id: roles.user_id,
                    landing: roles.landing,
                },
                flags.format,
            )
        }
        UserCommands::Grant {
            id,
            audit_access,
            coordinator_access,
        } => {
            let admin = require_actor(flags)?;
            let current = ctx.service.get_user(id).await?;
            let merged = CapabilityFlags {
                has_audit_access: audit_access.unwrap_or(current.has_audit_access),
                has_coordinator_access: coordinator_access.unwrap_or(current.has_coordinator_access),
            };
            output(&ctx.service.set_capabilities(admin, id, merged).await?, flags.format)
        }
        UserCommands::Activate { id, active } => {
            let admin = require_actor(flags)?;
            output(&ctx.service.set_user_active(admin, id, *active).await?, flags.format)
        }
    }
}

/// Explicit user id, else the acting user.
fn subject<'a>(explicit: Option<&'a str>, flags: &'a GlobalFlags) -> anyhow::Result<&'a str> {
    match explicit {
        Some(id) => Ok(id),
        None => require_actor(flags),
    }
}
