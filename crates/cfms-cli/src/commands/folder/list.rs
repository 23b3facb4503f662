use cfms_core::entities::CourseFolder;
use cfms_core::enums::{FolderStatus, Role};
use cfms_db::repos::folder::FolderFilter;
use cfms_db::service::FolderService;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct FolderListResponse {
    folders: Vec<CourseFolder>,
}

pub struct ListArgs<'a> {
    pub status: Option<&'a str>,
    pub faculty: Option<&'a str>,
    pub term: Option<&'a str>,
    pub department: Option<&'a str>,
    pub awaiting: Option<&'a str>,
}

pub async fn run(args: &ListArgs<'_>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let viewer = require_actor(flags)?;
    let limit = effective_limit(flags.limit, ctx.config.general.default_limit);
    let awaiting = args
        .awaiting
        .map(|r| parse_enum::<Role>(r, "awaiting"))
        .transpose()?;

    let filter = FolderFilter {
        status: args
            .status
            .map(|s| parse_enum::<FolderStatus>(s, "status"))
            .transpose()?,
        faculty_id: args.faculty.map(str::to_string),
        term_id: args.term.map(str::to_string),
        department_id: args.department.map(str::to_string),
        limit: Some(compute_fetch_limit(limit, awaiting.is_some())),
    };

    let mut folders = ctx.service.visible_folders(viewer, &filter).await?;
    if let Some(role) = awaiting {
        folders = filter_awaiting(folders, role);
    }
    folders.truncate(usize::try_from(limit)?);

    output(&FolderListResponse { folders }, flags.format)
}

/// Post-filters need a wider fetch to still fill the page.
fn compute_fetch_limit(limit: u32, post_filtered: bool) -> u32 {
    if post_filtered {
        limit.saturating_mul(5).min(500)
    } else {
        limit
    }
}

fn filter_awaiting(mut folders: Vec<CourseFolder>, role: Role) -> Vec<CourseFolder> {
    folders.retain(|folder| FolderService::awaiting(folder, role));
    folders
}
