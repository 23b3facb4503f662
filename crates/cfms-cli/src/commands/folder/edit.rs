use cfms_db::repos::folder::OutlinePatch;
use serde_json::Value;

use crate::cli::GlobalFlags;
use crate::commands::shared::actor::require_actor;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    id: &str,
    content: &str,
    section: Option<&str>,
    expected_version: Option<i64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let actor = require_actor(flags)?;
    let patch = build_patch(content, section)?;
    let folder = ctx
        .service
        .update_outline(id, actor, patch, expected_version)
        .await?;
    output(&folder, flags.format)
}

/// A section replacement takes any JSON value; a merge needs an object.
fn build_patch(content: &str, section: Option<&str>) -> anyhow::Result<OutlinePatch> {
    let value: Value = serde_json::from_str(content)
        .map_err(|error| anyhow::anyhow!("--content is not valid JSON: {error}"))?;
    if section.is_none() && !value.is_object() {
        anyhow::bail!("--content must be a JSON object unless --section is given");
    }
    Ok(OutlinePatch {
        section: section.map(str::to_string),
        content: value,
    })
}
