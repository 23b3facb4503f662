use crate::cli::GlobalFlags;

/// The acting user from `--as` or `$CFMS_USER`.
pub fn require_actor(flags: &GlobalFlags) -> anyhow::Result<&str> {
    flags
        .acting_user
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow::anyhow!("no acting user: pass --as <USER_ID> or set CFMS_USER"))
}
