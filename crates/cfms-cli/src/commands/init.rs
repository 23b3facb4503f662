use std::path::PathBuf;

use anyhow::Context;
use cfms_config::{CfmsConfig, PROJECT_DIR};
use cfms_core::entities::UserAccount;
use cfms_core::enums::Role;
use cfms_db::repos::user::NewUser;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    project_root: String,
    database: String,
    admin: UserAccount,
    /// False when the admin already existed.
    created: bool,
}

/// Handle `cfms init`: create `.cfms/`, open the database and seed the first admin.
///
/// Safe to re-run: an existing admin with the same email is returned as is.
pub async fn handle(args: &InitArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = match args.path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let project_dir = root.join(PROJECT_DIR);
    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("failed to create {}", project_dir.display()))?;

    let config = CfmsConfig::load_from(&root).context("failed to load cfms configuration")?;
    let database = config.database.resolved_path(&root);
    let ctx = AppContext::init(root.clone(), config).await?;

    let (admin, created) = match ctx.service.find_user_by_email(&args.admin_email).await? {
        Some(existing) if existing.role == Role::Admin => (existing, false),
        Some(existing) => anyhow::bail!(
            "{} is already registered as {} (id {})",
            existing.email,
            existing.role,
            existing.id
        ),
        None => {
            let admin = ctx
                .service
                .create_user(&NewUser {
                    name: args.admin_name.clone(),
                    email: args.admin_email.clone(),
                    role: Some(Role::Admin),
                    department_id: None,
                    capabilities: Default::default(),
                })
                .await?;
            (admin, true)
        }
    };

    tracing::info!(root = %root.display(), admin = %admin.id, created, "cfms project initialized");

    output(
        &InitResponse {
            project_root: root.display().to_string(),
            database,
            admin,
            created,
        },
        flags.format,
    )
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::handle;
    use crate::cli::root_commands::InitArgs;
    use crate::cli::{ColorMode, GlobalFlags, OutputFormat};

    fn flags() -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Raw,
            limit: None,
            quiet: true,
            verbose: false,
            project: None,
            color: ColorMode::Never,
            acting_user: None,
        }
    }

    fn args(root: &TempDir, email: &str) -> InitArgs {
        InitArgs {
            admin_name: "Registrar".into(),
            admin_email: email.into(),
            path: Some(root.path().display().to_string()),
        }
    }

    #[tokio::test]
    async fn init_creates_project_and_is_rerunnable() {
        let root = TempDir::new().expect("tempdir should create");
        handle(&args(&root, "registrar@uni.test"), &flags())
            .await
            .expect("first init should succeed");
        assert!(root.path().join(".cfms").is_dir());
        assert!(root.path().join(".cfms/cfms.db").exists());

        handle(&args(&root, "registrar@uni.test"), &flags())
            .await
            .expect("re-running with the same admin should succeed");
    }
}
