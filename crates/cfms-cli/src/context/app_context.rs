use std::path::PathBuf;

use anyhow::Context;
use cfms_config::CfmsConfig;
use cfms_db::service::FolderService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: FolderService,
    pub config: CfmsConfig,
}

impl AppContext {
    /// Open the project database and trail using the discovered project root.
    pub async fn init(project_root: PathBuf, config: CfmsConfig) -> anyhow::Result<Self> {
        let db_path = config.database.resolved_path(&project_root);
        let trail_dir = config.database.resolved_trail_dir(&project_root);

        tracing::debug!(db = %db_path, trail = ?trail_dir, "opening cfms service");

        let service = FolderService::new_local(&db_path, trail_dir)
            .await
            .with_context(|| format!("failed to open cfms database at {db_path}"))?
            .with_workflow(config.workflow.clone());

        Ok(Self { service, config })
    }
}
