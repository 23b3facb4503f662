//! # cfms-config
//!
//! Layered configuration loading for the course folder pipeline using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CFMS_*` prefix, `__` as separator)
//! 2. Project-level `.cfms/config.toml`
//! 3. User-level `~/.config/cfms/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CFMS_DATABASE__PATH` -> `database.path`,
//! `CFMS_WORKFLOW__MAX_AUDITORS_PER_FOLDER` -> `workflow.max_auditors_per_folder`.
//!
//! # Usage
//!
//! ```no_run
//! use cfms_config::CfmsConfig;
//!
//! let config = CfmsConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod database;
mod error;
mod general;
mod workflow;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use workflow::WorkflowConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project directory holding the database, trail and project config.
pub const PROJECT_DIR: &str = ".cfms";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CfmsConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl CfmsConfig {
    /// Load configuration for the current directory.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with the project config taken from `root/.cfms`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is invalid.
    pub fn load_from(root: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_at(root).extract()?;
        config.workflow.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain for the current directory.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_at(Path::new("."))
    }

    /// Build the figment provider chain with the project layer under `root`.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment_at(root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = Self::project_config_path(root);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("CFMS_").split("__"))
    }

    #[must_use]
    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR).join("config.toml")
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cfms").join("config.toml"))
    }
}
