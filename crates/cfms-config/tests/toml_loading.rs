//! Integration tests for TOML configuration loading and env overrides.
//!
//! Uses `figment::Jail` for sandboxed cwd and env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use std::path::Path;

use cfms_config::{CfmsConfig, ConfigError};

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "/var/lib/cfms/cfms.db"
trail_dir = ""

[workflow]
require_rejection_remarks = false
max_auditors_per_folder = 3

[general]
default_limit = 50
"#,
        )?;

        let config: CfmsConfig = Figment::from(Serialized::defaults(CfmsConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.database.path, "/var/lib/cfms/cfms.db");
        assert_eq!(config.database.resolved_trail_dir(Path::new("/x")), None);
        assert!(!config.workflow.require_rejection_remarks);
        assert_eq!(config.workflow.max_auditors_per_folder, 3);
        assert_eq!(config.general.default_limit, 50);
        Ok(())
    });
}

#[test]
fn partial_toml_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[general]\ndefault_limit = 5\n")?;
        let config: CfmsConfig = Figment::from(Serialized::defaults(CfmsConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;
        assert_eq!(config.general.default_limit, 5);
        assert_eq!(config.database.trail_dir, ".cfms/trail");
        assert!(config.workflow.require_rejection_remarks);
        Ok(())
    });
}

#[test]
fn project_config_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".cfms")?;
        jail.create_file(
            ".cfms/config.toml",
            "[workflow]\nmax_auditors_per_folder = 2\n",
        )?;
        let config = CfmsConfig::load().expect("config loads");
        assert_eq!(config.workflow.max_auditors_per_folder, 2);
        Ok(())
    });
}

#[test]
fn env_beats_project_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".cfms")?;
        jail.create_file(".cfms/config.toml", "[general]\ndefault_limit = 7\n")?;
        jail.set_env("CFMS_GENERAL__DEFAULT_LIMIT", "9");
        jail.set_env("CFMS_DATABASE__PATH", ":memory:");
        let config = CfmsConfig::load().expect("config loads");
        assert_eq!(config.general.default_limit, 9);
        assert!(config.database.is_in_memory());
        Ok(())
    });
}

#[test]
fn load_from_other_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join(".cfms")).expect("mkdir");
    std::fs::write(
        CfmsConfig::project_config_path(dir.path()),
        "[database]\npath = \"custom.db\"\n",
    )
    .expect("write config");

    Jail::expect_with(|_jail| {
        let config = CfmsConfig::load_from(dir.path()).expect("config loads");
        assert_eq!(
            config.database.resolved_path(dir.path()),
            dir.path().join("custom.db").to_string_lossy()
        );
        Ok(())
    });
}

#[test]
fn invalid_workflow_value_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("CFMS_WORKFLOW__MAX_AUDITORS_PER_FOLDER", "0");
        let err = CfmsConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}
