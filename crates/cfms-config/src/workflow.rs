//! Workflow rule knobs.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_require_rejection_remarks() -> bool {
    true
}

const fn default_max_auditors() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Rejections at every stage must carry a non-empty reason.
    #[serde(default = "default_require_rejection_remarks")]
    pub require_rejection_remarks: bool,

    /// Upper bound on auditors assigned to one folder.
    #[serde(default = "default_max_auditors")]
    pub max_auditors_per_folder: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_rejection_remarks: default_require_rejection_remarks(),
            max_auditors_per_folder: default_max_auditors(),
        }
    }
}

impl WorkflowConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when no auditor could ever be assigned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_auditors_per_folder == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workflow.max_auditors_per_folder".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let config = WorkflowConfig::default();
        assert!(config.require_rejection_remarks);
        assert_eq!(config.max_auditors_per_folder, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_auditors_is_invalid() {
        let config = WorkflowConfig {
            max_auditors_per_folder: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
