//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("failed to load cfms configuration: {0}")]
    Figment(#[from] figment::Error),

    /// A configuration field has an invalid value.
    #[error("invalid value for '{field}' in cfms configuration: {reason}")]
    InvalidValue { field: String, reason: String },
}
