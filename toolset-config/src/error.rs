//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while assembling a [`crate::GovernanceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file `{}` not found", path.display())]
    MissingFile {
        /// Requested path.
        path: PathBuf,
    },

    /// A provider produced values that do not fit the configuration shape.
    #[error("failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// The merged configuration is unusable.
    #[error("invalid configuration value `{key}`: {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The extractor rejected the configured scanner or rules.
    #[error(transparent)]
    Extractor(#[from] toolset_extractor::ExtractorError),
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
