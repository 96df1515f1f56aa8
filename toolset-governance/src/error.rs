//! Pipeline errors.

use thiserror::Error;
use toolset_migration::MigrationError;
use toolset_registry::RegistryError;
use toolset_validator::ValidationReport;

/// Result alias for pipeline operations.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Any failure of a governance operation.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Configuration could not be loaded or turned into components.
    #[error(transparent)]
    Config(#[from] toolset_config::ConfigError),

    /// The schema could not be loaded or compiled.
    #[error(transparent)]
    Validator(#[from] toolset_validator::ValidatorError),

    /// A source file could not be read.
    #[error(transparent)]
    Extractor(#[from] toolset_extractor::ExtractorError),

    /// The registry could not be read, written, or changed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The alias engine refused a request or its document failed.
    #[error(transparent)]
    Alias(#[from] toolset_aliases::AliasError),

    /// A migration guide could not be produced.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The registry must validate cleanly before the operation may proceed.
    #[error("registry is invalid: {} violation(s)", report.violations().len())]
    Invalid {
        /// The failing report.
        report: Box<ValidationReport>,
    },

    /// A toolset named by the request is not in the registry.
    #[error("unknown toolset `{id}`")]
    UnknownToolset {
        /// Requested identifier.
        id: String,
    },

    /// The operation needs capability sources and none are configured.
    #[error("no capability sources configured; pass --source or set paths.sources")]
    NoSources,
}

impl GovernanceError {
    /// Returns `true` when the request was refused on its merits, as opposed
    /// to an environmental or internal failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Alias(err) => err.is_rejection(),
            Self::Registry(err) => !matches!(err, RegistryError::Document(_)),
            Self::Migration(MigrationError::InvalidRequest { .. })
            | Self::Invalid { .. }
            | Self::UnknownToolset { .. } => true,
            _ => false,
        }
    }

    /// Returns the validation report behind a refusal, if any.
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Invalid { report } => Some(report),
            Self::Registry(err) => err.report(),
            _ => None,
        }
    }
}
