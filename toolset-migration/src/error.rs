//! Error types for migration artifact generation.

use thiserror::Error;

/// Result alias for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Errors emitted while generating migration artifacts.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A template placeholder had no value.
    #[error("missing template variable: {name}")]
    MissingVariable {
        /// Placeholder name.
        name: String,
    },

    /// The guide request is not meaningful.
    #[error("invalid migration request: {reason}")]
    InvalidRequest {
        /// Human-readable explanation.
        reason: String,
    },

    /// Writing the guide failed.
    #[error(transparent)]
    Document(#[from] toolset_primitives::Error),
}
