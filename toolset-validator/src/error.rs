//! Error types for the validator.

use thiserror::Error;

/// Result alias for validator construction.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Failures preparing a validator. Violations found while validating are
/// reported in a [`crate::ValidationReport`], never as errors.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The structural schema document could not be compiled.
    #[error("invalid toolset schema ({origin}): {reason}")]
    Schema {
        /// Schema file path, or `embedded`.
        origin: String,
        /// Compiler message.
        reason: String,
    },

    /// The schema file could not be read.
    #[error(transparent)]
    Document(#[from] toolset_primitives::Error),
}
