//! Error types for tool extraction.

use thiserror::Error;

/// Result alias for extractor operations.
pub type ExtractorResult<T> = Result<T, ExtractorError>;

/// Errors produced while configuring or running the extractor.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// A grouping rule could not be constructed.
    #[error("invalid grouping rule for bucket `{bucket}`: {reason}")]
    InvalidRule {
        /// Bucket the rule would populate.
        bucket: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The execution-context type name is unusable.
    #[error("invalid context type `{name}`: must be a plain identifier")]
    InvalidContextType {
        /// The rejected type name.
        name: String,
    },

    /// A source file could not be read.
    #[error(transparent)]
    Source(#[from] toolset_primitives::Error),
}
