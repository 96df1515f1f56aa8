//! Error types for the alias engine.

use thiserror::Error;

/// Result alias for alias operations.
pub type AliasResult<T> = Result<T, AliasError>;

/// Errors emitted by the alias engine.
#[derive(Debug, Error)]
pub enum AliasError {
    /// The requested mapping would break the single-hop alias invariant.
    #[error("alias conflict for `{old}` -> `{new}`: {reason}")]
    Conflict {
        /// Retired identifier.
        old: String,
        /// Requested replacement.
        new: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// The replacement toolset is missing or not live.
    #[error("invalid replacement `{id}`: {reason}")]
    InvalidReplacement {
        /// Requested replacement identifier.
        id: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// The alias request itself is malformed.
    #[error("invalid alias request: {reason}")]
    InvalidRequest {
        /// Human-readable explanation.
        reason: String,
    },

    /// No alias exists for the identifier.
    #[error("no alias registered for `{old}`")]
    NotFound {
        /// Identifier that was looked up.
        old: String,
    },

    /// Resolution found an alias pointing at another alias.
    #[error("alias chain detected: `{name}` -> `{via}` is itself an alias")]
    ChainDetected {
        /// Name being resolved.
        name: String,
        /// Intermediate alias target.
        via: String,
    },

    /// Resolution found an alias whose target is not a live toolset.
    #[error("alias `{name}` points to `{target}`, which is not a live toolset")]
    DanglingAlias {
        /// Name being resolved.
        name: String,
        /// Target that failed to resolve.
        target: String,
    },

    /// Reading or writing the alias document failed.
    #[error(transparent)]
    Document(#[from] toolset_primitives::Error),
}

impl AliasError {
    /// Returns `true` when the error is a rejected request rather than an
    /// environmental failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Document(_))
    }

    pub(crate) fn conflict(old: &str, new: &str, reason: impl Into<String>) -> Self {
        Self::Conflict {
            old: old.to_owned(),
            new: new.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}
