//! Shared error definitions for toolset primitives.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the toolset workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating toolset primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// Toolset identifier failed validation.
    #[error("invalid toolset id `{id}`: {reason}")]
    InvalidToolsetId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name failed validation.
    #[error("invalid tool name `{name}`: {reason}")]
    InvalidToolName {
        /// The offending tool name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Toolset definition failed validation.
    #[error("invalid toolset: {reason}")]
    InvalidToolset {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A required document does not exist on disk.
    #[error("document not found: {}", path.display())]
    MissingDocument {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A document exists but could not be parsed into the expected shape.
    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument {
        /// Path of the offending document.
        path: PathBuf,
        /// Human-readable parse failure.
        reason: String,
    },

    /// Underlying I/O failure while reading or writing a document.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },

    /// Serialization failure while encoding a document.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Returns `true` when the error stems from a missing or unreadable document.
    ///
    /// File errors are fatal for the whole pipeline.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::MissingDocument { .. }
                | Self::MalformedDocument { .. }
                | Self::Io { .. }
                | Self::Serialization { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
