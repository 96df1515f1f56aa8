//! Error types for the registry store.

use thiserror::Error;
use toolset_primitives::ToolsetStatus;
use toolset_validator::ValidationReport;

use crate::lifecycle::LifecycleEvent;

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors emitted by the registry store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Reading or writing the registry document failed.
    #[error(transparent)]
    Document(#[from] toolset_primitives::Error),

    /// A commit was refused because the candidate failed validation.
    #[error("commit rejected: {} violation(s)", report.violations().len())]
    Rejected {
        /// Full validation report of the candidate.
        report: Box<ValidationReport>,
    },

    /// An entry could not be interpreted as a toolset.
    #[error("registry entry {subject} is not a valid toolset: {reason}")]
    UnreadableEntry {
        /// Entry id or position.
        subject: String,
        /// Parse failure.
        reason: String,
    },

    /// No toolset with the id exists.
    #[error("unknown toolset `{id}`")]
    UnknownToolset {
        /// Requested identifier.
        id: String,
    },

    /// A lifecycle transition is not allowed.
    #[error("toolset `{id}` cannot go from {from} via {event}: {reason}")]
    InvalidTransition {
        /// Toolset identifier.
        id: String,
        /// Status before the attempted transition.
        from: ToolsetStatus,
        /// Requested event.
        event: LifecycleEvent,
        /// Why it was refused.
        reason: String,
    },
}

impl RegistryError {
    /// Returns `true` for missing, unreadable, or malformed documents.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::Document(err) if err.is_file_error())
    }

    /// Returns the validation report of a rejected commit.
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Rejected { report } => Some(&**report),
            _ => None,
        }
    }
}
