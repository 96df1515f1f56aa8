//! Versioned toolset registry.
//!
//! [`Registry`] owns the canonical document on disk and only writes it after
//! a clean validation. [`lifecycle`] governs status transitions and
//! [`detect_changes`] compares the registry with discovered tools.

#![warn(missing_docs, clippy::pedantic)]

mod changes;
mod error;
pub mod lifecycle;
mod store;

pub use changes::{Change, ChangeSet, detect_changes};
pub use error::{RegistryError, RegistryResult};
pub use lifecycle::{LifecycleEvent, LifecycleOutcome, TransitionGuard};
pub use store::{CommitOptions, Registry};
