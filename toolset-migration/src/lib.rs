//! Migration artifacts for toolset deprecations.
//!
//! [`MigrationGuide`] renders a deterministic Markdown guide and changelog
//! entry for moving from a retired toolset to its replacement.
//! [`render_catalog`] summarises the live registry for agent prompts.

#![warn(missing_docs, clippy::pedantic)]

mod catalog;
mod diff;
mod error;
mod guide;
pub mod template;

pub use catalog::render_catalog;
pub use diff::ToolDiff;
pub use error::{MigrationError, MigrationResult};
pub use guide::{MigrationGuide, Timeline};
