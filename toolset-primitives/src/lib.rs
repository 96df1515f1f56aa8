//! Core shared types for toolset governance.
//!
//! Every other crate in the workspace builds on the toolset model, the naming
//! rules, and the document helpers defined here.

#![warn(missing_docs, clippy::pedantic)]

mod document;
mod error;
mod naming;
mod toolset;

/// Registry document and atomic JSON persistence helpers.
pub use document::{RegistryDocument, read_json_document, write_atomic, write_json_atomic};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Naming rules for toolset identifiers and tool names.
pub use naming::{
    RESERVED_TOOLSET_IDS, is_reserved_toolset_id, validate_tool_name, validate_toolset_id,
};
/// Toolset model and builder.
pub use toolset::{DeprecationNotice, Toolset, ToolsetBuilder, ToolsetMetadata, ToolsetStatus};
