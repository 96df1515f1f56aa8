//! Governance for the toolsets an agent runtime exposes.
//!
//! A single-threaded batch pipeline: tools are extracted from capability
//! sources, the registry is loaded and validated, and only a clean run may
//! write the registry, the alias map, or migration guides. [`Governance`]
//! bundles the configured components and exposes one method per operation.
//!
//! The component crates are re-exported for callers that need finer control.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod pipeline;

pub use error::{GovernanceError, GovernanceResult};
pub use pipeline::{
    AliasCreated, ChangeReport, ExpiredAlias, GeneratedGuide, Governance, Transition,
};

/// Shared toolset model and document I/O.
pub use toolset_primitives as primitives;

/// Tool discovery from capability sources.
pub use toolset_extractor as extractor;

/// Deprecation alias map.
pub use toolset_aliases as aliases;

/// Structural checks.
pub use toolset_validator as validator;

/// Versioned registry store and lifecycle.
pub use toolset_registry as registry;

/// Migration guides and catalog summaries.
pub use toolset_migration as migration;

/// Layered configuration.
pub use toolset_config as config;

/// Commonly used types.
pub mod prelude {
    pub use toolset_aliases::{AliasMap, AliasRecord, AliasRequest, DeprecationWarning, Resolution};
    pub use toolset_config::{GovernanceConfig, PathOverrides};
    pub use toolset_extractor::{Extraction, Extractor};
    pub use toolset_primitives::{RegistryDocument, Toolset, ToolsetStatus};
    pub use toolset_registry::{Change, ChangeSet};
    pub use toolset_validator::{ValidationReport, Violation, ViolationKind};

    pub use crate::{Governance, GovernanceError, GovernanceResult};
}
