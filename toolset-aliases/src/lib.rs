//! Deprecation aliases for retired toolsets.
//!
//! An [`AliasMap`] redirects a retired toolset id to exactly one live
//! replacement. Redirects never chain: resolution takes at most one hop and
//! reports a [`DeprecationWarning`] whenever it does.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod map;
mod record;

pub use error::{AliasError, AliasResult};
pub use map::{
    AliasMap, AliasPolicy, AliasRequest, DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_MIGRATION_DIR,
    LiveToolsets,
};
pub use record::{AliasRecord, DeprecationWarning, Resolution};
