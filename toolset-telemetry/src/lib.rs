//! Diagnostics for the governance tools.
//!
//! Log output goes to stderr so stdout stays reserved for reports.

#![warn(missing_docs, clippy::pedantic)]

use std::io;

use anyhow::{Context as _, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Crates whose events are raised by verbosity flags.
const CRATES: [&str; 9] = [
    "toolset_primitives",
    "toolset_extractor",
    "toolset_aliases",
    "toolset_validator",
    "toolset_registry",
    "toolset_migration",
    "toolset_config",
    "toolset_governance",
    "toolsets",
];

/// Filter directives for a `-v` count when `RUST_LOG` is unset.
///
/// `0` shows warnings, `1` adds info from this workspace, `2` debug, and
/// `3` or more trace. Third-party crates stay at `warn`.
#[must_use]
pub fn directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => return "warn".to_owned(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut directives = vec!["warn".to_owned()];
    directives.extend(CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins over `verbosity` when set.
///
/// # Errors
///
/// Fails when `RUST_LOG` cannot be parsed or a global subscriber is already
/// installed.
pub fn init_tracing(verbosity: u8) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            EnvFilter::try_new(&value).with_context(|| format!("invalid RUST_LOG `{value}`"))?
        }
        _ => EnvFilter::try_new(directives(verbosity)).context("invalid verbosity filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbosity > 1)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("failed to install tracing subscriber")?;
    debug!(verbosity, "tracing initialised");
    Ok(())
}
