//! Command-line surface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use toolset_governance::config::PathOverrides;
use toolset_governance::primitives::ToolsetStatus;

#[derive(Debug, Parser)]
#[command(name = "toolsets")]
#[command(about = "Validate, deprecate, and document agent toolsets", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file (defaults to ./toolsets.toml when present)
    #[arg(long, global = true, env = "TOOLSETS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Registry document
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Alias document
    #[arg(long, global = true)]
    pub aliases: Option<PathBuf>,

    /// JSON Schema overriding the embedded toolset schema
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Capability source file to scan; repeat for several
    #[arg(long = "source", global = true)]
    pub sources: Vec<PathBuf>,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Date used as today for alias scheduling (YYYY-MM-DD)
    #[arg(long, global = true, env = "TOOLSETS_TODAY")]
    pub today: Option<NaiveDate>,

    /// More log output on stderr; repeat for more detail
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Compare tools found in the sources with the registry
    DetectChanges,
    /// Run every structural check against the registry
    Validate,
    /// Deprecate a toolset in favour of a live replacement
    CreateAlias {
        /// Retired toolset id
        #[arg(long)]
        old: String,
        /// Replacement toolset id
        #[arg(long)]
        new: String,
        /// Why the toolset is retired
        #[arg(long)]
        reason: String,
        /// Removal date (YYYY-MM-DD); defaults to the grace period
        #[arg(long)]
        removal_date: Option<NaiveDate>,
    },
    /// Write the migration guide for a deprecation
    GenerateMigrationGuide {
        /// Retired toolset id
        #[arg(long)]
        old: String,
        /// Replacement toolset id
        #[arg(long)]
        new: String,
        /// Why the toolset is retired
        #[arg(long)]
        reason: String,
        /// Output directory (defaults to paths.migration_dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Resolve a toolset name, following a deprecation alias
    Resolve {
        /// Requested toolset name
        name: String,
    },
    /// Summarise the live toolsets
    List,
    /// Move a toolset between active, experimental, and beta
    SetStatus {
        /// Toolset id
        id: String,
        /// New status
        status: ToolsetStatus,
    },
    /// Delete a deprecation alias
    RemoveAlias {
        /// Retired toolset id
        #[arg(long)]
        old: String,
    },
    /// Delete a deprecated toolset whose grace period has elapsed
    RemoveToolset {
        /// Toolset id
        id: String,
        /// Skip the grace period check
        #[arg(long)]
        force: bool,
    },
    /// List aliases whose removal date has passed
    ExpiredAliases,
}

impl Cli {
    /// Path flags that take precedence over configuration.
    pub(crate) fn overrides(&self) -> PathOverrides {
        PathOverrides {
            registry: self.registry.clone(),
            aliases: self.aliases.clone(),
            schema: self.schema.clone(),
            sources: self.sources.clone(),
        }
    }
}
