//! Layered configuration for the governance pipeline.
//!
//! [`GovernanceConfig::load`] merges, from lowest to highest priority:
//! built-in defaults, a TOML file, and `TOOLSETS_*` environment variables.
//! Command-line overrides are applied on top with
//! [`GovernanceConfig::apply_overrides`].

#![warn(missing_docs, clippy::pedantic)]

mod error;

use std::env;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use toolset_aliases::{AliasPolicy, DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_MIGRATION_DIR};
use toolset_extractor::{
    DEFAULT_CONTEXT_TYPE, DEFAULT_FALLBACK_BUCKET, DEFAULT_RULES, Extractor, GroupingRule,
    GroupingTable, Scanner,
};
use tracing::debug;

pub use error::{ConfigError, ConfigResult};

/// File read from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "toolsets.toml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_VAR: &str = "TOOLSETS_CONFIG";

/// Prefix of environment overrides, e.g. `TOOLSETS_PATHS__REGISTRY`.
pub const ENV_PREFIX: &str = "TOOLSETS_";

/// Complete pipeline configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Document and source locations.
    pub paths: PathsConfig,
    /// Alias scheduling.
    pub deprecation: DeprecationConfig,
    /// Tool discovery.
    pub extractor: ExtractorConfig,
}

/// Where documents live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Registry document.
    pub registry: PathBuf,
    /// Alias document.
    pub aliases: PathBuf,
    /// Schema override; the embedded schema is used when unset.
    pub schema: Option<PathBuf>,
    /// Capability source files scanned for tool declarations.
    pub sources: Vec<PathBuf>,
    /// Directory migration guides are written to and referenced from.
    pub migration_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("agent/toolsets.json"),
            aliases: PathBuf::from("agent/toolset_aliases.json"),
            schema: None,
            sources: Vec::new(),
            migration_dir: PathBuf::from(DEFAULT_MIGRATION_DIR),
        }
    }
}

/// Alias scheduling defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeprecationConfig {
    /// Days between alias creation and the default removal date.
    pub grace_period_days: u32,
}

impl Default for DeprecationConfig {
    fn default() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
        }
    }
}

/// Tool discovery settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Parameter type marking a declaration as a tool.
    pub context_type: String,
    /// Bucket for names no rule matches.
    pub fallback_bucket: String,
    /// Grouping rules, first match wins.
    pub rules: Vec<RuleConfig>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            context_type: DEFAULT_CONTEXT_TYPE.to_owned(),
            fallback_bucket: DEFAULT_FALLBACK_BUCKET.to_owned(),
            rules: DEFAULT_RULES
                .iter()
                .map(|(bucket, needles)| RuleConfig {
                    bucket: (*bucket).to_owned(),
                    contains: needles.iter().map(|needle| (*needle).to_owned()).collect(),
                })
                .collect(),
        }
    }
}

/// One `[[extractor.rules]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Candidate toolset the rule fills.
    pub bucket: String,
    /// Case-insensitive substrings; any match selects the bucket.
    pub contains: Vec<String>,
}

/// Command-line values that take precedence over every other layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathOverrides {
    /// Replaces `paths.registry`.
    pub registry: Option<PathBuf>,
    /// Replaces `paths.aliases`.
    pub aliases: Option<PathBuf>,
    /// Replaces `paths.schema`.
    pub schema: Option<PathBuf>,
    /// Replaces `paths.sources` when non-empty.
    pub sources: Vec<PathBuf>,
}

impl GovernanceConfig {
    /// Loads configuration from `file`, or from `$TOOLSETS_CONFIG`, or from
    /// `toolsets.toml` if present, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] when an explicitly named file is
    /// absent, [`ConfigError::Figment`] when a layer has the wrong shape, and
    /// [`ConfigError::Invalid`] when the merged values fail validation.
    pub fn load(file: Option<&Path>) -> ConfigResult<Self> {
        let explicit = file
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_VAR).map(PathBuf::from));
        let figment = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::MissingFile { path });
                }
                Self::figment(&path)
            }
            None => Self::figment(Path::new(DEFAULT_CONFIG_FILE)),
        };
        Self::extract(&figment)
    }

    /// Loads only defaults and the TOML file at `path`, ignoring the
    /// environment.
    ///
    /// # Errors
    ///
    /// Same as [`GovernanceConfig::load`].
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.is_file() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let figment = Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(path));
        Self::extract(&figment)
    }

    /// The provider stack used by [`GovernanceConfig::load`]. A missing file
    /// contributes nothing.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config", "today"]).split("__"))
    }

    /// Extracts and validates a configuration from any provider stack.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] or [`ConfigError::Invalid`].
    pub fn extract(figment: &Figment) -> ConfigResult<Self> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        debug!(
            registry = %config.paths.registry.display(),
            aliases = %config.paths.aliases.display(),
            sources = config.paths.sources.len(),
            grace_period_days = config.deprecation.grace_period_days,
            rules = config.extractor.rules.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Applies command-line overrides.
    pub fn apply_overrides(&mut self, overrides: PathOverrides) {
        if let Some(registry) = overrides.registry {
            self.paths.registry = registry;
        }
        if let Some(aliases) = overrides.aliases {
            self.paths.aliases = aliases;
        }
        if overrides.schema.is_some() {
            self.paths.schema = overrides.schema;
        }
        if !overrides.sources.is_empty() {
            self.paths.sources = overrides.sources;
        }
    }

    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.deprecation.grace_period_days == 0 {
            return Err(ConfigError::invalid(
                "deprecation.grace_period_days",
                "must be at least one day",
            ));
        }
        if self.extractor.context_type.trim().is_empty() {
            return Err(ConfigError::invalid("extractor.context_type", "must not be empty"));
        }
        if self.extractor.fallback_bucket.trim().is_empty() {
            return Err(ConfigError::invalid("extractor.fallback_bucket", "must not be empty"));
        }
        for (index, rule) in self.extractor.rules.iter().enumerate() {
            if rule.bucket.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("extractor.rules[{index}].bucket"),
                    "must not be empty",
                ));
            }
            if rule.contains.iter().all(|needle| needle.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    format!("extractor.rules[{index}].contains"),
                    "needs at least one non-blank substring",
                ));
            }
        }
        Ok(())
    }

    /// Alias scheduling policy.
    #[must_use]
    pub fn alias_policy(&self) -> AliasPolicy {
        AliasPolicy::new(
            self.deprecation.grace_period_days,
            self.paths.migration_dir.to_string_lossy(),
        )
    }

    /// Builds the grouping table from the configured rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extractor`] when a bucket is not a valid
    /// toolset id.
    pub fn grouping_table(&self) -> ConfigResult<GroupingTable> {
        let mut table = GroupingTable::new(self.extractor.fallback_bucket.trim())?;
        for rule in &self.extractor.rules {
            table.push(GroupingRule::contains_any(rule.bucket.trim(), &rule.contains)?);
        }
        Ok(table)
    }

    /// Builds the extractor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extractor`] for an unusable context type or
    /// rule.
    pub fn extractor(&self) -> ConfigResult<Extractor> {
        let scanner = Scanner::new(self.extractor.context_type.trim())?;
        Ok(Extractor::new(scanner, self.grouping_table()?))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("toolsets.toml");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = GovernanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.deprecation.grace_period_days, 180);
        assert_eq!(config.extractor.rules.len(), 6);
        assert_eq!(config.extractor.rules[0].bucket, "ui_elements");
        assert_eq!(
            config.alias_policy().migration_guide_path("old_ui", "ui_elements"),
            "docs/migration/old_ui_to_ui_elements.md"
        );

        let table = config.grouping_table().unwrap();
        assert_eq!(table.classify("setThemeColor"), "theme");
        assert_eq!(table.classify("ping"), "general");
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
[paths]
registry = "registry.json"
sources = ["agent/main.py", "agent/tools.py"]

[deprecation]
grace_period_days = 30

[extractor]
context_type = "Ctx"
fallback_bucket = "misc"

[[extractor.rules]]
bucket = "search"
contains = ["search", "lookup"]
"#,
        );

        let config = GovernanceConfig::from_file(&path).unwrap();
        assert_eq!(config.paths.registry, PathBuf::from("registry.json"));
        assert_eq!(config.paths.aliases, PathBuf::from("agent/toolset_aliases.json"));
        assert_eq!(config.paths.sources.len(), 2);
        assert_eq!(config.deprecation.grace_period_days, 30);

        let extractor = config.extractor().unwrap();
        let extraction = extractor.extract("a.py", "def lookupUser(c: Ctx):\n    pass\n");
        assert!(extraction.groups()["search"].contains("lookupUser"));
        assert_eq!(extractor.grouping().fallback(), "misc");
    }

    #[test]
    fn zero_grace_period_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[deprecation]\ngrace_period_days = 0\n");
        let err = GovernanceConfig::from_file(&path).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref key, .. } if key == "deprecation.grace_period_days")
        );
    }

    #[test]
    fn blank_rule_needles_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "[[extractor.rules]]\nbucket = \"search\"\ncontains = [\" \"]\n",
        );
        let err = GovernanceConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("extractor.rules[0].contains"));
    }

    #[test]
    fn invalid_bucket_surfaces_extractor_error() {
        let mut config = GovernanceConfig::default();
        config.extractor.rules.push(RuleConfig {
            bucket: "Not Valid".to_owned(),
            contains: vec!["x".to_owned()],
        });
        assert!(matches!(config.extractor(), Err(ConfigError::Extractor(_))));
    }

    #[test]
    fn wrong_types_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[deprecation]\ngrace_period_days = \"soon\"\n");
        assert!(matches!(
            GovernanceConfig::from_file(&path),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            GovernanceConfig::load(Some(&missing)),
            Err(ConfigError::MissingFile { .. })
        ));
    }

    #[test]
    fn overrides_win() {
        let mut config = GovernanceConfig::default();
        config.apply_overrides(PathOverrides {
            registry: Some(PathBuf::from("r.json")),
            sources: vec![PathBuf::from("main.py")],
            ..PathOverrides::default()
        });
        assert_eq!(config.paths.registry, PathBuf::from("r.json"));
        assert_eq!(config.paths.aliases, PathBuf::from("agent/toolset_aliases.json"));
        assert_eq!(config.paths.sources, [PathBuf::from("main.py")]);
    }
}
