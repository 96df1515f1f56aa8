//! The batch pipeline: extract, load, validate, then write or generate.

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use toolset_aliases::{AliasMap, AliasRecord, AliasRequest, Resolution};
use toolset_config::GovernanceConfig;
use toolset_extractor::{Extraction, Extractor, ParseFailure};
use toolset_migration::{MigrationGuide, render_catalog};
use toolset_primitives::{RegistryDocument, Toolset, ToolsetStatus};
use toolset_registry::lifecycle::{self, LifecycleEvent, LifecycleOutcome, TransitionGuard};
use toolset_registry::{ChangeSet, CommitOptions, Registry, detect_changes};
use toolset_validator::{ValidationReport, Validator};
use tracing::{debug, info, warn};

use crate::error::{GovernanceError, GovernanceResult};

/// How a missing alias document is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AliasFile {
    /// Absent means no alias has been created yet.
    Optional,
    /// Absent is a file error.
    Required,
}

/// Change detection output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    changes: ChangeSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parse_failures: Vec<ParseFailure>,
}

impl ChangeReport {
    /// Registry drift.
    #[must_use]
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Sources the extractor could not fully parse.
    #[must_use]
    pub fn parse_failures(&self) -> &[ParseFailure] {
        &self.parse_failures
    }

    /// No drift and every source parsed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty() && self.parse_failures.is_empty()
    }
}

impl Display for ChangeReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.changes)?;
        if !self.parse_failures.is_empty() {
            writeln!(f, "{} parse failure(s):", self.parse_failures.len())?;
            for failure in &self.parse_failures {
                writeln!(f, "  {failure}")?;
            }
        }
        Ok(())
    }
}

/// A completed deprecation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AliasCreated {
    old: String,
    record: AliasRecord,
    deprecated: bool,
    revision: u64,
}

impl AliasCreated {
    /// Retired id.
    #[must_use]
    pub fn old(&self) -> &str {
        &self.old
    }

    /// The stored alias.
    #[must_use]
    pub fn record(&self) -> &AliasRecord {
        &self.record
    }

    /// Whether a registry toolset was flipped to `deprecated`.
    #[must_use]
    pub const fn deprecated(&self) -> bool {
        self.deprecated
    }

    /// Registry revision after the commit.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

impl Display for AliasCreated {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "alias created: {} -> {}",
            self.old,
            self.record.replacement()
        )?;
        writeln!(f, "  deprecated at: {}", self.record.deprecated_at())?;
        writeln!(f, "  removal date:  {}", self.record.removal_date())?;
        writeln!(f, "  guide:         {}", self.record.migration_guide())?;
        if self.deprecated {
            writeln!(f, "registry revision {} marks `{}` deprecated", self.revision, self.old)?;
        }
        Ok(())
    }
}

/// Result of a committed lifecycle transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Transition {
    /// The toolset now has `status`.
    StatusChanged {
        /// Toolset id.
        id: String,
        /// New status.
        status: ToolsetStatus,
        /// Registry revision after the commit.
        revision: u64,
    },
    /// The toolset was deleted.
    Removed {
        /// Toolset id.
        id: String,
        /// Registry revision after the commit.
        revision: u64,
    },
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusChanged { id, status, revision } => {
                writeln!(f, "`{id}` is now {status} (revision {revision})")
            }
            Self::Removed { id, revision } => {
                writeln!(f, "`{id}` removed from the registry (revision {revision})")
            }
        }
    }
}

/// An alias past its removal date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpiredAlias {
    old: String,
    record: AliasRecord,
    /// `true` while the retired toolset is still in the registry.
    in_registry: bool,
}

impl ExpiredAlias {
    /// Retired id.
    #[must_use]
    pub fn old(&self) -> &str {
        &self.old
    }

    /// The alias.
    #[must_use]
    pub fn record(&self) -> &AliasRecord {
        &self.record
    }

    /// Whether the retired toolset still awaits removal.
    #[must_use]
    pub const fn in_registry(&self) -> bool {
        self.in_registry
    }
}

impl Display for ExpiredAlias {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} (removal date {})",
            self.old,
            self.record.replacement(),
            self.record.removal_date()
        )?;
        if self.in_registry {
            f.write_str(", ready for remove-toolset")?;
        }
        Ok(())
    }
}

/// A written migration guide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedGuide {
    path: PathBuf,
    changelog: String,
}

impl GeneratedGuide {
    /// Where the guide was written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Changelog paragraph for the deprecation.
    #[must_use]
    pub fn changelog(&self) -> &str {
        &self.changelog
    }
}

impl Display for GeneratedGuide {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "migration guide written to {}", self.path.display())?;
        writeln!(f)?;
        writeln!(f, "{}", self.changelog)
    }
}

/// Configured components plus the operations built from them.
///
/// Every operation reloads the documents it needs, so one instance can serve
/// several commands.
#[derive(Debug)]
pub struct Governance {
    config: GovernanceConfig,
    validator: Validator,
    extractor: Extractor,
}

impl Governance {
    /// Builds the validator and extractor described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Validator`] when the schema override is
    /// missing or does not compile, and [`GovernanceError::Config`] for
    /// unusable extractor settings.
    pub fn new(config: GovernanceConfig) -> GovernanceResult<Self> {
        let validator = match &config.paths.schema {
            Some(path) => Validator::from_schema_file(path)?,
            None => Validator::new()?,
        };
        let extractor = config.extractor()?;
        Ok(Self {
            config,
            validator,
            extractor,
        })
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Scans the configured sources, or returns `None` when there are none.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Extractor`] when a source cannot be read.
    pub fn extract(&self) -> GovernanceResult<Option<Extraction>> {
        if self.config.paths.sources.is_empty() {
            return Ok(None);
        }
        let extraction = self.extractor.extract_paths(&self.config.paths.sources)?;
        info!(
            sources = self.config.paths.sources.len(),
            tools = extraction.tools().len(),
            groups = extraction.groups().len(),
            clean = extraction.is_clean(),
            "sources extracted"
        );
        Ok(Some(extraction))
    }

    /// Runs every structural check against the registry, the alias map, and
    /// the configured sources.
    ///
    /// # Errors
    ///
    /// Returns file errors only; violations are reported in the
    /// [`ValidationReport`].
    pub fn validate(&self) -> GovernanceResult<ValidationReport> {
        let extraction = self.extract()?;
        let registry = self.registry()?;
        let aliases = self.aliases(AliasFile::Optional)?;
        let report = registry.validate(&self.validator, options(&aliases, extraction.as_ref()));
        info!(
            valid = report.is_valid(),
            violations = report.violations().len(),
            "registry validated"
        );
        Ok(report)
    }

    /// Compares the toolsets inferred from the sources with the registry.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::NoSources`] when no source is configured,
    /// and file errors.
    pub fn detect_changes(&self) -> GovernanceResult<ChangeReport> {
        let extraction = self.extract()?.ok_or(GovernanceError::NoSources)?;
        let document = self.registry()?.snapshot();
        let changes = detect_changes(&extraction, &document);
        info!(changes = changes.changes().len(), "change detection finished");
        Ok(ChangeReport {
            changes,
            parse_failures: extraction.failures().to_vec(),
        })
    }

    /// Deprecates `request.old()` in favour of `request.new_id()`.
    ///
    /// Creates the alias and marks the retired toolset deprecated when it is
    /// in the registry. Both documents are validated before anything is
    /// written. The alias document is saved first and the registry committed
    /// second; if the commit fails the alias document is put back as it was,
    /// so a retired toolset is never left deprecated without its alias.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Alias`] for a conflicting or malformed
    /// request, [`GovernanceError::Registry`] when the deprecated registry
    /// fails validation, and file errors.
    pub fn create_alias(
        &self,
        request: &AliasRequest,
        today: NaiveDate,
    ) -> GovernanceResult<AliasCreated> {
        let extraction = self.extract()?;
        let mut registry = self.registry()?;
        let mut document = registry.document()?;
        let mut aliases = self.aliases(AliasFile::Optional)?;
        let alias_path = &self.config.paths.aliases;
        let previous = alias_path.exists().then(|| aliases.clone());

        let record = aliases
            .create(request, &self.config.alias_policy(), &document, today)?
            .clone();

        let deprecated = document.is_live(request.old());
        if deprecated {
            let guard = TransitionGuard::new(&aliases, today);
            let event = LifecycleEvent::Deprecate {
                superseded_by: request.new_id().to_owned(),
            };
            lifecycle::apply(&mut document, request.old(), &event, &guard)?;
            registry.check(&document, &self.validator, options(&aliases, extraction.as_ref()))?;
        } else {
            debug!(old = request.old(), "retired id is not a live registry toolset");
            let report =
                registry.validate(&self.validator, options(&aliases, extraction.as_ref()));
            if !report.is_valid() {
                return Err(GovernanceError::Invalid {
                    report: Box::new(report),
                });
            }
        }

        aliases.save(alias_path)?;
        if deprecated {
            let committed =
                registry.commit(&document, &self.validator, options(&aliases, extraction.as_ref()));
            if let Err(err) = committed {
                restore_aliases(alias_path, previous.as_ref());
                return Err(err.into());
            }
        }

        Ok(AliasCreated {
            old: request.old().to_owned(),
            record,
            deprecated,
            revision: registry.revision(),
        })
    }

    /// Deletes the alias for `old`.
    ///
    /// Refused when the registry would no longer validate without it.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Alias`] when no alias exists,
    /// [`GovernanceError::Invalid`] when removal would break the registry, and
    /// file errors, including a missing alias document.
    pub fn remove_alias(&self, old: &str) -> GovernanceResult<AliasRecord> {
        let registry = self.registry()?;
        let mut aliases = self.aliases(AliasFile::Required)?;
        let record = aliases.remove(old)?;

        let report = registry.validate(&self.validator, CommitOptions::default().aliases(&aliases));
        if !report.is_valid() {
            return Err(GovernanceError::Invalid {
                report: Box::new(report),
            });
        }
        aliases.save(&self.config.paths.aliases)?;
        Ok(record)
    }

    /// Moves a live toolset between `active`, `experimental`, and `beta`.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Registry`] for an unknown toolset, a refused
    /// transition, or a rejected commit, and file errors.
    pub fn set_status(&self, id: &str, status: ToolsetStatus) -> GovernanceResult<Transition> {
        self.transition(id, &LifecycleEvent::SetStatus(status), None)
    }

    /// Deletes a deprecated toolset once its alias has expired, or at once
    /// with `force`.
    ///
    /// # Errors
    ///
    /// Same as [`Governance::set_status`].
    pub fn remove_toolset(
        &self,
        id: &str,
        force: bool,
        today: NaiveDate,
    ) -> GovernanceResult<Transition> {
        self.transition(id, &LifecycleEvent::Remove { force }, Some(today))
    }

    fn transition(
        &self,
        id: &str,
        event: &LifecycleEvent,
        today: Option<NaiveDate>,
    ) -> GovernanceResult<Transition> {
        let extraction = self.extract()?;
        let mut registry = self.registry()?;
        let mut document = registry.document()?;
        let aliases = self.aliases(AliasFile::Optional)?;

        let guard = TransitionGuard::new(&aliases, today.unwrap_or(NaiveDate::MIN));
        let outcome = lifecycle::apply(&mut document, id, event, &guard)?;
        registry.commit(&document, &self.validator, options(&aliases, extraction.as_ref()))?;

        let revision = registry.revision();
        Ok(match outcome {
            LifecycleOutcome::Status(status) => Transition::StatusChanged {
                id: id.to_owned(),
                status,
                revision,
            },
            LifecycleOutcome::Removed(_) => Transition::Removed {
                id: id.to_owned(),
                revision,
            },
        })
    }

    /// Resolves a requested toolset name, following at most one alias hop.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Alias`] when the alias map is chained or
    /// dangling, and file errors.
    pub fn resolve(&self, name: &str) -> GovernanceResult<Resolution> {
        let document = self.registry()?.snapshot();
        let aliases = self.aliases(AliasFile::Optional)?;
        Ok(aliases.resolve(name, &document)?)
    }

    /// The registry as parsed for read-only use.
    ///
    /// # Errors
    ///
    /// Returns file errors.
    pub fn list(&self) -> GovernanceResult<RegistryDocument> {
        Ok(self.registry()?.snapshot())
    }

    /// Renders the live toolsets for agent system instructions.
    ///
    /// # Errors
    ///
    /// Returns file errors.
    pub fn catalog(&self) -> GovernanceResult<String> {
        Ok(render_catalog(&self.list()?))
    }

    /// Aliases whose grace period has elapsed by `today`.
    ///
    /// # Errors
    ///
    /// Returns file errors.
    pub fn expired_aliases(&self, today: NaiveDate) -> GovernanceResult<Vec<ExpiredAlias>> {
        let document = self.registry()?.snapshot();
        let aliases = self.aliases(AliasFile::Optional)?;
        Ok(aliases
            .expired(today)
            .into_iter()
            .map(|(old, record)| ExpiredAlias {
                old: old.to_owned(),
                record: record.clone(),
                in_registry: document.get(old).is_some(),
            })
            .collect())
    }

    /// Writes the migration guide for `old` → `new` into `output`, or into the
    /// configured migration directory.
    ///
    /// The registry must validate cleanly first.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Invalid`] when validation fails,
    /// [`GovernanceError::UnknownToolset`] when either toolset is missing,
    /// [`GovernanceError::Migration`] for a degenerate request, and file
    /// errors.
    pub fn generate_migration_guide(
        &self,
        old: &str,
        new: &str,
        reason: &str,
        output: Option<&Path>,
    ) -> GovernanceResult<GeneratedGuide> {
        let report = self.validate()?;
        if !report.is_valid() {
            return Err(GovernanceError::Invalid {
                report: Box::new(report),
            });
        }

        let document = self.registry()?.snapshot();
        let aliases = self.aliases(AliasFile::Optional)?;
        let old_toolset = toolset(&document, old)?;
        let new_toolset = toolset(&document, new)?;
        let record = aliases
            .deprecation_info(old)
            .filter(|record| record.replacement() == new);

        let guide = MigrationGuide::new(old_toolset, new_toolset, reason, record)?;
        let dir = output.unwrap_or(self.config.paths.migration_dir.as_path());
        let path = guide.write_to(dir)?;
        Ok(GeneratedGuide {
            path,
            changelog: guide.changelog_entry(),
        })
    }

    fn registry(&self) -> GovernanceResult<Registry> {
        Ok(Registry::load(&self.config.paths.registry)?)
    }

    fn aliases(&self, file: AliasFile) -> GovernanceResult<AliasMap> {
        Ok(AliasMap::load(
            &self.config.paths.aliases,
            file == AliasFile::Optional,
        )?)
    }
}

/// Puts the alias document back the way it was before a failed deprecation:
/// the previous map when there was one, otherwise no file at all.
fn restore_aliases(path: &Path, previous: Option<&AliasMap>) {
    let restored = match previous {
        Some(map) => map.save(path).map_err(|err| err.to_string()),
        None => fs::remove_file(path).map_err(|err| err.to_string()),
    };
    match restored {
        Ok(()) => info!(path = %path.display(), "alias document rolled back"),
        Err(reason) => warn!(path = %path.display(), %reason, "failed to roll back alias document"),
    }
}

fn options<'a>(aliases: &'a AliasMap, extraction: Option<&'a Extraction>) -> CommitOptions<'a> {
    let options = CommitOptions::default().aliases(aliases);
    match extraction {
        Some(extraction) => options.extraction(extraction),
        None => options,
    }
}

fn toolset<'a>(document: &'a RegistryDocument, id: &str) -> GovernanceResult<&'a Toolset> {
    document
        .get(id)
        .ok_or_else(|| GovernanceError::UnknownToolset { id: id.to_owned() })
}

#[cfg(test)]
mod tests {
    use toolset_aliases::AliasPolicy;

    use super::*;

    fn deprecate(aliases: &mut AliasMap, old: &str) {
        let live = RegistryDocument::new(vec![
            Toolset::builder("ui_elements").tools(["upsert_ui_element"]).build().unwrap(),
        ]);
        aliases
            .create(
                &AliasRequest::new(old, "ui_elements", "merged"),
                &AliasPolicy::default(),
                &live,
                NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            )
            .unwrap();
    }

    #[test]
    fn rollback_removes_a_fresh_alias_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let mut aliases = AliasMap::new();
        deprecate(&mut aliases, "old_ui");
        aliases.save(&path).unwrap();

        restore_aliases(&path, None);
        assert!(!path.exists());
    }

    #[test]
    fn rollback_restores_the_previous_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let mut previous = AliasMap::new();
        deprecate(&mut previous, "legacy_ui");
        previous.save(&path).unwrap();

        let mut grown = previous.clone();
        deprecate(&mut grown, "old_ui");
        grown.save(&path).unwrap();

        restore_aliases(&path, Some(&previous));
        assert_eq!(AliasMap::load(&path, false).unwrap(), previous);
    }
}
