//! The alias map and its lifecycle operations.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use toolset_primitives::{
    Error as PrimitiveError, RegistryDocument, read_json_document, validate_toolset_id,
    write_json_atomic,
};
use tracing::{debug, info, warn};

use crate::error::{AliasError, AliasResult};
use crate::record::{AliasRecord, DeprecationWarning, Resolution};

/// Grace period applied when no removal date is requested.
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 180;

/// Directory migration guides are written to unless configured otherwise.
pub const DEFAULT_MIGRATION_DIR: &str = "docs/migration";

/// Read-only view of which toolset ids are live.
pub trait LiveToolsets {
    /// Returns `true` when `id` names a non-deprecated toolset.
    fn is_live(&self, id: &str) -> bool;

    /// Returns `true` when `id` names any toolset, live or not.
    fn contains(&self, id: &str) -> bool;
}

impl LiveToolsets for RegistryDocument {
    fn is_live(&self, id: &str) -> bool {
        RegistryDocument::is_live(self, id)
    }

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

/// A plain set of ids, all considered live.
impl LiveToolsets for BTreeSet<String> {
    fn is_live(&self, id: &str) -> bool {
        BTreeSet::contains(self, id)
    }

    fn contains(&self, id: &str) -> bool {
        BTreeSet::contains(self, id)
    }
}

/// Defaults applied when creating aliases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasPolicy {
    grace_period_days: u32,
    migration_dir: String,
}

impl Default for AliasPolicy {
    fn default() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            migration_dir: DEFAULT_MIGRATION_DIR.to_owned(),
        }
    }
}

impl AliasPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(grace_period_days: u32, migration_dir: impl Into<String>) -> Self {
        Self {
            grace_period_days,
            migration_dir: migration_dir.into(),
        }
    }

    /// Days between deprecation and default removal.
    #[must_use]
    pub const fn grace_period_days(&self) -> u32 {
        self.grace_period_days
    }

    /// Directory prefix for migration guide paths.
    #[must_use]
    pub fn migration_dir(&self) -> &str {
        &self.migration_dir
    }

    /// Path of the migration guide for `old` → `new`.
    #[must_use]
    pub fn migration_guide_path(&self, old: &str, new: &str) -> String {
        let dir = self.migration_dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{old}_to_{new}.md")
        } else {
            format!("{dir}/{old}_to_{new}.md")
        }
    }
}

/// Parameters for [`AliasMap::create`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasRequest {
    old: String,
    new: String,
    reason: String,
    removal_date: Option<NaiveDate>,
}

impl AliasRequest {
    /// Requests that `old` redirect to `new`.
    #[must_use]
    pub fn new(old: impl Into<String>, new: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
            reason: reason.into(),
            removal_date: None,
        }
    }

    /// Overrides the default removal date.
    #[must_use]
    pub fn removal_date(mut self, date: NaiveDate) -> Self {
        self.removal_date = Some(date);
        self
    }

    /// Retired identifier.
    #[must_use]
    pub fn old(&self) -> &str {
        &self.old
    }

    /// Replacement identifier.
    #[must_use]
    pub fn new_id(&self) -> &str {
        &self.new
    }

    /// Deprecation reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// On-disk shape of the alias document.
#[derive(Default, Serialize, Deserialize)]
struct AliasDocument {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    deprecation_metadata: BTreeMap<String, AliasRecord>,
}

/// Single-hop redirects from retired toolset ids to live replacements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: BTreeMap<String, AliasRecord>,
}

impl AliasMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the alias document at `path`.
    ///
    /// When `allow_missing` is set a missing file reads as an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::Document`] when the file is missing (and not
    /// allowed to be), unreadable, or malformed, including when the alias and
    /// metadata tables disagree.
    pub fn load(path: &Path, allow_missing: bool) -> AliasResult<Self> {
        let value = match read_json_document(path) {
            Ok(value) => value,
            Err(PrimitiveError::MissingDocument { .. }) if allow_missing => {
                debug!(path = %path.display(), "alias document absent, starting empty");
                return Ok(Self::new());
            }
            Err(err) => return Err(err.into()),
        };

        let malformed = |reason: String| PrimitiveError::MalformedDocument {
            path: path.to_path_buf(),
            reason,
        };
        let document: AliasDocument =
            serde_json::from_value(value).map_err(|err| malformed(err.to_string()))?;

        let AliasDocument {
            aliases,
            mut deprecation_metadata,
        } = document;
        let mut entries = BTreeMap::new();
        for (old, new) in aliases {
            let record = deprecation_metadata
                .remove(&old)
                .ok_or_else(|| malformed(format!("alias `{old}` has no deprecation metadata")))?;
            if record.replacement() != new {
                return Err(malformed(format!(
                    "alias `{old}` targets `{new}` but its metadata names `{}`",
                    record.replacement()
                ))
                .into());
            }
            entries.insert(old, record);
        }
        if let Some(orphan) = deprecation_metadata.keys().next() {
            return Err(malformed(format!("metadata for `{orphan}` has no alias entry")).into());
        }

        debug!(path = %path.display(), aliases = entries.len(), "alias document loaded");
        Ok(Self { entries })
    }

    /// Atomically writes the map to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::Document`] when encoding or writing fails.
    pub fn save(&self, path: &Path) -> AliasResult<()> {
        let document = AliasDocument {
            aliases: self
                .entries
                .iter()
                .map(|(old, record)| (old.clone(), record.replacement().to_owned()))
                .collect(),
            deprecation_metadata: self.entries.clone(),
        };
        write_json_atomic(path, &document)?;
        info!(path = %path.display(), aliases = self.entries.len(), "alias document saved");
        Ok(())
    }

    /// Number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no alias is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(old, record)` pairs ordered by old id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasRecord)> {
        self.entries
            .iter()
            .map(|(old, record)| (old.as_str(), record))
    }

    /// Returns `true` when `name` is an alias source.
    #[must_use]
    pub fn is_deprecated(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the target of the alias for `old`.
    #[must_use]
    pub fn target(&self, old: &str) -> Option<&str> {
        self.entries.get(old).map(AliasRecord::replacement)
    }

    /// Returns the deprecation metadata for `old`.
    #[must_use]
    pub fn deprecation_info(&self, old: &str) -> Option<&AliasRecord> {
        self.entries.get(old)
    }

    /// Registers `request.old` as an alias of `request.new`.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::InvalidRequest`] for an empty reason, a malformed
    /// id, or a removal date before `today`; [`AliasError::Conflict`] when the
    /// old id is already aliased or the mapping would form a cycle or chain;
    /// and [`AliasError::InvalidReplacement`] when the replacement is not a
    /// live toolset.
    pub fn create(
        &mut self,
        request: &AliasRequest,
        policy: &AliasPolicy,
        toolsets: &impl LiveToolsets,
        today: NaiveDate,
    ) -> AliasResult<&AliasRecord> {
        let AliasRequest {
            old,
            new,
            reason,
            removal_date,
        } = request;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AliasError::invalid_request("a deprecation reason is required"));
        }
        for id in [old, new] {
            validate_toolset_id(id)
                .map_err(|err| AliasError::invalid_request(err.to_string()))?;
        }

        if old == new {
            return Err(AliasError::conflict(old, new, "a toolset cannot alias itself"));
        }
        if let Some(existing) = self.target(old) {
            return Err(AliasError::conflict(
                old,
                new,
                format!("`{old}` is already aliased to `{existing}`; remove that alias first"),
            ));
        }
        if let Some(next) = self.target(new) {
            let reason = if next == old {
                format!("`{new}` already aliases `{old}`, which would form a cycle")
            } else {
                format!("`{new}` is itself an alias of `{next}`, which would form a chain")
            };
            return Err(AliasError::conflict(old, new, reason));
        }
        if let Some((source, _)) = self.iter().find(|(_, record)| record.replacement() == old) {
            return Err(AliasError::conflict(
                old,
                new,
                format!("`{source}` already redirects to `{old}`, which would form a chain"),
            ));
        }

        if !toolsets.is_live(new) {
            let reason = if toolsets.contains(new) {
                "replacement toolset is deprecated"
            } else {
                "replacement toolset does not exist"
            };
            return Err(AliasError::InvalidReplacement {
                id: new.clone(),
                reason: reason.to_owned(),
            });
        }

        let removal_date = match removal_date {
            Some(date) if *date < today => {
                return Err(AliasError::invalid_request(format!(
                    "removal date {date} is before the deprecation date {today}"
                )));
            }
            Some(date) => *date,
            None => today
                .checked_add_days(Days::new(u64::from(policy.grace_period_days())))
                .ok_or_else(|| AliasError::invalid_request("grace period overflows the calendar"))?,
        };

        let record = AliasRecord::new(
            today,
            removal_date,
            reason.to_owned(),
            new.clone(),
            policy.migration_guide_path(old, new),
        );
        info!(old, new, %removal_date, "alias created");
        Ok(self.entries.entry(old.clone()).or_insert(record))
    }

    /// Resolves `name` to a live toolset, following at most one alias hop.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::ChainDetected`] when the alias target is itself an
    /// alias and [`AliasError::DanglingAlias`] when it is not live.
    pub fn resolve(&self, name: &str, toolsets: &impl LiveToolsets) -> AliasResult<Resolution> {
        if toolsets.is_live(name) {
            return Ok(Resolution::Resolved {
                id: name.to_owned(),
                warning: None,
            });
        }

        let Some(record) = self.entries.get(name) else {
            debug!(name, "toolset name did not resolve");
            return Ok(Resolution::Unknown {
                name: name.to_owned(),
            });
        };

        let target = record.replacement();
        if self.entries.contains_key(target) && !toolsets.is_live(target) {
            return Err(AliasError::ChainDetected {
                name: name.to_owned(),
                via: target.to_owned(),
            });
        }
        if !toolsets.is_live(target) {
            return Err(AliasError::DanglingAlias {
                name: name.to_owned(),
                target: target.to_owned(),
            });
        }

        warn!(alias = name, replacement = target, removal_date = %record.removal_date(), "deprecated toolset requested");
        Ok(Resolution::Resolved {
            id: target.to_owned(),
            warning: Some(DeprecationWarning::from_record(name, record)),
        })
    }

    /// Deletes the alias for `old`, returning its record.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::NotFound`] when no alias exists.
    pub fn remove(&mut self, old: &str) -> AliasResult<AliasRecord> {
        let record = self.entries.remove(old).ok_or_else(|| AliasError::NotFound {
            old: old.to_owned(),
        })?;
        info!(old, replacement = record.replacement(), "alias removed");
        Ok(record)
    }

    /// Aliases whose removal date has been reached by `today`.
    #[must_use]
    pub fn expired(&self, today: NaiveDate) -> Vec<(&str, &AliasRecord)> {
        self.iter()
            .filter(|(_, record)| record.is_expired(today))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    fn live(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| (*id).to_owned()).collect()
    }

    fn with_old_ui() -> AliasMap {
        let mut map = AliasMap::new();
        map.create(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated UI tools"),
            &AliasPolicy::default(),
            &live(&["ui_elements", "theme"]),
            date("2026-01-02"),
        )
        .unwrap();
        map
    }

    #[test]
    fn create_applies_defaults() {
        let map = with_old_ui();
        let record = map.deprecation_info("old_ui").unwrap();
        assert_eq!(record.deprecated_at(), date("2026-01-02"));
        assert_eq!(record.removal_date(), date("2026-07-01"));
        assert_eq!(record.replacement(), "ui_elements");
        assert_eq!(record.migration_guide(), "docs/migration/old_ui_to_ui_elements.md");
        assert!(map.is_deprecated("old_ui"));
    }

    #[test]
    fn resolve_follows_one_hop_with_warning() {
        let map = with_old_ui();
        let toolsets = live(&["ui_elements", "theme"]);

        let direct = map.resolve("theme", &toolsets).unwrap();
        assert_eq!(direct.id(), Some("theme"));
        assert!(direct.warning().is_none());

        let aliased = map.resolve("old_ui", &toolsets).unwrap();
        assert_eq!(aliased.id(), Some("ui_elements"));
        let warning = aliased.warning().unwrap();
        assert_eq!(warning.reason(), "Consolidated UI tools");
        assert_eq!(warning.removal_date(), date("2026-07-01"));

        assert_eq!(
            map.resolve("nope", &toolsets).unwrap(),
            Resolution::Unknown {
                name: "nope".to_owned()
            }
        );
    }

    #[test]
    fn repointing_is_a_conflict() {
        let mut map = with_old_ui();
        let err = map
            .create(
                &AliasRequest::new("old_ui", "theme", "again"),
                &AliasPolicy::default(),
                &live(&["ui_elements", "theme"]),
                date("2026-01-03"),
            )
            .expect_err("already aliased");
        assert!(matches!(err, AliasError::Conflict { .. }));
        assert_eq!(map.target("old_ui"), Some("ui_elements"));
    }

    #[test]
    fn chains_and_cycles_are_rejected() {
        let mut map = with_old_ui();
        let toolsets = live(&["ui_elements", "theme", "legacy", "older"]);
        let policy = AliasPolicy::default();
        let today = date("2026-01-03");

        let into_alias = AliasRequest::new("legacy", "old_ui", "chain");
        assert!(matches!(
            map.create(&into_alias, &policy, &toolsets, today),
            Err(AliasError::Conflict { .. })
        ));

        let onto_target = AliasRequest::new("ui_elements", "theme", "chain");
        assert!(matches!(
            map.create(&onto_target, &policy, &toolsets, today),
            Err(AliasError::Conflict { .. })
        ));

        let itself = AliasRequest::new("theme", "theme", "cycle");
        assert!(matches!(
            map.create(&itself, &policy, &toolsets, today),
            Err(AliasError::Conflict { .. })
        ));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn request_validation() {
        let mut map = AliasMap::new();
        let toolsets = live(&["ui_elements"]);
        let policy = AliasPolicy::default();
        let today = date("2026-03-01");

        let blank = AliasRequest::new("old_ui", "ui_elements", "  ");
        assert!(matches!(
            map.create(&blank, &policy, &toolsets, today),
            Err(AliasError::InvalidRequest { .. })
        ));

        let past = AliasRequest::new("old_ui", "ui_elements", "why").removal_date(date("2026-02-01"));
        assert!(matches!(
            map.create(&past, &policy, &toolsets, today),
            Err(AliasError::InvalidRequest { .. })
        ));

        let missing = AliasRequest::new("old_ui", "nowhere", "why");
        assert!(matches!(
            map.create(&missing, &policy, &toolsets, today),
            Err(AliasError::InvalidReplacement { .. })
        ));
        assert!(map.is_empty());
    }

    #[test]
    fn resolution_detects_dangling_and_chained_targets() {
        let map = with_old_ui();
        let err = map.resolve("old_ui", &live(&["theme"])).expect_err("dangling");
        assert!(matches!(err, AliasError::DanglingAlias { .. }));

        let mut chained = map.clone();
        chained.entries.insert(
            "ui_elements".to_owned(),
            AliasRecord::new(
                date("2026-01-02"),
                date("2026-07-01"),
                "merged".to_owned(),
                "theme".to_owned(),
                "docs/migration/ui_elements_to_theme.md".to_owned(),
            ),
        );
        let err = chained.resolve("old_ui", &live(&["theme"])).expect_err("chain");
        assert!(matches!(err, AliasError::ChainDetected { .. }));
    }

    #[test]
    fn remove_and_expiry() {
        let mut map = with_old_ui();
        assert!(map.expired(date("2026-06-30")).is_empty());
        assert_eq!(map.expired(date("2026-07-01")).len(), 1);

        let record = map.remove("old_ui").unwrap();
        assert_eq!(record.replacement(), "ui_elements");
        assert!(matches!(map.remove("old_ui"), Err(AliasError::NotFound { .. })));
    }

    #[test]
    fn save_and_load_use_documented_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let map = with_old_ui();
        map.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["aliases"]["old_ui"], "ui_elements");
        assert_eq!(raw["deprecation_metadata"]["old_ui"]["removal_date"], "2026-07-01");

        assert_eq!(AliasMap::load(&path, false).unwrap(), map);
    }

    #[test]
    fn load_handles_missing_and_inconsistent_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        assert!(AliasMap::load(&path, true).unwrap().is_empty());
        assert!(matches!(
            AliasMap::load(&path, false),
            Err(AliasError::Document(PrimitiveError::MissingDocument { .. }))
        ));

        std::fs::write(&path, r#"{"aliases": {"old_ui": "ui_elements"}}"#).unwrap();
        assert!(matches!(
            AliasMap::load(&path, false),
            Err(AliasError::Document(PrimitiveError::MalformedDocument { .. }))
        ));
    }
}
