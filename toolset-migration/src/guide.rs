//! Migration guide and changelog rendering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use toolset_aliases::AliasRecord;
use toolset_primitives::{Toolset, write_atomic};
use tracing::info;

use crate::diff::ToolDiff;
use crate::error::{MigrationError, MigrationResult};
use crate::template::Template;

const GUIDE: Template = Template::new(
    "# Migrating from `{{old_id}}` to `{{new_id}}`

The `{{old_id}}` toolset ({{old_name}}) is deprecated in favour of `{{new_id}}` ({{new_name}}).

**Reason:** {{reason}}

## Timeline

{{timeline}}

## Tool changes

### Unchanged

{{unchanged}}

### Added in `{{new_id}}`

{{added}}

### Removed

{{removed}}

## Updating agent configuration

Before:

```json
{ \"toolsets\": [\"{{old_id}}\"] }
```

After:

```json
{ \"toolsets\": [\"{{new_id}}\"] }
```

{{removed_note}}

## Compatibility

Requests for `{{old_id}}` keep resolving to `{{new_id}}` with a deprecation warning {{until}}.
After that the `{{old_id}}` toolset is deleted from the registry.
",
);

/// When the deprecation takes effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Timeline {
    /// Dates come from an alias record.
    Scheduled {
        /// Alias creation date.
        deprecated_at: NaiveDate,
        /// Earliest removal date.
        removal_date: NaiveDate,
    },
    /// No alias exists yet.
    Unscheduled,
}

impl Timeline {
    fn render(self) -> String {
        match self {
            Self::Scheduled {
                deprecated_at,
                removal_date,
            } => format!("- Deprecated: {deprecated_at}\n- Removal: {removal_date}"),
            Self::Unscheduled => "- Deprecated: not yet scheduled\n- Removal: not yet scheduled".to_owned(),
        }
    }

    fn until(self) -> String {
        match self {
            Self::Scheduled { removal_date, .. } => format!("until {removal_date}"),
            Self::Unscheduled => "until the removal date, which is not yet scheduled".to_owned(),
        }
    }
}

/// Everything needed to document one deprecation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MigrationGuide {
    old_id: String,
    old_name: String,
    new_id: String,
    new_name: String,
    reason: String,
    timeline: Timeline,
    guide_path: String,
    diff: ToolDiff,
}

impl MigrationGuide {
    /// Prepares a guide for moving from `old` to `new`.
    ///
    /// Timeline and guide path come from `alias` when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::InvalidRequest`] when both toolsets are the
    /// same or the reason is blank.
    pub fn new(
        old: &Toolset,
        new: &Toolset,
        reason: &str,
        alias: Option<&AliasRecord>,
    ) -> MigrationResult<Self> {
        if old.id() == new.id() {
            return Err(MigrationError::InvalidRequest {
                reason: format!("`{}` cannot migrate to itself", old.id()),
            });
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MigrationError::InvalidRequest {
                reason: "a deprecation reason is required".to_owned(),
            });
        }

        let (timeline, guide_path) = match alias {
            Some(record) => (
                Timeline::Scheduled {
                    deprecated_at: record.deprecated_at(),
                    removal_date: record.removal_date(),
                },
                record.migration_guide().to_owned(),
            ),
            None => (Timeline::Unscheduled, file_name(old.id(), new.id())),
        };

        Ok(Self {
            old_id: old.id().to_owned(),
            old_name: old.name().to_owned(),
            new_id: new.id().to_owned(),
            new_name: new.name().to_owned(),
            reason: reason.to_owned(),
            timeline,
            guide_path,
            diff: ToolDiff::between(old, new),
        })
    }

    /// Tool partition.
    #[must_use]
    pub fn diff(&self) -> &ToolDiff {
        &self.diff
    }

    /// Deprecation timeline.
    #[must_use]
    pub const fn timeline(&self) -> Timeline {
        self.timeline
    }

    /// `<old>_to_<new>.md`.
    #[must_use]
    pub fn file_name(&self) -> String {
        file_name(&self.old_id, &self.new_id)
    }

    /// Renders the Markdown guide.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::MissingVariable`] only if the built-in
    /// template and its variables drift apart.
    pub fn render(&self) -> MigrationResult<String> {
        let removed_note = if self.diff.removed().is_empty() {
            "Every tool of the retired toolset is still available.".to_owned()
        } else {
            format!(
                "Agents calling {} must switch to an alternative, as these tools are not part of `{}`.",
                inline_list(self.diff.removed()),
                self.new_id
            )
        };

        let values = BTreeMap::from([
            ("old_id", self.old_id.clone()),
            ("old_name", self.old_name.clone()),
            ("new_id", self.new_id.clone()),
            ("new_name", self.new_name.clone()),
            ("reason", self.reason.clone()),
            ("timeline", self.timeline.render()),
            ("unchanged", bullet_list(self.diff.unchanged())),
            ("added", bullet_list(self.diff.added())),
            ("removed", bullet_list(self.diff.removed())),
            ("removed_note", removed_note),
            ("until", self.timeline.until()),
        ]);
        GUIDE.render(&values)
    }

    /// One-paragraph changelog entry.
    #[must_use]
    pub fn changelog_entry(&self) -> String {
        let mut entry = format!(
            "- Deprecated `{}` in favour of `{}`: {}.",
            self.old_id,
            self.new_id,
            self.reason.trim_end_matches('.')
        );
        if !self.diff.added().is_empty() {
            entry.push_str(&format!(" Added tools: {}.", inline_list(self.diff.added())));
        }
        if !self.diff.removed().is_empty() {
            entry.push_str(&format!(" Removed tools: {}.", inline_list(self.diff.removed())));
        }
        match self.timeline {
            Timeline::Scheduled { removal_date, .. } => entry.push_str(&format!(
                " `{}` keeps resolving with a warning until {removal_date}.",
                self.old_id
            )),
            Timeline::Unscheduled => entry.push_str(&format!(
                " `{}` keeps resolving with a warning until its removal date.",
                self.old_id
            )),
        }
        entry.push_str(&format!(" See {}.", self.guide_path));
        entry
    }

    /// Renders the guide into `<dir>/<old>_to_<new>.md`, replacing any
    /// previous version atomically.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Document`] when writing fails.
    pub fn write_to(&self, dir: &Path) -> MigrationResult<PathBuf> {
        let path = dir.join(self.file_name());
        let text = self.render()?;
        write_atomic(&path, text.as_bytes())?;
        info!(
            old = self.old_id.as_str(),
            new = self.new_id.as_str(),
            path = %path.display(),
            "migration guide written"
        );
        Ok(path)
    }
}

fn file_name(old: &str, new: &str) -> String {
    format!("{old}_to_{new}.md")
}

fn bullet_list(tools: &[String]) -> String {
    if tools.is_empty() {
        return "_None._".to_owned();
    }
    tools
        .iter()
        .map(|tool| format!("- `{tool}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn inline_list(tools: &[String]) -> String {
    tools
        .iter()
        .map(|tool| format!("`{tool}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use toolset_aliases::{AliasMap, AliasPolicy, AliasRequest};

    use super::*;

    fn toolsets() -> (Toolset, Toolset) {
        (
            Toolset::builder("old_ui")
                .name("Legacy UI")
                .tools(["a", "b"])
                .build()
                .unwrap(),
            Toolset::builder("ui_elements")
                .name("UI Elements")
                .tools(["b", "c"])
                .build()
                .unwrap(),
        )
    }

    fn alias() -> AliasMap {
        let live: BTreeSet<String> = ["ui_elements".to_owned()].into();
        let mut map = AliasMap::new();
        map.create(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated"),
            &AliasPolicy::default(),
            &live,
            "2026-01-02".parse().unwrap(),
        )
        .unwrap();
        map
    }

    #[test]
    fn guide_lists_partitions_and_schedule() {
        let (old, new) = toolsets();
        let aliases = alias();
        let guide = MigrationGuide::new(&old, &new, "Consolidated", aliases.deprecation_info("old_ui")).unwrap();
        let text = guide.render().unwrap();

        assert!(text.starts_with("# Migrating from `old_ui` to `ui_elements`"));
        assert!(text.contains("### Unchanged\n\n- `b`\n"));
        assert!(text.contains("### Added in `ui_elements`\n\n- `c`\n"));
        assert!(text.contains("### Removed\n\n- `a`\n"));
        assert!(text.contains("- Removal: 2026-07-01"));
        assert!(text.contains("until 2026-07-01"));
        assert!(!text.contains("{{"));
    }

    #[test]
    fn unscheduled_guide_is_idempotent() {
        let (old, new) = toolsets();
        let first = MigrationGuide::new(&old, &new, "Consolidated", None).unwrap();
        let second = MigrationGuide::new(&old, &new, "Consolidated", None).unwrap();
        assert_eq!(first.render().unwrap(), second.render().unwrap());
        assert!(first.render().unwrap().contains("not yet scheduled"));
        assert_eq!(first.timeline(), Timeline::Unscheduled);
    }

    #[test]
    fn changelog_entry_summarises() {
        let (old, new) = toolsets();
        let aliases = alias();
        let guide = MigrationGuide::new(&old, &new, "Consolidated.", aliases.deprecation_info("old_ui")).unwrap();
        assert_eq!(
            guide.changelog_entry(),
            "- Deprecated `old_ui` in favour of `ui_elements`: Consolidated. Added tools: `c`. \
             Removed tools: `a`. `old_ui` keeps resolving with a warning until 2026-07-01. \
             See docs/migration/old_ui_to_ui_elements.md."
        );
    }

    #[test]
    fn rejects_degenerate_requests() {
        let (old, new) = toolsets();
        assert!(MigrationGuide::new(&old, &old, "why", None).is_err());
        assert!(MigrationGuide::new(&old, &new, " ", None).is_err());
    }

    #[test]
    fn write_to_replaces_existing_guide() {
        let dir = tempfile::tempdir().unwrap();
        let (old, new) = toolsets();
        let guide = MigrationGuide::new(&old, &new, "Consolidated", None).unwrap();

        let path = guide.write_to(dir.path()).unwrap();
        let path_again = guide.write_to(dir.path()).unwrap();
        assert_eq!(path, path_again);
        assert!(path.ends_with("old_ui_to_ui_elements.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), guide.render().unwrap());
    }
}
