//! Differences between discovered tool groups and the registry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use toolset_extractor::Extraction;
use toolset_primitives::RegistryDocument;
use tracing::debug;

/// One detected difference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// An inferred group has no registry toolset.
    New {
        /// Inferred toolset id.
        id: String,
        /// Tools discovered for it.
        tools: Vec<String>,
    },
    /// A live toolset's tools differ from the inferred group.
    Modified {
        /// Toolset id.
        id: String,
        /// Tools discovered but not registered.
        added: Vec<String>,
        /// Tools registered but no longer discovered in this group.
        removed: Vec<String>,
    },
    /// A live toolset has no inferred counterpart.
    Removed {
        /// Toolset id.
        id: String,
    },
}

impl Change {
    /// Toolset id the change concerns.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::New { id, .. } | Self::Modified { id, .. } | Self::Removed { id } => id,
        }
    }
}

impl Display for Change {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::New { id, tools } => write!(f, "new       {id}: {}", tools.join(", ")),
            Self::Modified { id, added, removed } => {
                write!(f, "modified  {id}:")?;
                if !added.is_empty() {
                    write!(f, " +[{}]", added.join(", "))?;
                }
                if !removed.is_empty() {
                    write!(f, " -[{}]", removed.join(", "))?;
                }
                Ok(())
            }
            Self::Removed { id } => write!(f, "removed   {id}"),
        }
    }
}

/// Changes ordered by toolset id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Detected changes.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns `true` when the registry matches the extraction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl Display for ChangeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.changes.is_empty() {
            return writeln!(f, "no changes detected");
        }
        writeln!(f, "{} change(s) detected", self.changes.len())?;
        for change in &self.changes {
            writeln!(f, "  {change}")?;
        }
        Ok(())
    }
}

/// Compares the extraction's inferred groups with `document`.
///
/// Deprecated toolsets are frozen: they are never reported as removed or
/// modified, and an inferred group sharing a deprecated id is not new.
#[must_use]
pub fn detect_changes(extraction: &Extraction, document: &RegistryDocument) -> ChangeSet {
    let mut by_id: BTreeMap<&str, Change> = BTreeMap::new();

    for (id, discovered) in extraction.groups() {
        match document.get(id) {
            None => {
                by_id.insert(
                    id,
                    Change::New {
                        id: id.clone(),
                        tools: discovered.iter().cloned().collect(),
                    },
                );
            }
            Some(toolset) if toolset.is_live() => {
                let registered: BTreeSet<&str> = toolset.tools().iter().map(String::as_str).collect();
                let added: Vec<String> = discovered
                    .iter()
                    .filter(|tool| !registered.contains(tool.as_str()))
                    .cloned()
                    .collect();
                let removed: Vec<String> = registered
                    .iter()
                    .filter(|tool| !discovered.contains(**tool))
                    .map(|tool| (*tool).to_owned())
                    .collect();
                if !added.is_empty() || !removed.is_empty() {
                    by_id.insert(
                        id,
                        Change::Modified {
                            id: id.clone(),
                            added,
                            removed,
                        },
                    );
                }
            }
            Some(_) => {}
        }
    }

    for toolset in document.live() {
        if !extraction.groups().contains_key(toolset.id()) {
            by_id.entry(toolset.id()).or_insert_with(|| Change::Removed {
                id: toolset.id().to_owned(),
            });
        }
    }

    let changes: Vec<Change> = by_id.into_values().collect();
    debug!(changes = changes.len(), "change detection finished");
    ChangeSet { changes }
}
