//! File-backed registry store.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use toolset_aliases::AliasMap;
use toolset_extractor::Extraction;
use toolset_primitives::{
    Error as PrimitiveError, RegistryDocument, Toolset, read_json_document, write_json_atomic,
};
use toolset_validator::{ValidationInput, ValidationReport, Validator};
use tracing::{debug, info, warn};

use crate::error::{RegistryError, RegistryResult};

/// Extra context a commit validates against.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommitOptions<'a> {
    aliases: Option<&'a AliasMap>,
    extraction: Option<&'a Extraction>,
}

impl<'a> CommitOptions<'a> {
    /// Resolves references through `aliases` and checks alias integrity.
    #[must_use]
    pub fn aliases(mut self, aliases: &'a AliasMap) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Checks listed tools against discovered declarations.
    #[must_use]
    pub fn extraction(mut self, extraction: &'a Extraction) -> Self {
        self.extraction = Some(extraction);
        self
    }
}

#[derive(Serialize)]
struct StoredDocument<'a> {
    revision: u64,
    toolsets: &'a [Value],
    #[serde(flatten)]
    rest: &'a Map<String, Value>,
}

/// The registry document as loaded from disk.
///
/// Entries are kept as raw JSON so that validation can report schema problems
/// per entry. Top-level keys other than `revision` and `toolsets` are written
/// back unchanged. Writes happen only through [`Registry::commit`].
#[derive(Clone, Debug)]
pub struct Registry {
    path: PathBuf,
    revision: u64,
    entries: Vec<Value>,
    rest: Map<String, Value>,
}

impl Registry {
    /// Loads the registry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Document`] when the file is missing, is not
    /// JSON, lacks a `toolsets` array, or has a non-integer `revision`.
    pub fn load(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();
        let value = read_json_document(&path)?;
        let malformed = |reason: &str| PrimitiveError::MalformedDocument {
            path: path.clone(),
            reason: reason.to_owned(),
        };

        let Value::Object(mut object) = value else {
            return Err(malformed("expected a JSON object with a `toolsets` array").into());
        };
        let Some(Value::Array(entries)) = object.remove("toolsets") else {
            return Err(malformed("missing `toolsets` array").into());
        };
        let revision = match object.remove("revision") {
            None => 0,
            Some(value) => value
                .as_u64()
                .ok_or_else(|| malformed("`revision` must be a non-negative integer"))?,
        };

        info!(path = %path.display(), revision, toolsets = entries.len(), "registry loaded");
        Ok(Self {
            path,
            revision,
            entries,
            rest: object,
        })
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Revision of the last successful commit.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Raw toolset entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// Parses every entry, skipping the ones that are not toolsets.
    ///
    /// Suitable for read-only queries; use [`Registry::document`] before
    /// making changes.
    #[must_use]
    pub fn snapshot(&self) -> RegistryDocument {
        let toolsets = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match parse_entry(index, entry) {
                Ok(toolset) => Some(toolset),
                Err(err) => {
                    warn!(%err, "skipping unreadable registry entry");
                    None
                }
            })
            .collect();
        RegistryDocument::with_revision(self.revision, toolsets)
    }

    /// Parses every entry, failing on the first one that is not a toolset.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnreadableEntry`] for an entry that does not
    /// deserialize.
    pub fn document(&self) -> RegistryResult<RegistryDocument> {
        let toolsets = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_entry(index, entry))
            .collect::<RegistryResult<Vec<_>>>()?;
        Ok(RegistryDocument::with_revision(self.revision, toolsets))
    }

    /// Validates the current entries without writing anything.
    #[must_use]
    pub fn validate(&self, validator: &Validator, options: CommitOptions<'_>) -> ValidationReport {
        validator.validate(&input(&self.entries, options))
    }

    /// Validates `candidate` the way [`Registry::commit`] would, without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Rejected`] with the full report when any
    /// violation is found, and [`RegistryError::Document`] when encoding
    /// fails.
    pub fn check(
        &self,
        candidate: &RegistryDocument,
        validator: &Validator,
        options: CommitOptions<'_>,
    ) -> RegistryResult<ValidationReport> {
        let entries = encode(candidate)?;
        self.accept(&entries, validator, options)
    }

    /// Validates `candidate` and, when it is clean, atomically replaces the
    /// stored document with it under the next revision.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Rejected`] with the full report when any
    /// violation is found (nothing is written), and
    /// [`RegistryError::Document`] when encoding or writing fails.
    pub fn commit(
        &mut self,
        candidate: &RegistryDocument,
        validator: &Validator,
        options: CommitOptions<'_>,
    ) -> RegistryResult<ValidationReport> {
        let entries = encode(candidate)?;
        self.commit_entries(entries, validator, options)
    }

    /// Like [`Registry::commit`] but takes raw entries.
    ///
    /// # Errors
    ///
    /// See [`Registry::commit`].
    pub fn commit_entries(
        &mut self,
        entries: Vec<Value>,
        validator: &Validator,
        options: CommitOptions<'_>,
    ) -> RegistryResult<ValidationReport> {
        let report = self.accept(&entries, validator, options)?;
        let revision = self.revision.saturating_add(1);
        write_json_atomic(
            &self.path,
            &StoredDocument {
                revision,
                toolsets: &entries,
                rest: &self.rest,
            },
        )?;
        self.revision = revision;
        self.entries = entries;
        info!(path = %self.path.display(), revision, "registry committed");
        Ok(report)
    }

    fn accept(
        &self,
        entries: &[Value],
        validator: &Validator,
        options: CommitOptions<'_>,
    ) -> RegistryResult<ValidationReport> {
        let report = validator.validate(&input(entries, options));
        if report.is_valid() {
            return Ok(report);
        }
        warn!(
            path = %self.path.display(),
            violations = report.violations().len(),
            "commit rejected"
        );
        Err(RegistryError::Rejected {
            report: Box::new(report),
        })
    }
}

fn encode(document: &RegistryDocument) -> RegistryResult<Vec<Value>> {
    let entries = document
        .toolsets()
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(PrimitiveError::from)?;
    Ok(entries)
}

fn input<'a>(entries: &'a [Value], options: CommitOptions<'a>) -> ValidationInput<'a> {
    let mut input = ValidationInput::new(entries);
    if let Some(aliases) = options.aliases {
        input = input.with_aliases(aliases);
    }
    if let Some(extraction) = options.extraction {
        input = input.with_extraction(extraction);
    }
    input
}

fn parse_entry(index: usize, entry: &Value) -> RegistryResult<Toolset> {
    serde_json::from_value(entry.clone()).map_err(|err| {
        let subject = entry
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| format!("toolsets[{index}]"), |id| format!("`{id}`"));
        debug!(%subject, %err, "registry entry failed to parse");
        RegistryError::UnreadableEntry {
            subject,
            reason: err.to_string(),
        }
    })
}
