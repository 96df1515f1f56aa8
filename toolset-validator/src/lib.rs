//! Structural validation of the toolset registry.
//!
//! [`Validator::validate`] runs five check categories in a fixed order and
//! never stops at the first problem:
//!
//! 1. schema: each raw entry against a JSON Schema (draft 7)
//! 2. naming: id and tool name rules
//! 3. reference: tools, `requires` targets, replacements, alias targets
//! 4. uniqueness: duplicate ids
//! 5. cycle: `requires` graph acyclicity
//!
//! Entries that fail the schema are left out of categories 2 to 5. The
//! resulting [`ValidationReport`] is deterministic for identical input.

#![warn(missing_docs, clippy::pedantic)]

mod checks;
mod error;
mod graph;
mod report;

use std::fmt;
use std::path::Path;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use toolset_aliases::AliasMap;
use toolset_extractor::Extraction;
use toolset_primitives::{Toolset, read_json_document};
use tracing::{debug, info};

pub use error::{ValidatorError, ValidatorResult};
pub use report::{ValidationReport, Violation, ViolationKind};

/// The embedded structural schema for one toolset entry.
pub const TOOLSET_SCHEMA: &str = include_str!("../schema/toolset.schema.json");

/// What a validation run looks at.
#[derive(Clone, Copy, Debug)]
pub struct ValidationInput<'a> {
    entries: &'a [Value],
    extraction: Option<&'a Extraction>,
    aliases: Option<&'a AliasMap>,
}

impl<'a> ValidationInput<'a> {
    /// Validates raw registry entries on their own.
    #[must_use]
    pub fn new(entries: &'a [Value]) -> Self {
        Self {
            entries,
            extraction: None,
            aliases: None,
        }
    }

    /// Also checks every listed tool against discovered declarations and
    /// carries the extraction's parse failures into the report.
    #[must_use]
    pub fn with_extraction(mut self, extraction: &'a Extraction) -> Self {
        self.extraction = Some(extraction);
        self
    }

    /// Resolves references through `aliases` and checks alias integrity.
    #[must_use]
    pub fn with_aliases(mut self, aliases: &'a AliasMap) -> Self {
        self.aliases = Some(aliases);
        self
    }
}

/// Compiled validator.
pub struct Validator {
    schema: JSONSchema,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

impl Validator {
    /// Creates a validator using the embedded schema.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Schema`] if the embedded schema fails to
    /// compile.
    pub fn new() -> ValidatorResult<Self> {
        let schema: Value =
            serde_json::from_str(TOOLSET_SCHEMA).map_err(|err| ValidatorError::Schema {
                origin: "embedded".to_owned(),
                reason: err.to_string(),
            })?;
        Self::with_schema(&schema, "embedded")
    }

    /// Creates a validator from a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Document`] when the file is missing or not
    /// JSON and [`ValidatorError::Schema`] when it does not compile.
    pub fn from_schema_file(path: &Path) -> ValidatorResult<Self> {
        let schema = read_json_document(path)?;
        Self::with_schema(&schema, &path.display().to_string())
    }

    /// Creates a validator from an in-memory schema document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Schema`] when the schema does not compile.
    pub fn with_schema(schema: &Value, origin: &str) -> ValidatorResult<Self> {
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|err| ValidatorError::Schema {
                origin: origin.to_owned(),
                reason: err.to_string(),
            })?;
        debug!(origin, "toolset schema compiled");
        Ok(Self { schema })
    }

    /// Runs every check and returns all violations found.
    #[must_use]
    pub fn validate(&self, input: &ValidationInput<'_>) -> ValidationReport {
        let mut violations = Vec::new();
        let toolsets = self.check_schema(input.entries, &mut violations);

        let catalog = checks::Catalog::new(&toolsets);
        checks::naming(&catalog, &mut violations);
        checks::references(&catalog, input.extraction, input.aliases, &mut violations);
        checks::uniqueness(&catalog, &mut violations);
        checks::cycles(&catalog, input.aliases, &mut violations);

        let parse_failures = input
            .extraction
            .map(|extraction| extraction.failures().to_vec())
            .unwrap_or_default();
        let report = ValidationReport::new(violations, parse_failures);
        info!(
            entries = input.entries.len(),
            violations = report.violations().len(),
            parse_failures = report.parse_failures().len(),
            valid = report.is_valid(),
            "registry validated"
        );
        report
    }

    fn check_schema(&self, entries: &[Value], out: &mut Vec<Violation>) -> Vec<Toolset> {
        let mut toolsets = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let subject = entry_label(index, entry);

            if let Err(errors) = self.schema.validate(entry) {
                let mut messages: Vec<String> = errors.map(|err| err.to_string()).collect();
                messages.sort();
                messages.dedup();
                out.extend(
                    messages
                        .into_iter()
                        .map(|message| Violation::new(ViolationKind::Schema, subject.clone(), message)),
                );
                continue;
            }

            match serde_json::from_value::<Toolset>(entry.clone()) {
                Ok(toolset) => toolsets.push(toolset),
                Err(err) => out.push(Violation::new(
                    ViolationKind::Schema,
                    subject,
                    format!("entry does not describe a toolset: {err}"),
                )),
            }
        }
        toolsets
    }
}

/// Names an entry by its id when it has one, otherwise by position.
fn entry_label(index: usize, entry: &Value) -> String {
    entry
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map_or_else(|| format!("toolsets[{index}]"), str::to_owned)
}
