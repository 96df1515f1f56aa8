//! Extraction results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Where a tool declaration was found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    origin: String,
    line: usize,
}

impl SourceLocation {
    /// Creates a location from an origin label and a 1-based line number.
    #[must_use]
    pub fn new(origin: impl Into<String>, line: usize) -> Self {
        Self {
            origin: origin.into(),
            line,
        }
    }

    /// Returns the origin label, usually a file path.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the 1-based line number.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.line)
    }
}

/// A portion of the source the scanner could not make sense of.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    reason: String,
}

impl ParseFailure {
    /// Creates a parse failure.
    #[must_use]
    pub fn new(origin: impl Into<String>, line: Option<usize>, reason: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Returns the origin label.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the line where the failure starts, when known.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        self.line
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for ParseFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}: {}", self.origin, self.reason),
            None => write!(f, "{}: {}", self.origin, self.reason),
        }
    }
}

/// Tools discovered in one or more sources, with their inferred grouping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    tools: BTreeMap<String, SourceLocation>,
    groups: BTreeMap<String, BTreeSet<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<ParseFailure>,
}

impl Extraction {
    /// Returns discovered tool names mapped to their first declaration.
    #[must_use]
    pub fn tools(&self) -> &BTreeMap<String, SourceLocation> {
        &self.tools
    }

    /// Returns inferred toolset ids mapped to their tool names.
    #[must_use]
    pub fn groups(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.groups
    }

    /// Returns the parse failures encountered.
    #[must_use]
    pub fn failures(&self) -> &[ParseFailure] {
        &self.failures
    }

    /// Returns `true` when no parse failure was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns `true` when `tool` has a discovered declaration.
    #[must_use]
    pub fn contains_tool(&self, tool: &str) -> bool {
        self.tools.contains_key(tool)
    }

    /// Records a tool; the first location seen for a name is kept.
    pub fn record_tool(&mut self, name: &str, location: SourceLocation, bucket: &str) {
        self.tools.entry(name.to_owned()).or_insert(location);
        self.groups
            .entry(bucket.to_owned())
            .or_default()
            .insert(name.to_owned());
    }

    /// Records a parse failure.
    pub fn record_failure(&mut self, failure: ParseFailure) {
        self.failures.push(failure);
    }

    /// Folds `other` into `self`, keeping existing locations on conflict.
    pub fn merge(&mut self, other: Extraction) {
        for (name, location) in other.tools {
            self.tools.entry(name).or_insert(location);
        }
        for (bucket, tools) in other.groups {
            self.groups.entry(bucket).or_default().extend(tools);
        }
        self.failures.extend(other.failures);
    }
}
