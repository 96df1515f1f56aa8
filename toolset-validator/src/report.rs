//! Validation reports.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use toolset_extractor::ParseFailure;

/// Category of a violation, in reporting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Entry does not match the structural schema.
    Schema,
    /// Identifier or tool name breaks the naming rules.
    Naming,
    /// A referenced tool, toolset, or alias target does not resolve.
    Reference,
    /// Two toolsets share an id.
    Uniqueness,
    /// The `requires` graph has a cycle.
    Cycle,
}

impl ViolationKind {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Naming => "naming",
            Self::Reference => "reference",
            Self::Uniqueness => "uniqueness",
            Self::Cycle => "cycle",
        }
    }
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structural problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    kind: ViolationKind,
    subject: String,
    message: String,
}

impl Violation {
    /// Creates a violation about `subject`, usually a toolset id.
    #[must_use]
    pub fn new(kind: ViolationKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Violation category.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Toolset id, alias source, or entry label the violation is about.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

/// Every violation found in one validation run, plus extraction diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    valid: bool,
    violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parse_failures: Vec<ParseFailure>,
}

impl ValidationReport {
    pub(crate) fn new(violations: Vec<Violation>, parse_failures: Vec<ParseFailure>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
            parse_failures,
        }
    }

    /// Returns `true` when no violation was found.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns `true` when valid and the extraction parsed cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.valid && self.parse_failures.is_empty()
    }

    /// Violations in reporting order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations of one category.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |violation| violation.kind == kind)
    }

    /// Parse failures carried over from the extraction.
    #[must_use]
    pub fn parse_failures(&self) -> &[ParseFailure] {
        &self.parse_failures
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            writeln!(f, "registry is valid")?;
        } else {
            writeln!(f, "registry is invalid: {} violation(s)", self.violations.len())?;
            for violation in &self.violations {
                writeln!(f, "  {violation}")?;
            }
        }
        if !self.parse_failures.is_empty() {
            writeln!(f, "{} parse failure(s):", self.parse_failures.len())?;
            for failure in &self.parse_failures {
                writeln!(f, "  {failure}")?;
            }
        }
        Ok(())
    }
}
