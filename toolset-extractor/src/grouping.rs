//! Rule table that buckets tool names into candidate toolsets.

use std::fmt;

use toolset_primitives::validate_toolset_id;

use crate::error::{ExtractorError, ExtractorResult};

/// Bucket used when no rule matches.
pub const DEFAULT_FALLBACK_BUCKET: &str = "general";

/// Built-in `(bucket, needles)` pairs for agent UI tool sources, in
/// evaluation order.
pub const DEFAULT_RULES: [(&str, &[&str]); 6] = [
    ("ui_elements", &["ui_element", "canvas"]),
    ("charts", &["chart", "visualization"]),
    ("theme", &["theme"]),
    ("code_editing", &["component", "build_check"]),
    ("collections", &["collection"]),
    ("skills", &["skill"]),
];

/// Predicate deciding whether a tool name belongs to a bucket.
pub trait ToolMatcher: Send + Sync {
    /// Returns `true` when `tool` matches.
    fn matches(&self, tool: &str) -> bool;
}

impl<F> ToolMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, tool: &str) -> bool {
        self(tool)
    }
}

/// Case-insensitive substring matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainsAny {
    needles: Vec<String>,
}

impl ContainsAny {
    /// Creates a matcher accepting names that contain any of `needles`.
    ///
    /// Blank needles are ignored.
    #[must_use]
    pub fn new<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let needles = needles
            .into_iter()
            .map(|needle| needle.as_ref().trim().to_lowercase())
            .filter(|needle| !needle.is_empty())
            .collect();
        Self { needles }
    }

    /// Returns the normalised needles.
    #[must_use]
    pub fn needles(&self) -> &[String] {
        &self.needles
    }
}

impl ToolMatcher for ContainsAny {
    fn matches(&self, tool: &str) -> bool {
        let tool = tool.to_lowercase();
        self.needles.iter().any(|needle| tool.contains(needle.as_str()))
    }
}

/// A matcher paired with the bucket it fills.
pub struct GroupingRule {
    bucket: String,
    matcher: Box<dyn ToolMatcher>,
}

impl GroupingRule {
    /// Creates a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::InvalidRule`] when `bucket` is not a valid
    /// toolset id.
    pub fn new(bucket: impl Into<String>, matcher: impl ToolMatcher + 'static) -> ExtractorResult<Self> {
        let bucket = checked_bucket(bucket.into())?;
        Ok(Self {
            bucket,
            matcher: Box::new(matcher),
        })
    }

    /// Convenience constructor for a [`ContainsAny`] rule.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::InvalidRule`] when the bucket is invalid or
    /// no usable needle is supplied.
    pub fn contains_any<I, S>(bucket: impl Into<String>, needles: I) -> ExtractorResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bucket = bucket.into();
        let matcher = ContainsAny::new(needles);
        if matcher.needles().is_empty() {
            return Err(ExtractorError::InvalidRule {
                bucket,
                reason: "at least one non-blank substring is required".to_owned(),
            });
        }
        Self::new(bucket, matcher)
    }

    /// Returns the bucket populated by this rule.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns `true` when the rule accepts `tool`.
    #[must_use]
    pub fn matches(&self, tool: &str) -> bool {
        self.matcher.matches(tool)
    }
}

impl fmt::Debug for GroupingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupingRule")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

/// Ordered rules evaluated first-match-wins, with a fallback bucket.
#[derive(Debug)]
pub struct GroupingTable {
    rules: Vec<GroupingRule>,
    fallback: String,
}

impl GroupingTable {
    /// Creates an empty table sending every tool to `fallback`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::InvalidRule`] when `fallback` is not a valid
    /// toolset id.
    pub fn new(fallback: impl Into<String>) -> ExtractorResult<Self> {
        Ok(Self {
            rules: Vec::new(),
            fallback: checked_bucket(fallback.into())?,
        })
    }

    /// Appends a rule, returning the table.
    #[must_use]
    pub fn with_rule(mut self, rule: GroupingRule) -> Self {
        self.push(rule);
        self
    }

    /// Appends a rule after the existing ones.
    pub fn push(&mut self, rule: GroupingRule) {
        self.rules.push(rule);
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[GroupingRule] {
        &self.rules
    }

    /// Returns the fallback bucket.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Returns the bucket for `tool`.
    #[must_use]
    pub fn classify(&self, tool: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(tool))
            .map_or(self.fallback.as_str(), GroupingRule::bucket)
    }

    /// The table built from [`DEFAULT_RULES`] with the `general` fallback.
    #[must_use]
    pub fn defaults() -> Self {
        let rules = DEFAULT_RULES
            .into_iter()
            .map(|(bucket, needles)| GroupingRule {
                bucket: bucket.to_owned(),
                matcher: Box::new(ContainsAny::new(needles.iter().copied())),
            })
            .collect();
        Self {
            rules,
            fallback: DEFAULT_FALLBACK_BUCKET.to_owned(),
        }
    }
}

impl Default for GroupingTable {
    fn default() -> Self {
        Self::defaults()
    }
}

fn checked_bucket(bucket: String) -> ExtractorResult<String> {
    match validate_toolset_id(&bucket) {
        Ok(()) => Ok(bucket),
        Err(err) => Err(ExtractorError::InvalidRule {
            reason: err.to_string(),
            bucket,
        }),
    }
}
