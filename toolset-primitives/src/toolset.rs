//! Toolset model: a named grouping of tool identifiers with lifecycle metadata.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::naming::{validate_tool_name, validate_toolset_id};

/// Lifecycle status of a toolset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolsetStatus {
    /// Generally available.
    #[default]
    Active,
    /// Retired in favour of a replacement; resolvable only through an alias.
    Deprecated,
    /// Early preview, may change without notice.
    Experimental,
    /// Feature complete but still stabilising.
    Beta,
}

impl ToolsetStatus {
    /// All statuses in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::Deprecated,
        Self::Experimental,
        Self::Beta,
    ];

    /// Returns `true` for every status except [`ToolsetStatus::Deprecated`].
    #[must_use]
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Deprecated)
    }

    /// Returns the wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deprecated => "deprecated",
            Self::Experimental => "experimental",
            Self::Beta => "beta",
        }
    }
}

impl Display for ToolsetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolsetStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidToolset {
                reason: format!(
                    "unknown status `{s}`; expected one of active, deprecated, experimental, beta"
                ),
            })
    }
}

/// Deprecation record stored on a deprecated toolset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationNotice {
    superseded_by: String,
}

impl DeprecationNotice {
    /// Creates a notice pointing at the replacement toolset.
    #[must_use]
    pub fn new(superseded_by: impl Into<String>) -> Self {
        Self {
            superseded_by: superseded_by.into(),
        }
    }

    /// Returns the identifier of the replacement toolset.
    #[must_use]
    pub fn superseded_by(&self) -> &str {
        &self.superseded_by
    }
}

/// Lifecycle and dependency metadata attached to a toolset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsetMetadata {
    #[serde(default)]
    status: ToolsetStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    related_toolsets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deprecated: Option<DeprecationNotice>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ToolsetMetadata {
    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ToolsetStatus {
        self.status
    }

    /// Returns the identifiers of toolsets this one structurally depends on.
    #[must_use]
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// Returns identifiers used for documentation cross-linking only.
    #[must_use]
    pub fn related_toolsets(&self) -> &[String] {
        &self.related_toolsets
    }

    /// Returns the deprecation record, present only on deprecated toolsets.
    #[must_use]
    pub fn deprecated(&self) -> Option<&DeprecationNotice> {
        self.deprecated.as_ref()
    }

    /// Author-written metadata keys the model does not interpret, kept
    /// verbatim across rewrites.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// A named, versioned grouping of tool identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolset {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    default: bool,
    tools: Vec<String>,
    #[serde(default)]
    metadata: ToolsetMetadata,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Toolset {
    /// Starts building a [`Toolset`].
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ToolsetBuilder {
        ToolsetBuilder {
            id: id.into(),
            name: None,
            description: String::new(),
            category: None,
            default: false,
            tools: Vec::new(),
            status: ToolsetStatus::Active,
            requires: Vec::new(),
            related_toolsets: Vec::new(),
            superseded_by: None,
        }
    }

    /// Returns the unique toolset identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the optional category label.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns `true` when agents enable this toolset by default.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.default
    }

    /// Returns the ordered tool names.
    #[must_use]
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    /// Returns the lifecycle metadata.
    #[must_use]
    pub fn metadata(&self) -> &ToolsetMetadata {
        &self.metadata
    }

    /// Entry keys outside the model, kept verbatim across rewrites.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Shorthand for `metadata().status()`.
    #[must_use]
    pub const fn status(&self) -> ToolsetStatus {
        self.metadata.status
    }

    /// Returns `true` when the toolset is not deprecated.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.metadata.status.is_live()
    }

    /// Returns `true` when `tool` is part of this toolset.
    #[must_use]
    pub fn contains_tool(&self, tool: &str) -> bool {
        self.tools.iter().any(|candidate| candidate == tool)
    }

    /// Moves the toolset to another non-deprecated status.
    ///
    /// Deprecation goes through [`Toolset::deprecate`] so that the replacement
    /// is always recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolset`] when `status` is
    /// [`ToolsetStatus::Deprecated`].
    pub fn set_status(&mut self, status: ToolsetStatus) -> Result<()> {
        if !status.is_live() {
            return Err(Error::InvalidToolset {
                reason: format!(
                    "toolset `{}` can only be deprecated together with a replacement",
                    self.id
                ),
            });
        }
        self.metadata.status = status;
        self.metadata.deprecated = None;
        Ok(())
    }

    /// Marks the toolset deprecated in favour of `superseded_by`.
    pub fn deprecate(&mut self, superseded_by: impl Into<String>) {
        self.metadata.status = ToolsetStatus::Deprecated;
        self.metadata.deprecated = Some(DeprecationNotice::new(superseded_by));
    }
}

/// Builder for [`Toolset`].
#[derive(Debug)]
pub struct ToolsetBuilder {
    id: String,
    name: Option<String>,
    description: String,
    category: Option<String>,
    default: bool,
    tools: Vec<String>,
    status: ToolsetStatus,
    requires: Vec<String>,
    related_toolsets: Vec<String>,
    superseded_by: Option<String>,
}

impl ToolsetBuilder {
    /// Sets the display name. Defaults to the identifier.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the display description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the category label.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Marks the toolset as enabled by default.
    #[must_use]
    pub fn enabled_by_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// Appends a tool name.
    #[must_use]
    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Appends several tool names in order.
    #[must_use]
    pub fn tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub fn status(mut self, status: ToolsetStatus) -> Self {
        self.status = status;
        self
    }

    /// Adds a structural dependency on another toolset.
    #[must_use]
    pub fn requires(mut self, id: impl Into<String>) -> Self {
        self.requires.push(id.into());
        self
    }

    /// Adds a documentation cross-link.
    #[must_use]
    pub fn related(mut self, id: impl Into<String>) -> Self {
        self.related_toolsets.push(id.into());
        self
    }

    /// Deprecates the toolset in favour of `replacement`.
    #[must_use]
    pub fn superseded_by(mut self, replacement: impl Into<String>) -> Self {
        self.status = ToolsetStatus::Deprecated;
        self.superseded_by = Some(replacement.into());
        self
    }

    /// Finalises the toolset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolsetId`] or [`Error::InvalidToolName`] when
    /// an identifier breaks the naming rules, and [`Error::InvalidToolset`]
    /// when the tool list is empty or contains duplicates, or when the
    /// deprecation record disagrees with the status.
    pub fn build(self) -> Result<Toolset> {
        validate_toolset_id(&self.id)?;

        if self.tools.is_empty() {
            return Err(Error::InvalidToolset {
                reason: format!("toolset `{}` must contain at least one tool", self.id),
            });
        }

        let mut seen = BTreeSet::new();
        for tool in &self.tools {
            validate_tool_name(tool)?;
            if !seen.insert(tool.as_str()) {
                return Err(Error::InvalidToolset {
                    reason: format!("toolset `{}` lists tool `{tool}` twice", self.id),
                });
            }
        }

        let deprecated = match (self.status, self.superseded_by) {
            (ToolsetStatus::Deprecated, Some(replacement)) => {
                Some(DeprecationNotice::new(replacement))
            }
            (ToolsetStatus::Deprecated, None) => {
                return Err(Error::InvalidToolset {
                    reason: format!(
                        "deprecated toolset `{}` must name its replacement",
                        self.id
                    ),
                });
            }
            (_, _) => None,
        };

        Ok(Toolset {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            description: self.description,
            category: self.category,
            default: self.default,
            tools: self.tools,
            metadata: ToolsetMetadata {
                status: self.status,
                requires: self.requires,
                related_toolsets: self.related_toolsets,
                deprecated,
                extra: Map::new(),
            },
            extra: Map::new(),
        })
    }
}
