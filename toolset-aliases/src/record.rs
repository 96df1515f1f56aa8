//! Alias records and deprecation warnings.

use std::fmt::{self, Display, Formatter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Deprecation metadata stored for one retired toolset id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    deprecated_at: NaiveDate,
    removal_date: NaiveDate,
    reason: String,
    replacement: String,
    migration_guide: String,
}

impl AliasRecord {
    pub(crate) fn new(
        deprecated_at: NaiveDate,
        removal_date: NaiveDate,
        reason: String,
        replacement: String,
        migration_guide: String,
    ) -> Self {
        Self {
            deprecated_at,
            removal_date,
            reason,
            replacement,
            migration_guide,
        }
    }

    /// Date the alias was created.
    #[must_use]
    pub const fn deprecated_at(&self) -> NaiveDate {
        self.deprecated_at
    }

    /// Date from which the retired toolset may be deleted.
    #[must_use]
    pub const fn removal_date(&self) -> NaiveDate {
        self.removal_date
    }

    /// Why the toolset was retired.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Live toolset the alias points to.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Relative path of the migration guide.
    #[must_use]
    pub fn migration_guide(&self) -> &str {
        &self.migration_guide
    }

    /// Returns `true` once `today` has reached the removal date.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today >= self.removal_date
    }
}

/// Warning attached to a resolution that went through an alias.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeprecationWarning {
    alias: String,
    replacement: String,
    reason: String,
    removal_date: NaiveDate,
    migration_guide: String,
}

impl DeprecationWarning {
    pub(crate) fn from_record(alias: &str, record: &AliasRecord) -> Self {
        Self {
            alias: alias.to_owned(),
            replacement: record.replacement.clone(),
            reason: record.reason.clone(),
            removal_date: record.removal_date,
            migration_guide: record.migration_guide.clone(),
        }
    }

    /// The retired identifier that was requested.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The live replacement.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Deprecation reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Scheduled removal date.
    #[must_use]
    pub const fn removal_date(&self) -> NaiveDate {
        self.removal_date
    }

    /// Migration guide path.
    #[must_use]
    pub fn migration_guide(&self) -> &str {
        &self.migration_guide
    }
}

impl Display for DeprecationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "toolset `{}` is deprecated ({}); use `{}` instead. It will be removed on {}, see {}",
            self.alias, self.reason, self.replacement, self.removal_date, self.migration_guide
        )
    }
}

/// Outcome of resolving a toolset name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// The name resolved to a live toolset.
    Resolved {
        /// Live toolset identifier.
        id: String,
        /// Present when the name was a deprecated alias.
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<DeprecationWarning>,
    },
    /// Neither a live toolset nor an alias.
    Unknown {
        /// The requested name.
        name: String,
    },
}

impl Resolution {
    /// Returns the resolved identifier, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Resolved { id, .. } => Some(id),
            Self::Unknown { .. } => None,
        }
    }

    /// Returns the deprecation warning, if any.
    #[must_use]
    pub fn warning(&self) -> Option<&DeprecationWarning> {
        match self {
            Self::Resolved { warning, .. } => warning.as_ref(),
            Self::Unknown { .. } => None,
        }
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved { id, warning: None } => write!(f, "{id}"),
            Self::Resolved {
                id,
                warning: Some(warning),
            } => write!(f, "{id}\nwarning: {warning}"),
            Self::Unknown { name } => write!(f, "unknown toolset `{name}`"),
        }
    }
}
