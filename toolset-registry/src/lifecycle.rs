//! Status state machine for registry toolsets.
//!
//! `active`, `experimental`, and `beta` move freely among themselves. A live
//! toolset becomes `deprecated` only once an alias redirects it to its
//! replacement, and a deprecated toolset may be removed only after the alias
//! grace period has elapsed.

use std::fmt::{self, Display, Formatter};

use chrono::NaiveDate;
use toolset_aliases::AliasMap;
use toolset_primitives::{RegistryDocument, Toolset, ToolsetStatus};
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};

/// Events that drive a toolset through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Move between the live statuses.
    SetStatus(ToolsetStatus),
    /// Retire in favour of a live replacement.
    Deprecate {
        /// Replacement toolset id.
        superseded_by: String,
    },
    /// Delete a deprecated toolset from the registry.
    Remove {
        /// Skip the grace period check.
        force: bool,
    },
}

impl Display for LifecycleEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetStatus(status) => write!(f, "set-status {status}"),
            Self::Deprecate { superseded_by } => write!(f, "deprecate in favour of `{superseded_by}`"),
            Self::Remove { force: false } => f.write_str("remove"),
            Self::Remove { force: true } => f.write_str("forced remove"),
        }
    }
}

/// Result of applying a [`LifecycleEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The toolset now has this status.
    Status(ToolsetStatus),
    /// The toolset was deleted.
    Removed(Box<Toolset>),
}

/// Context consulted when an event depends on alias state.
#[derive(Debug, Clone, Copy)]
pub struct TransitionGuard<'a> {
    aliases: &'a AliasMap,
    today: NaiveDate,
}

impl<'a> TransitionGuard<'a> {
    /// Creates a guard evaluating grace periods against `today`.
    #[must_use]
    pub const fn new(aliases: &'a AliasMap, today: NaiveDate) -> Self {
        Self { aliases, today }
    }
}

/// Checks whether `event` is allowed for toolset `id` in status `from`.
///
/// Returns the next status, or `None` when the toolset is to be removed.
fn next_status(
    id: &str,
    from: ToolsetStatus,
    event: &LifecycleEvent,
    guard: &TransitionGuard<'_>,
) -> Result<Option<ToolsetStatus>, String> {
    match (from, event) {
        (_, LifecycleEvent::SetStatus(ToolsetStatus::Deprecated)) => {
            Err("deprecation requires an alias to a replacement".to_owned())
        }
        (ToolsetStatus::Deprecated, LifecycleEvent::SetStatus(_)) => {
            Err("a deprecated toolset stays deprecated until it is removed".to_owned())
        }
        (_, LifecycleEvent::SetStatus(status)) => Ok(Some(*status)),

        (ToolsetStatus::Deprecated, LifecycleEvent::Deprecate { .. }) => {
            Err("toolset is already deprecated".to_owned())
        }
        (_, LifecycleEvent::Deprecate { superseded_by }) => {
            match guard.aliases.target(id) {
                Some(target) if target == superseded_by => Ok(Some(ToolsetStatus::Deprecated)),
                Some(target) => Err(format!(
                    "its alias points to `{target}`, not `{superseded_by}`"
                )),
                None => Err(format!("no alias redirects it to `{superseded_by}` yet")),
            }
        }

        (ToolsetStatus::Deprecated, LifecycleEvent::Remove { force: true }) => Ok(None),
        (ToolsetStatus::Deprecated, LifecycleEvent::Remove { force: false }) => {
            match guard.aliases.deprecation_info(id) {
                Some(record) if record.is_expired(guard.today) => Ok(None),
                Some(record) => Err(format!(
                    "the grace period runs until {}",
                    record.removal_date()
                )),
                None => Err("no alias schedules its removal".to_owned()),
            }
        }
        (_, LifecycleEvent::Remove { .. }) => {
            Err("only deprecated toolsets can be removed".to_owned())
        }
    }
}

/// Applies `event` to toolset `id` inside `document`.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownToolset`] when `id` is absent and
/// [`RegistryError::InvalidTransition`] when the event is not allowed.
pub fn apply(
    document: &mut RegistryDocument,
    id: &str,
    event: &LifecycleEvent,
    guard: &TransitionGuard<'_>,
) -> RegistryResult<LifecycleOutcome> {
    let Some(toolset) = document.get_mut(id) else {
        return Err(RegistryError::UnknownToolset { id: id.to_owned() });
    };
    let from = toolset.status();

    let next = next_status(id, from, event, guard).map_err(|reason| {
        RegistryError::InvalidTransition {
            id: id.to_owned(),
            from,
            event: event.clone(),
            reason,
        }
    })?;

    let outcome = match (next, event) {
        (None, _) => {
            let removed = document
                .remove(id)
                .ok_or_else(|| RegistryError::UnknownToolset { id: id.to_owned() })?;
            info!(id, "toolset removed");
            LifecycleOutcome::Removed(Box::new(removed))
        }
        (Some(_), LifecycleEvent::Deprecate { superseded_by }) => {
            toolset.deprecate(superseded_by.as_str());
            info!(id, superseded_by = superseded_by.as_str(), "toolset deprecated");
            LifecycleOutcome::Status(ToolsetStatus::Deprecated)
        }
        (Some(status), _) => {
            toolset.set_status(status)?;
            if status != from {
                debug!(id, %from, to = %status, "toolset status changed");
            }
            LifecycleOutcome::Status(status)
        }
    };

    Ok(outcome)
}
