//! Tool partition between a retired toolset and its replacement.

use serde::Serialize;
use toolset_primitives::Toolset;

/// Tools split into unchanged, added, and removed.
///
/// `unchanged` and `added` follow the replacement's tool order, `removed`
/// follows the retired toolset's order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ToolDiff {
    unchanged: Vec<String>,
    added: Vec<String>,
    removed: Vec<String>,
}

impl ToolDiff {
    /// Partitions the tools of `old` and `new`.
    #[must_use]
    pub fn between(old: &Toolset, new: &Toolset) -> Self {
        let (unchanged, added): (Vec<String>, Vec<String>) = new
            .tools()
            .iter()
            .cloned()
            .partition(|tool| old.contains_tool(tool));
        let removed = old
            .tools()
            .iter()
            .filter(|tool| !new.contains_tool(tool))
            .cloned()
            .collect();
        Self {
            unchanged,
            added,
            removed,
        }
    }

    /// Tools present in both.
    #[must_use]
    pub fn unchanged(&self) -> &[String] {
        &self.unchanged
    }

    /// Tools only in the replacement.
    #[must_use]
    pub fn added(&self) -> &[String] {
        &self.added
    }

    /// Tools only in the retired toolset.
    #[must_use]
    pub fn removed(&self) -> &[String] {
        &self.removed
    }
}
