//! Catalog summary of live toolsets for agent system instructions.

use std::fmt::Write as _;

use toolset_primitives::{RegistryDocument, ToolsetStatus};

/// Renders the live toolsets as a text block an agent runtime can paste into
/// its system instructions. Deprecated toolsets are omitted; order follows
/// the registry.
#[must_use]
pub fn render_catalog(document: &RegistryDocument) -> String {
    let mut out = String::from("## Available toolsets\n");
    let mut any = false;

    for toolset in document.live() {
        any = true;
        let marker = if toolset.is_default() { " [default]" } else { "" };
        let _ = write!(out, "\n### {} (`{}`){marker}\n", toolset.name(), toolset.id());
        if toolset.status() != ToolsetStatus::Active {
            let _ = writeln!(out, "Status: {}", toolset.status());
        }
        if !toolset.description().is_empty() {
            let _ = writeln!(out, "{}", toolset.description());
        }
        let _ = writeln!(out, "Tools: {}", toolset.tools().join(", "));
    }

    if !any {
        out.push_str("\nNo toolsets are currently available.\n");
    }
    out
}
