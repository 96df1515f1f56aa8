//! Naming, reference, uniqueness, and dependency checks over parsed toolsets.

use std::collections::{BTreeMap, BTreeSet};

use toolset_aliases::AliasMap;
use toolset_extractor::Extraction;
use toolset_primitives::{Toolset, validate_tool_name, validate_toolset_id};

use crate::graph::DependencyGraph;
use crate::report::{Violation, ViolationKind};

/// Toolsets that passed the schema check, with lookup tables shared by the
/// remaining checks.
pub(crate) struct Catalog<'a> {
    toolsets: &'a [Toolset],
    first: BTreeMap<&'a str, &'a Toolset>,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(toolsets: &'a [Toolset]) -> Self {
        let mut first = BTreeMap::new();
        for toolset in toolsets {
            first.entry(toolset.id()).or_insert(toolset);
        }
        Self { toolsets, first }
    }

    fn is_live(&self, id: &str) -> bool {
        self.first.get(id).is_some_and(|toolset| toolset.is_live())
    }

    /// Follows one alias hop when `id` is not a live toolset.
    fn resolve<'b>(&self, id: &'b str, aliases: Option<&'b AliasMap>) -> &'b str {
        if self.is_live(id) {
            return id;
        }
        aliases.and_then(|map| map.target(id)).unwrap_or(id)
    }
}

pub(crate) fn naming(catalog: &Catalog<'_>, out: &mut Vec<Violation>) {
    for toolset in catalog.toolsets {
        if let Err(err) = validate_toolset_id(toolset.id()) {
            out.push(Violation::new(ViolationKind::Naming, toolset.id(), err.to_string()));
        }
        for tool in toolset.tools() {
            if let Err(err) = validate_tool_name(tool) {
                out.push(Violation::new(ViolationKind::Naming, toolset.id(), err.to_string()));
            }
        }
    }
}

pub(crate) fn references(
    catalog: &Catalog<'_>,
    extraction: Option<&Extraction>,
    aliases: Option<&AliasMap>,
    out: &mut Vec<Violation>,
) {
    for toolset in catalog.toolsets {
        let id = toolset.id();

        if let Some(extraction) = extraction {
            for tool in toolset.tools() {
                if !extraction.contains_tool(tool) {
                    out.push(Violation::new(
                        ViolationKind::Reference,
                        id,
                        format!("tool `{tool}` has no discovered declaration"),
                    ));
                }
            }
        }

        for target in toolset.metadata().requires() {
            if catalog.is_live(target) {
                continue;
            }
            let via_alias = aliases.and_then(|map| map.target(target));
            let message = match via_alias {
                Some(next) if catalog.is_live(next) => continue,
                Some(next) => format!(
                    "`{id}` requires `{target}`, whose alias target `{next}` is not a live toolset"
                ),
                None if catalog.first.contains_key(target.as_str()) => format!(
                    "`{id}` requires deprecated toolset `{target}`, which has no alias to a live replacement"
                ),
                None => format!("`{id}` requires unknown toolset `{target}`"),
            };
            out.push(Violation::new(ViolationKind::Reference, id, message));
        }

        if let Some(notice) = toolset.metadata().deprecated() {
            let replacement = notice.superseded_by();
            if !catalog.is_live(replacement) {
                out.push(Violation::new(
                    ViolationKind::Reference,
                    id,
                    format!("superseded_by `{replacement}` is not a live toolset"),
                ));
            }
            if let Some(target) = aliases.and_then(|map| map.target(id)) {
                if target != replacement {
                    out.push(Violation::new(
                        ViolationKind::Reference,
                        id,
                        format!(
                            "alias points to `{target}` but superseded_by names `{replacement}`"
                        ),
                    ));
                }
            }
        }
    }

    if let Some(aliases) = aliases {
        alias_integrity(catalog, aliases, out);
    }
}

fn alias_integrity(catalog: &Catalog<'_>, aliases: &AliasMap, out: &mut Vec<Violation>) {
    for (old, record) in aliases.iter() {
        let target = record.replacement();
        if catalog.is_live(old) {
            out.push(Violation::new(
                ViolationKind::Reference,
                old,
                "alias source is still a live toolset",
            ));
        }
        if aliases.is_deprecated(target) {
            out.push(Violation::new(
                ViolationKind::Reference,
                old,
                format!("alias target `{target}` is itself an alias"),
            ));
        } else if !catalog.is_live(target) {
            out.push(Violation::new(
                ViolationKind::Reference,
                old,
                format!("alias target `{target}` is not a live toolset"),
            ));
        }
    }
}

pub(crate) fn uniqueness(catalog: &Catalog<'_>, out: &mut Vec<Violation>) {
    let mut seen = BTreeSet::new();
    for toolset in catalog.toolsets {
        if !seen.insert(toolset.id()) {
            out.push(Violation::new(
                ViolationKind::Uniqueness,
                toolset.id(),
                format!("toolset id `{}` is declared more than once", toolset.id()),
            ));
        }
    }
}

pub(crate) fn cycles(catalog: &Catalog<'_>, aliases: Option<&AliasMap>, out: &mut Vec<Violation>) {
    let mut graph = DependencyGraph::default();
    for toolset in catalog.toolsets {
        graph.add_node(toolset.id());
    }
    for (&id, toolset) in &catalog.first {
        for target in toolset.metadata().requires() {
            graph.add_edge(id, catalog.resolve(target, aliases));
        }
    }

    for path in graph.cycles() {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            continue;
        };
        let message = if path.len() == 1 {
            format!("`{first}` requires itself")
        } else {
            let chain: Vec<String> = path.iter().chain([&first]).map(|id| format!("`{id}`")).collect();
            format!("dependency cycle: {}", chain.join(" -> "))
        };
        out.push(Violation::new(ViolationKind::Cycle, last, message));
    }
}
