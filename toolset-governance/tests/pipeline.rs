use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::{Value, json};
use tempfile::TempDir;
use toolset_governance::aliases::AliasError;
use toolset_governance::prelude::*;
use toolset_governance::registry::RegistryError;
use toolset_governance::Transition;

const SOURCE: &str = r#"
from google.adk.tools import ToolContext

def upsert_ui_element(tool_context: ToolContext, id: str, props: dict):
    return {}

def remove_ui_element(tool_context: ToolContext, id: str):
    return {}

def set_theme_color(tool_context: ToolContext, color: str):
    return {}
"#;

fn date(text: &str) -> NaiveDate {
    text.parse().unwrap()
}

fn toolset(id: &str, tools: &[&str]) -> Value {
    json!({
        "id": id,
        "name": id,
        "tools": tools,
        "metadata": { "status": "active" }
    })
}

fn requiring(id: &str, tools: &[&str], requires: &[&str]) -> Value {
    json!({
        "id": id,
        "name": id,
        "tools": tools,
        "metadata": { "status": "active", "requires": requires }
    })
}

fn workspace(toolsets: Vec<Value>, source: Option<&str>) -> (TempDir, Governance) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("toolsets.json"),
        serde_json::to_string_pretty(&json!({ "toolsets": toolsets })).unwrap(),
    )
    .unwrap();

    let mut config = GovernanceConfig::default();
    config.paths.registry = dir.path().join("toolsets.json");
    config.paths.aliases = dir.path().join("aliases.json");
    config.paths.migration_dir = dir.path().join("docs/migration");
    if let Some(source) = source {
        fs::write(dir.path().join("main.py"), source).unwrap();
        config.paths.sources = vec![dir.path().join("main.py")];
    }

    let governance = Governance::new(config).unwrap();
    (dir, governance)
}

fn scenario_a() -> Vec<Value> {
    vec![
        toolset("ui_elements", &["upsert_ui_element", "remove_ui_element"]),
        toolset("theme", &["set_theme_color"]),
    ]
}

fn with_old_ui() -> Vec<Value> {
    let mut toolsets = scenario_a();
    toolsets.push(toolset("old_ui", &["legacy_upsert"]));
    toolsets
}

fn stored(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn well_formed_registry_is_valid() {
    let (_dir, governance) = workspace(scenario_a(), Some(SOURCE));

    let report = governance.validate().unwrap();
    assert!(report.is_clean(), "{report}");
    assert!(report.violations().is_empty());

    let changes = governance.detect_changes().unwrap();
    assert!(changes.is_clean(), "{changes}");
}

#[test]
fn missing_requirement_names_both_toolsets() {
    let mut toolsets = scenario_a();
    toolsets.push(requiring("reporting", &["build_report"], &["analytics"]));
    let (_dir, governance) = workspace(toolsets, None);

    let report = governance.validate().unwrap();
    assert!(!report.is_valid());
    let reference: Vec<_> = report.of_kind(ViolationKind::Reference).collect();
    assert_eq!(reference.len(), 1);
    assert_eq!(reference[0].subject(), "reporting");
    assert!(reference[0].message().contains("analytics"));
}

#[test]
fn deprecation_resolves_with_warning_and_refuses_repointing() {
    let (dir, governance) = workspace(with_old_ui(), None);
    let today = date("2026-01-02");

    let created = governance
        .create_alias(&AliasRequest::new("old_ui", "ui_elements", "Consolidated"), today)
        .unwrap();
    assert!(created.deprecated());
    assert_eq!(created.revision(), 1);
    assert_eq!(created.record().removal_date(), date("2026-07-01"));

    let resolution = governance.resolve("old_ui").unwrap();
    assert_eq!(resolution.id(), Some("ui_elements"));
    let warning = resolution.warning().expect("deprecation warning");
    assert_eq!(warning.reason(), "Consolidated");
    assert_eq!(warning.removal_date(), date("2026-07-01"));

    let live = governance.resolve("ui_elements").unwrap();
    assert_eq!(live.id(), Some("ui_elements"));
    assert!(live.warning().is_none());
    assert!(matches!(governance.resolve("nothing").unwrap(), Resolution::Unknown { .. }));

    let aliases_before = fs::read_to_string(dir.path().join("aliases.json")).unwrap();
    let err = governance
        .create_alias(&AliasRequest::new("old_ui", "theme", "Moved again"), today)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::Alias(AliasError::Conflict { .. })), "{err}");
    assert!(err.is_rejection());
    assert_eq!(
        fs::read_to_string(dir.path().join("aliases.json")).unwrap(),
        aliases_before
    );
    assert_eq!(governance.list().unwrap().revision(), 1);

    let registry = stored(&dir.path().join("toolsets.json"));
    assert_eq!(registry["revision"], 1);
    assert_eq!(registry["toolsets"][2]["metadata"]["status"], "deprecated");
    assert_eq!(
        registry["toolsets"][2]["metadata"]["deprecated"]["superseded_by"],
        "ui_elements"
    );
    assert!(governance.validate().unwrap().is_valid());
}

#[test]
fn aliases_never_chain() {
    let (_dir, governance) = workspace(with_old_ui(), None);
    let today = date("2026-01-02");
    governance
        .create_alias(&AliasRequest::new("old_ui", "ui_elements", "Consolidated"), today)
        .unwrap();

    let onto_alias = governance
        .create_alias(&AliasRequest::new("theme", "old_ui", "Merged"), today)
        .unwrap_err();
    assert!(onto_alias.is_rejection());

    let through_target = governance
        .create_alias(&AliasRequest::new("ui_elements", "theme", "Merged"), today)
        .unwrap_err();
    assert!(matches!(
        through_target,
        GovernanceError::Alias(AliasError::Conflict { .. })
    ));

    let cycle = governance
        .create_alias(&AliasRequest::new("theme", "theme", "Self"), today)
        .unwrap_err();
    assert!(matches!(cycle, GovernanceError::Alias(AliasError::Conflict { .. })));
}

#[test]
fn migration_guide_partitions_tools() {
    let toolsets = vec![
        toolset("old_ui", &["a", "b"]),
        toolset("ui_elements", &["b", "c"]),
    ];
    let (dir, governance) = workspace(toolsets, None);

    let guide = governance
        .generate_migration_guide("old_ui", "ui_elements", "Consolidated", None)
        .unwrap();
    assert_eq!(
        guide.path(),
        dir.path().join("docs/migration/old_ui_to_ui_elements.md")
    );

    let text = fs::read_to_string(guide.path()).unwrap();
    assert!(text.contains("### Unchanged\n\n- `b`\n"));
    assert!(text.contains("### Added in `ui_elements`\n\n- `c`\n"));
    assert!(text.contains("### Removed\n\n- `a`\n"));
    assert!(text.contains("not yet scheduled"));
    assert!(guide.changelog().contains("Removed tools: `a`."));
}

#[test]
fn migration_guides_are_idempotent_and_use_alias_schedule() {
    let toolsets = vec![
        toolset("old_ui", &["a", "b"]),
        toolset("ui_elements", &["b", "c"]),
    ];
    let (dir, governance) = workspace(toolsets, None);
    governance
        .create_alias(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated"),
            date("2026-01-02"),
        )
        .unwrap();

    let output = dir.path().join("out");
    let first = governance
        .generate_migration_guide("old_ui", "ui_elements", "Consolidated", Some(&output))
        .unwrap();
    let first_text = fs::read_to_string(first.path()).unwrap();
    let second = governance
        .generate_migration_guide("old_ui", "ui_elements", "Consolidated", Some(&output))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(second.path()).unwrap(), first_text);
    assert!(first_text.contains("- Deprecated: 2026-01-02\n- Removal: 2026-07-01"));
}

#[test]
fn invalid_registry_blocks_guide_generation() {
    let toolsets = vec![
        toolset("old_ui", &["a"]),
        toolset("ui_elements", &["b"]),
        requiring("reporting", &["c"], &["analytics"]),
    ];
    let (dir, governance) = workspace(toolsets, None);

    let err = governance
        .generate_migration_guide("old_ui", "ui_elements", "Consolidated", None)
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(err.report().map(|report| report.violations().len()), Some(1));
    assert!(!dir.path().join("docs").exists());
}

#[test]
fn reports_are_deterministic() {
    let toolsets = vec![
        requiring("a", &["x"], &["b"]),
        requiring("b", &["y"], &["a"]),
        requiring("c", &["z"], &["missing"]),
        toolset("Bad_Id", &["w"]),
    ];
    let (_dir, governance) = workspace(toolsets, None);

    let first = governance.validate().unwrap();
    let second = governance.validate().unwrap();
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn every_independent_violation_is_reported_in_category_order() {
    let toolsets = vec![
        json!({ "id": "broken", "name": "Broken", "metadata": { "status": "active" } }),
        toolset("system", &["ping"]),
        toolset("charts", &["RenderChart"]),
        requiring("reporting", &["build_report"], &["analytics"]),
        toolset("theme", &["set_theme_color"]),
        toolset("theme", &["reset_theme"]),
        requiring("loops", &["spin"], &["loops"]),
    ];
    let (_dir, governance) = workspace(toolsets, None);

    let report = governance.validate().unwrap();
    assert!(!report.is_valid());
    assert_eq!(report.of_kind(ViolationKind::Schema).count(), 1);
    assert_eq!(report.of_kind(ViolationKind::Naming).count(), 2);
    assert_eq!(report.of_kind(ViolationKind::Reference).count(), 1);
    assert_eq!(report.of_kind(ViolationKind::Uniqueness).count(), 1);
    assert_eq!(report.of_kind(ViolationKind::Cycle).count(), 1);
    assert_eq!(report.violations().len(), 6);

    let kinds: Vec<_> = report.violations().iter().map(Violation::kind).collect();
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);
}

#[test]
fn changes_against_sources() {
    let toolsets = vec![
        toolset("ui_elements", &["upsert_ui_element"]),
        toolset("skills", &["load_skill"]),
    ];
    let (_dir, governance) = workspace(toolsets, Some(SOURCE));

    let report = governance.detect_changes().unwrap();
    assert!(!report.is_clean());
    let ids: Vec<_> = report.changes().changes().iter().map(Change::id).collect();
    assert_eq!(ids, ["skills", "theme", "ui_elements"]);
    assert!(matches!(
        &report.changes().changes()[2],
        Change::Modified { added, removed, .. } if added == &["remove_ui_element"] && removed.is_empty()
    ));
}

#[test]
fn parse_failures_make_change_detection_unclean() {
    let source = format!("{SOURCE}\ndef broken(tool_context: ToolContext,\n");
    let (_dir, governance) = workspace(scenario_a(), Some(&source));

    let report = governance.detect_changes().unwrap();
    assert!(report.changes().is_empty());
    assert_eq!(report.parse_failures().len(), 1);
    assert!(!report.is_clean());
}

#[test]
fn change_detection_needs_sources() {
    let (_dir, governance) = workspace(scenario_a(), None);
    let err = governance.detect_changes().unwrap_err();
    assert!(matches!(err, GovernanceError::NoSources));
    assert!(!err.is_rejection());
}

#[test]
fn missing_registry_is_a_file_error() {
    let (dir, governance) = workspace(scenario_a(), None);
    fs::remove_file(dir.path().join("toolsets.json")).unwrap();
    let err = governance.validate().unwrap_err();
    assert!(!err.is_rejection());
}

#[test]
fn status_transitions_commit_new_revisions() {
    let (dir, governance) = workspace(scenario_a(), None);

    let transition = governance.set_status("theme", ToolsetStatus::Beta).unwrap();
    assert_eq!(
        transition,
        Transition::StatusChanged {
            id: "theme".to_owned(),
            status: ToolsetStatus::Beta,
            revision: 1,
        }
    );
    assert_eq!(
        stored(&dir.path().join("toolsets.json"))["toolsets"][1]["metadata"]["status"],
        "beta"
    );

    let err = governance
        .set_status("theme", ToolsetStatus::Deprecated)
        .unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Registry(RegistryError::InvalidTransition { .. })
    ));
    assert!(err.is_rejection());

    let unknown = governance.set_status("nothing", ToolsetStatus::Active).unwrap_err();
    assert!(unknown.is_rejection());
}

#[test]
fn removal_waits_for_the_grace_period() {
    let (dir, governance) = workspace(with_old_ui(), None);
    governance
        .create_alias(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated"),
            date("2026-01-02"),
        )
        .unwrap();

    assert!(governance.expired_aliases(date("2026-06-30")).unwrap().is_empty());
    let err = governance
        .remove_toolset("old_ui", false, date("2026-06-30"))
        .unwrap_err();
    assert!(err.is_rejection());

    let expired = governance.expired_aliases(date("2026-07-01")).unwrap();
    assert_eq!(expired.len(), 1);
    assert!(expired[0].in_registry());

    let removed = governance
        .remove_toolset("old_ui", false, date("2026-07-01"))
        .unwrap();
    assert_eq!(
        removed,
        Transition::Removed {
            id: "old_ui".to_owned(),
            revision: 2,
        }
    );
    assert_eq!(stored(&dir.path().join("toolsets.json"))["toolsets"].as_array().unwrap().len(), 2);

    let resolution = governance.resolve("old_ui").unwrap();
    assert_eq!(resolution.id(), Some("ui_elements"));
    assert!(resolution.warning().is_some());
    assert!(governance.validate().unwrap().is_valid());
}

#[test]
fn alias_removal_is_refused_while_still_required() {
    let mut toolsets = with_old_ui();
    toolsets.push(requiring("reporting", &["build_report"], &["old_ui"]));
    let (dir, governance) = workspace(toolsets, None);

    let err = governance.remove_alias("old_ui").unwrap_err();
    assert!(!err.is_rejection(), "alias document does not exist yet: {err}");

    governance
        .create_alias(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated"),
            date("2026-01-02"),
        )
        .unwrap();
    assert!(governance.validate().unwrap().is_valid());

    let err = governance.remove_alias("old_ui").unwrap_err();
    assert!(matches!(err, GovernanceError::Invalid { .. }));
    assert!(stored(&dir.path().join("aliases.json"))["aliases"]["old_ui"].is_string());
}

#[test]
fn deprecation_keeps_author_written_fields() {
    let mut toolsets = with_old_ui();
    toolsets[2]["icon"] = json!("grid");
    toolsets[2]["metadata"]["owner"] = json!("ui-team");
    let (dir, governance) = workspace(toolsets.clone(), None);
    let registry = dir.path().join("toolsets.json");
    fs::write(
        &registry,
        serde_json::to_string_pretty(&json!({ "version": "1.0.0", "toolsets": toolsets })).unwrap(),
    )
    .unwrap();

    governance
        .create_alias(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated"),
            date("2026-01-02"),
        )
        .unwrap();

    let after = stored(&registry);
    assert_eq!(after["version"], "1.0.0");
    assert_eq!(after["revision"], 1);
    let old_ui = &after["toolsets"][2];
    assert_eq!(old_ui["icon"], "grid");
    assert_eq!(old_ui["metadata"]["owner"], "ui-team");
    assert_eq!(old_ui["metadata"]["status"], "deprecated");
}

#[test]
fn refused_deprecation_writes_neither_document() {
    let mut toolsets = with_old_ui();
    toolsets.push(requiring("reporting", &["build_report"], &["old_ui", "analytics"]));
    let (dir, governance) = workspace(toolsets, None);
    let registry = dir.path().join("toolsets.json");
    let before = fs::read(&registry).unwrap();

    let err = governance
        .create_alias(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated"),
            date("2026-01-02"),
        )
        .unwrap_err();
    assert!(err.is_rejection());
    assert!(err.report().is_some());
    assert_eq!(fs::read(&registry).unwrap(), before);
    assert!(!dir.path().join("aliases.json").exists());
}

#[test]
fn catalog_lists_live_toolsets() {
    let (_dir, governance) = workspace(with_old_ui(), None);
    governance
        .create_alias(
            &AliasRequest::new("old_ui", "ui_elements", "Consolidated"),
            date("2026-01-02"),
        )
        .unwrap();

    let catalog = governance.catalog().unwrap();
    assert!(catalog.contains("(`ui_elements`)"));
    assert!(catalog.contains("(`theme`)"));
    assert!(!catalog.contains("old_ui"));
}
