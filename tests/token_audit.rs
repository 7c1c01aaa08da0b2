use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tokencov::token_audit::{audit_path, AuditOptions, DiagnosticKind, TokenCoverageReport};
use tokencov::ErrorCode;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project(tokens: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tokens/core.json", tokens);
    dir
}

fn audit(dir: &TempDir) -> TokenCoverageReport {
    audit_path(dir.path().to_str().unwrap(), &AuditOptions::default()).unwrap()
}

const PRIMARY: &str = r##"{ "color": { "primary": { "value": "#0000FF" } } }"##;

#[test]
fn exact_literal_is_a_usage_not_a_finding() {
    let dir = project(PRIMARY);
    write(dir.path(), "src/app.css", ".app {\n  color: #0000FF;\n}\n");

    let report = audit(&dir);
    let primary = &report.usage_mapping[0];
    assert_eq!(primary.token_name, "color.primary");
    assert_eq!(primary.usage_count, 1);
    assert_eq!(primary.files[0].path, "src/app.css");
    assert_eq!(primary.files[0].line, Some(2));
    assert!(report.hardcoded_values.is_empty());
}

#[test]
fn near_identical_color_is_a_near_miss() {
    let dir = project(PRIMARY);
    write(dir.path(), "src/app.css", ".app { color: #0000FE; }\n");

    let report = audit(&dir);
    assert_eq!(report.hardcoded_values.len(), 1);
    let finding = &report.hardcoded_values[0];
    assert_eq!(finding.matched_token.as_deref(), Some("color.primary"));
    assert!(finding.similarity.unwrap() >= 0.9);
    assert_eq!(report.usage_mapping[0].usage_count, 0);
}

#[test]
fn unrelated_color_is_a_plain_finding() {
    let dir = project(PRIMARY);
    write(dir.path(), "src/app.css", ".app { color: #112233; }\n");

    let report = audit(&dir);
    assert_eq!(report.hardcoded_values.len(), 1);
    assert_eq!(report.hardcoded_values[0].value, "#112233");
    assert_eq!(report.hardcoded_values[0].matched_token, None);
    assert_eq!(report.hardcoded_values[0].similarity, None);
}

#[test]
fn equal_spacing_tokens_are_redundant() {
    let dir = project(r##"{ "spacing": { "sm": { "value": "8px" }, "small": { "value": "8px" } } }"##);
    write(dir.path(), "src/app.css", ".app { display: block; }\n");

    let report = audit(&dir);
    assert_eq!(report.redundancies.len(), 1);
    assert_eq!(report.redundancies[0].tokens, vec!["spacing.sm", "spacing.small"]);
}

#[test]
fn aliases_keep_their_targets_in_use() {
    let dir = project(
        r##"{
  "color": {
    "blue": { "$value": "#0000FF", "$type": "color" },
    "brand": { "$value": "{color.blue}" }
  }
}"##,
    );
    write(dir.path(), "src/app.css", ".app { display: block; }\n");

    let report = audit(&dir);
    let blue = report
        .usage_mapping
        .iter()
        .find(|r| r.token_name == "color.blue")
        .unwrap();
    assert_eq!(blue.usage_count, 1);
    assert_eq!(blue.files[0].context, "referenced by token: color.brand");
    assert_eq!(report.coverage_metrics.unused_tokens, vec!["color.brand"]);
    assert!(report.usage_mapping.len() >= report.summary.tokens);
}

fn color_catalog(count: usize) -> String {
    let entries: Vec<String> = (0..count)
        .map(|i| format!(r##""c{}": {{ "value": "#{:02x}0000" }}"##, i, i * 20))
        .collect();
    format!(r#"{{ "color": {{ {} }} }}"#, entries.join(", "))
}

fn component_project() -> TempDir {
    let dir = project(&color_catalog(10));

    write(
        dir.path(),
        "src/components/Good.tsx",
        "export const Good = () => <div className={styles.root} />;\n",
    );
    let good_css: String = (0..10)
        .map(|i| format!(".g{} {{ color: var(--color-c{}); }}\n", i, i))
        .collect();
    write(dir.path(), "src/components/Good.module.css", &good_css);

    write(
        dir.path(),
        "src/components/Bad.tsx",
        "export const Bad = () => <div className={styles.root} />;\n",
    );
    let mut bad_css: String = (0..3)
        .map(|i| format!(".b{} {{ color: var(--color-c{}); }}\n", i, i))
        .collect();
    for px in [3, 5, 7, 9, 11, 13, 15, 17] {
        bad_css.push_str(&format!(".m{} {{ margin: {}px; }}\n", px, px));
    }
    write(dir.path(), "src/components/Bad.module.css", &bad_css);
    dir
}

#[test]
fn components_get_coverage_and_attention() {
    let dir = component_project();
    let report = audit(&dir);

    assert_eq!(report.component_usage.len(), 2);
    let bad = &report.component_usage[0];
    let good = &report.component_usage[1];

    assert_eq!(good.component_name, "Good");
    assert_eq!(good.tokens_used.len(), 10);
    assert_eq!(good.hardcoded_values, 0);
    assert_eq!(good.coverage_score, 100.0);
    assert!(!good.needs_attention);

    assert_eq!(bad.component_name, "Bad");
    assert_eq!(bad.tokens_used.len(), 3);
    assert_eq!(bad.hardcoded_values, 8);
    assert_eq!(bad.coverage_score, 27.3);
    assert!(bad.needs_attention);
    assert!(bad.attention_reasons.iter().any(|r| r.starts_with("Low token coverage")));
    assert!(bad.attention_reasons.iter().any(|r| r.contains("hardcoded values (8)")));
    assert!(report.needs_attention());
}

#[test]
fn repeated_runs_are_identical() {
    let dir = component_project();
    let first = audit(&dir);
    let second = audit(&dir);

    assert_eq!(first.component_usage, second.component_usage);
    assert_eq!(first.usage_mapping, second.usage_mapping);
    assert_eq!(first.hardcoded_values, second.hardcoded_values);
    assert_eq!(first.coverage_metrics, second.coverage_metrics);
}

#[test]
fn unreadable_files_do_not_stop_the_audit() {
    let dir = project(PRIMARY);
    write(dir.path(), "src/app.css", ".app { color: #0000FF; }\n");
    fs::write(dir.path().join("src/broken.css"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    let report = audit(&dir);
    assert_eq!(report.summary.files_scanned, 1);
    assert_eq!(report.summary.files_skipped, 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::FileSkipped && d.path.as_deref() == Some("src/broken.css")));
    assert_eq!(report.usage_mapping[0].usage_count, 1);
}

#[test]
fn missing_catalog_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/app.css", ".app { color: #0000FF; }\n");

    let err = audit_path(dir.path().to_str().unwrap(), &AuditOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::CatalogNotFound);
}

#[test]
fn project_config_tunes_attention_policy() {
    let dir = component_project();
    write(
        dir.path(),
        "tokencov.json",
        r#"{ "defaults": { "attention": { "coverage_threshold": 20, "multiple_hardcoded": 8, "high_hardcoded": 20 } } }"#,
    );

    let report = audit(&dir);
    let bad = &report.component_usage[0];
    assert_eq!(bad.component_name, "Bad");
    assert!(!bad.needs_attention);
}
