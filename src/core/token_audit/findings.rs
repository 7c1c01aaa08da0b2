//! Turn a coverage report into the `tokens` category for the scoring rollup.

use std::collections::BTreeMap;

use serde_json::json;

use super::components::coverage_score;
use super::metrics::percentage;
use super::{DiagnosticKind, HardcodedValue, TokenCoverageReport};
use crate::scoring::{CategoryResult, Finding, Grade, Level, Severity};

/// Plain hardcoded occurrences of one type beyond which impact is high.
const HIGH_IMPACT_OCCURRENCES: usize = 20;

/// How many unused token names a finding lists before truncating.
const UNUSED_PREVIEW: usize = 10;

/// Score the report and collect its findings.
///
/// Score = 0.5 adoption + 0.3 catalog coverage + 0.2 (100 - redundant %),
/// where adoption is token usages over usages plus hardcoded occurrences.
pub fn token_category(report: &TokenCoverageReport) -> CategoryResult {
    let metrics = &report.coverage_metrics;
    let occurrences = report.summary.hardcoded_occurrences;
    let adoption = coverage_score(metrics.total_usages, occurrences);
    let redundant: usize = report
        .redundancies
        .iter()
        .map(|group| group.tokens.len().saturating_sub(1))
        .sum();
    let redundant_pct = percentage(redundant, metrics.total_tokens);

    let raw = 0.5 * adoption + 0.3 * metrics.coverage_percentage + 0.2 * (100.0 - redundant_pct);
    let score = raw.clamp(0.0, 100.0).round();

    CategoryResult {
        id: "tokens".to_string(),
        name: "Design Tokens".to_string(),
        score,
        grade: Grade::from_score(score),
        findings: build_findings(report),
        metrics: json!({
            "adoption": adoption,
            "coverage": metrics.coverage_percentage,
            "redundantPercentage": redundant_pct,
            "usedTokens": metrics.used_tokens,
            "totalTokens": metrics.total_tokens,
            "hardcodedOccurrences": occurrences,
            "componentsNeedingAttention": report.summary.components_needing_attention,
        }),
    }
}

pub fn build_findings(report: &TokenCoverageReport) -> Vec<Finding> {
    let mut findings = Vec::new();

    for value in report.hardcoded_values.iter().filter(|v| v.is_near_miss()) {
        findings.push(near_miss(value));
    }
    findings.extend(plain_hardcoded(&report.hardcoded_values));

    let unused = &report.coverage_metrics.unused_tokens;
    if !unused.is_empty() {
        let mut preview = unused.iter().take(UNUSED_PREVIEW).cloned().collect::<Vec<_>>().join(", ");
        if unused.len() > UNUSED_PREVIEW {
            preview.push_str(&format!(" and {} more", unused.len() - UNUSED_PREVIEW));
        }
        findings.push(Finding {
            kind: "unused-tokens".to_string(),
            severity: Severity::Warning,
            impact: Level::Low,
            effort: Level::Low,
            title: format!("{} unused token(s)", unused.len()),
            description: format!("Never referenced in scanned sources: {}", preview),
            suggestion: Some("Remove tokens nobody uses, or adopt them where their values are hardcoded".to_string()),
            files: Vec::new(),
        });
    }

    for group in &report.redundancies {
        findings.push(Finding {
            kind: "redundant-tokens".to_string(),
            severity: Severity::Info,
            impact: Level::Low,
            effort: Level::Medium,
            title: format!("{} tokens share the value {}", group.tokens.len(), group.value),
            description: format!("Same effective value: {}", group.tokens.join(", ")),
            suggestion: Some(format!("Keep {} and alias the rest to it", group.tokens[0])),
            files: Vec::new(),
        });
    }

    for component in report.component_usage.iter().filter(|c| c.needs_attention) {
        let severity = if component.coverage_score < 50.0 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        findings.push(Finding {
            kind: "component-attention".to_string(),
            severity,
            impact: Level::Medium,
            effort: Level::Medium,
            title: format!("{} needs attention", component.component_name),
            description: component.attention_reasons.join("; "),
            suggestion: Some(format!(
                "Replace the {} hardcoded value(s) with token references",
                component.hardcoded_values
            )),
            files: vec![component.component_path.clone()],
        });
    }

    for diagnostic in &report.diagnostics {
        let kind = match diagnostic.kind {
            DiagnosticKind::ConventionAssumed | DiagnosticKind::ConfigFallback => "configuration",
            _ => "skipped",
        };
        findings.push(Finding {
            kind: kind.to_string(),
            severity: Severity::Info,
            impact: Level::Low,
            effort: Level::Low,
            title: diagnostic.message.clone(),
            description: diagnostic.message.clone(),
            suggestion: None,
            files: diagnostic.path.iter().cloned().collect(),
        });
    }

    findings
}

fn near_miss(value: &HardcodedValue) -> Finding {
    let token = value.matched_token.as_deref().unwrap_or_default();
    let similarity = value.similarity.unwrap_or_default() * 100.0;
    Finding {
        kind: "hardcoded-near-miss".to_string(),
        severity: Severity::Warning,
        impact: Level::Medium,
        effort: Level::Low,
        title: format!("Replace {} with {}", value.value, token),
        description: format!(
            "{} occurrence(s) of {} in `{}` are {:.0}% similar to token {}",
            value.occurrences(),
            value.value,
            value.property,
            similarity,
            token
        ),
        suggestion: Some(format!("Use {} instead of the literal", token)),
        files: distinct_paths(std::slice::from_ref(value)),
    }
}

/// One finding per value type for literals with no nearby token.
fn plain_hardcoded(values: &[HardcodedValue]) -> Vec<Finding> {
    let mut by_type: BTreeMap<&'static str, Vec<HardcodedValue>> = BTreeMap::new();
    for value in values.iter().filter(|v| !v.is_near_miss()) {
        by_type.entry(value.value_type.as_str()).or_default().push(value.clone());
    }

    by_type
        .into_iter()
        .map(|(kind, group)| {
            let occurrences: usize = group.iter().map(HardcodedValue::occurrences).sum();
            let examples = group.iter().take(5).map(|v| v.value.as_str()).collect::<Vec<_>>().join(", ");
            Finding {
                kind: "hardcoded-values".to_string(),
                severity: Severity::Warning,
                impact: if occurrences > HIGH_IMPACT_OCCURRENCES {
                    Level::High
                } else {
                    Level::Medium
                },
                effort: Level::Medium,
                title: format!("{} hardcoded {} value(s)", occurrences, kind),
                description: format!(
                    "{} distinct value(s) with no matching token, e.g. {}",
                    group.len(),
                    examples
                ),
                suggestion: Some(format!("Introduce {} tokens for recurring values", kind)),
                files: distinct_paths(&group),
            }
        })
        .collect()
}

fn distinct_paths(values: &[HardcodedValue]) -> Vec<String> {
    let mut paths: Vec<String> = values
        .iter()
        .flat_map(|v| v.files.iter().map(|f| f.path.clone()))
        .collect();
    paths.sort();
    paths.dedup();
    paths
}
