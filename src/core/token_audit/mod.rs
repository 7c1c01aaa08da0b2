//! Token coverage audit.
//!
//! Measures how consistently a project references its design tokens instead
//! of repeating their values as literals. One batch pass, phase by phase:
//!
//! 1. Detect the naming convention tokens are turned into variables with
//! 2. Seed the usage map from the catalog (aliases credit their targets)
//! 3. Scan sources for token references and hardcoded values
//! 4. Group tokens that share a value
//! 5. Compute catalog-wide and per-type coverage
//! 6. Score each component and decide whether it needs attention
//!
//! Only a missing or unusable catalog fails the run. Everything else is
//! recorded as a [`Diagnostic`] and the audit carries on.

pub mod components;
pub mod convention;
mod findings;
pub mod matcher;
pub mod metrics;
pub mod references;
pub mod scan;
pub mod source_kind;
pub mod usage;
pub mod values;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use components::{ComponentTokenUsage, ComponentType};
pub use convention::{CaseStyle, ConventionSource, DetectedConvention, TransformPattern};
pub use findings::token_category;
pub use matcher::{TokenRedundancy, ValueMatcher};
pub use metrics::{CategoryCoverage, CoverageMetrics};
pub use scan::HardcodedValue;
pub use source_kind::SourceKind;
pub use usage::{FileReference, UsageRecord};

use crate::defaults::{self, Defaults, CONFIG_FILE};
use crate::local_files::{FileSystem, LocalFs};
use crate::tokens::{load_catalog, TokenCatalog};
use crate::{Error, Result};

fn is_zero(v: &usize) -> bool {
    *v == 0
}

// ============================================================================
// Report types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    FileSkipped,
    TokenFileSkipped,
    ComponentSkipped,
    ConventionAssumed,
    ConfigFallback,
}

/// Something that degraded the run without stopping it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, message: String, path: Option<&str>) -> Self {
        Self {
            kind,
            message,
            path: path.map(str::to_string),
        }
    }

    pub fn file_skipped(path: &str, reason: &str) -> Self {
        Self::new(
            DiagnosticKind::FileSkipped,
            format!("Skipped unreadable file: {}", reason),
            Some(path),
        )
    }

    pub fn token_file_skipped(path: &str, reason: &str) -> Self {
        Self::new(
            DiagnosticKind::TokenFileSkipped,
            format!("Skipped token file: {}", reason),
            Some(path),
        )
    }

    pub fn component_skipped(path: &str, reason: &str) -> Self {
        Self::new(
            DiagnosticKind::ComponentSkipped,
            format!("Component analysis failed: {}", reason),
            Some(path),
        )
    }

    pub fn convention_assumed(pattern: &TransformPattern) -> Self {
        Self::new(
            DiagnosticKind::ConventionAssumed,
            format!(
                "No token naming convention found; assuming {:?} variables{}",
                pattern.case_style,
                pattern
                    .prefix
                    .as_ref()
                    .map(|p| format!(" with prefix '{}'", p))
                    .unwrap_or_default()
            ),
            None,
        )
    }

    pub fn config_fallback(path: &str, reason: &str) -> Self {
        Self::new(
            DiagnosticKind::ConfigFallback,
            format!("Using built-in defaults: {}", reason),
            Some(path),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub files_scanned: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub files_skipped: usize,
    pub tokens: usize,
    pub components: usize,
    pub components_needing_attention: usize,
    pub hardcoded_values: usize,
    pub hardcoded_occurrences: usize,
}

/// Complete result of a token coverage audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCoverageReport {
    pub source_path: String,
    pub usage_mapping: Vec<UsageRecord>,
    pub hardcoded_values: Vec<HardcodedValue>,
    pub redundancies: Vec<TokenRedundancy>,
    pub coverage_metrics: CoverageMetrics,
    pub component_usage: Vec<ComponentTokenUsage>,
    pub convention: DetectedConvention,
    pub summary: AuditSummary,
    pub diagnostics: Vec<Diagnostic>,
    pub generated_at: String,
}

impl TokenCoverageReport {
    pub fn needs_attention(&self) -> bool {
        self.component_usage.iter().any(|c| c.needs_attention)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Catalog globs. Empty means the configured `scan.tokens` patterns.
    pub tokens: Vec<String>,
    /// Explicit config file. Errors in it are fatal, unlike the project's own.
    pub config: Option<PathBuf>,
    pub skip_components: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    DetectConvention,
    InitUsageMap,
    ScanSources,
    ComputeRedundancy,
    ComputeMetrics,
    AnalyzeComponents,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::DetectConvention => "detect convention",
            Phase::InitUsageMap => "init usage map",
            Phase::ScanSources => "scan sources",
            Phase::ComputeRedundancy => "compute redundancy",
            Phase::ComputeMetrics => "compute metrics",
            Phase::AnalyzeComponents => "analyze components",
            Phase::Done => "done",
        }
    }
}

fn enter(phase: Phase) {
    log_status!("audit", "Phase: {}", phase.as_str());
}

// ============================================================================
// Public API
// ============================================================================

/// Audit a project directory on disk.
pub fn audit_path(path: &str, options: &AuditOptions) -> Result<TokenCoverageReport> {
    let root = Path::new(path);
    if !root.is_dir() {
        return Err(Error::validation_invalid_argument(
            "path",
            format!("Not a directory: {}", path),
            None,
            None,
        ));
    }
    let fs = LocalFs::new(root);
    audit_fs(&fs, options)
}

/// Audit any file collaborator: resolve config, load the catalog, run.
pub fn audit_fs(fs: &dyn FileSystem, options: &AuditOptions) -> Result<TokenCoverageReport> {
    enter(Phase::Init);
    let mut diagnostics = Vec::new();

    let config = match &options.config {
        Some(path) => defaults::load_config_file(path)?.defaults,
        None => match defaults::load_config_from(fs, CONFIG_FILE) {
            Ok(found) => found.unwrap_or_default().defaults,
            Err(err) => {
                log_status!("audit", "Ignoring {}: {}", CONFIG_FILE, err);
                diagnostics.push(Diagnostic::config_fallback(CONFIG_FILE, &err.to_string()));
                Defaults::default()
            }
        },
    };

    let patterns = if options.tokens.is_empty() {
        config.scan.tokens.clone()
    } else {
        options.tokens.clone()
    };
    let loaded = load_catalog(fs, &patterns)?;
    for skipped in &loaded.skipped {
        diagnostics.push(Diagnostic::token_file_skipped(&skipped.path, &skipped.reason));
    }

    let mut report = audit_with(fs, &config, &loaded.catalog, options);
    diagnostics.append(&mut report.diagnostics);
    report.diagnostics = diagnostics;
    Ok(report)
}

/// Run every phase against an already-loaded catalog. Never fails.
pub fn audit_with(
    fs: &dyn FileSystem,
    config: &Defaults,
    catalog: &TokenCatalog,
    options: &AuditOptions,
) -> TokenCoverageReport {
    let source_path = fs.root().display().to_string();
    log_status!("audit", "Auditing {} against {} token(s)", source_path, catalog.len());
    let mut diagnostics = Vec::new();

    enter(Phase::DetectConvention);
    let convention = convention::detect(fs, &config.convention);
    if convention.is_default() {
        diagnostics.push(Diagnostic::convention_assumed(&convention.pattern));
    }
    let matcher = ValueMatcher::new(catalog, convention.pattern.clone(), &config.matching);

    enter(Phase::InitUsageMap);
    let usage = usage::UsageMap::from_catalog(catalog);

    enter(Phase::ScanSources);
    let files = match fs.scan_files(&config.scan.include, &config.scan.exclude) {
        Ok(files) => files,
        Err(err) => {
            log_status!("audit", "File discovery failed: {}", err);
            diagnostics.push(Diagnostic::file_skipped(&source_path, &err.to_string()));
            Vec::new()
        }
    };
    let mut outcome = scan::scan_sources(fs, files, &matcher, usage);
    diagnostics.append(&mut outcome.diagnostics);

    enter(Phase::ComputeRedundancy);
    let redundancies = matcher.find_redundant_tokens();

    enter(Phase::ComputeMetrics);
    let coverage_metrics = metrics::compute_metrics(catalog, &outcome.usage);

    enter(Phase::AnalyzeComponents);
    let component_usage = if options.skip_components {
        Vec::new()
    } else {
        let (found, mut failed) =
            components::analyze_components(fs, &outcome, &matcher, &config.attention);
        diagnostics.append(&mut failed);
        found
    };

    enter(Phase::Done);
    let summary = AuditSummary {
        files_scanned: outcome.sources.len(),
        files_skipped: outcome.files_skipped,
        tokens: catalog.len(),
        components: component_usage.len(),
        components_needing_attention: component_usage.iter().filter(|c| c.needs_attention).count(),
        hardcoded_values: outcome.hardcoded.len(),
        hardcoded_occurrences: outcome.hardcoded.occurrences(),
    };

    log_status!(
        "audit",
        "Complete: {} files, {}/{} tokens used ({:.1}%), {} hardcoded occurrence(s)",
        summary.files_scanned,
        coverage_metrics.used_tokens,
        coverage_metrics.total_tokens,
        coverage_metrics.coverage_percentage,
        summary.hardcoded_occurrences
    );

    TokenCoverageReport {
        source_path,
        usage_mapping: outcome.usage.into_records(),
        hardcoded_values: outcome.hardcoded.into_values(),
        redundancies,
        coverage_metrics,
        component_usage,
        convention,
        summary,
        diagnostics,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_files::MemoryFs;

    const TOKENS: &str = r##"{
  "color": {
    "primary": { "value": "#0000FF", "type": "color" },
    "link": { "value": "{color.primary}" }
  },
  "spacing": {
    "sm": { "value": "8px" },
    "small": { "value": "8px" }
  }
}"##;

    fn project() -> MemoryFs {
        MemoryFs::new()
            .with_file("tokens/core.json", TOKENS)
            .with_file("src/styles/app.css", ".app {\n  color: #0000FF;\n  background: #0000FE;\n  border-color: #112233;\n}")
    }

    #[test]
    fn missing_catalog_is_fatal() {
        let fs = MemoryFs::new().with_file("src/a.css", ".a { color: red; }");
        let err = audit_fs(&fs, &AuditOptions::default()).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::CatalogNotFound);
    }

    #[test]
    fn audit_collects_usage_findings_and_redundancy() {
        let report = audit_fs(&project(), &AuditOptions::default()).unwrap();

        assert_eq!(report.summary.tokens, 4);
        assert!(report.usage_mapping.len() >= 4);
        let primary = report
            .usage_mapping
            .iter()
            .find(|r| r.token_name == "color.primary")
            .unwrap();
        // One alias credit plus one literal match.
        assert_eq!(primary.usage_count, 2);

        assert_eq!(report.hardcoded_values.len(), 2);
        assert_eq!(report.hardcoded_values[0].matched_token.as_deref(), Some("color.primary"));
        assert_eq!(report.hardcoded_values[1].matched_token, None);

        assert_eq!(report.redundancies.len(), 2);
        assert!(report
            .redundancies
            .iter()
            .any(|g| g.tokens == vec!["spacing.sm", "spacing.small"]));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ConventionAssumed));
    }

    #[test]
    fn broken_project_config_falls_back() {
        let fs = project().with_file(CONFIG_FILE, "{ not json");
        let report = audit_fs(&fs, &AuditOptions::default()).unwrap();
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ConfigFallback));
        assert_eq!(report.summary.files_scanned, 1);
    }

    #[test]
    fn skipping_components_leaves_usage_intact() {
        let fs = project().with_file(
            "src/components/Badge.tsx",
            "export const Badge = () => <span style={{ color: '#112233' }} />;",
        );
        let options = AuditOptions {
            skip_components: true,
            ..Default::default()
        };
        let report = audit_fs(&fs, &options).unwrap();
        assert!(report.component_usage.is_empty());
        assert_eq!(report.summary.files_scanned, 2);

        let full = audit_fs(&fs, &AuditOptions::default()).unwrap();
        assert_eq!(full.component_usage.len(), 1);
        assert!(full.needs_attention());
        assert_eq!(
            full.component_usage[0].attention_reasons,
            vec!["Low token coverage (0%)", "No design tokens used"]
        );
    }
}
