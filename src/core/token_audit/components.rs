//! Component discovery, classification and per-component coverage.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use super::matcher::ValueMatcher;
use super::scan::{scan_isolated, HardcodedTable, ScanOutcome, SourceFile};
use super::source_kind::SourceKind;
use super::usage::UsageMap;
use super::Diagnostic;
use crate::defaults::AttentionPolicy;
use crate::local_files::{FileInfo, FileSystem};
use crate::Result;

const COMPONENT_EXTENSIONS: &[&str] = &["tsx", "jsx", "vue", "svelte"];

/// File stems that hold helpers rather than components.
const EXCLUDED_STEMS: &[&str] = &["index", "utils", "util", "helpers", "hooks", "constants", "types"];

/// Name fragments of tests, stories and demos.
const EXCLUDED_MARKERS: &[&str] = &[".test.", ".spec.", ".stories.", ".story.", ".demo."];

const EXCLUDED_DIRECTORIES: &[&str] = &["__tests__", "__mocks__", "test", "tests", "stories", "demo", "demos"];

/// Style files paired with a component by stem, in lookup order.
const PAIRED_STYLE_SUFFIXES: &[&str] = &[".module.css", ".module.scss", ".css", ".scss", ".less"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Layout,
    Button,
    Input,
    Text,
    Card,
    Navigation,
    Unknown,
}

/// Keywords per component type, checked in order against the name, then the path.
const COMPONENT_KEYWORDS: &[(ComponentType, &[&str])] = &[
    (ComponentType::Button, &["button", "btn", "fab", "toggle"]),
    (
        ComponentType::Input,
        &["input", "field", "select", "checkbox", "radio", "textarea", "switch", "slider", "form"],
    ),
    (
        ComponentType::Navigation,
        &["nav", "menu", "tab", "breadcrumb", "link", "sidebar", "pagination", "drawer"],
    ),
    (ComponentType::Card, &["card", "tile", "panel", "modal", "dialog", "popover"]),
    (
        ComponentType::Text,
        &["text", "heading", "title", "label", "typography", "paragraph", "caption"],
    ),
    (
        ComponentType::Layout,
        &["layout", "grid", "stack", "container", "box", "flex", "row", "column", "section", "page", "header", "footer", "wrapper"],
    ),
];

fn is_zero(v: &usize) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTokenUsage {
    pub component_path: String,
    pub component_name: String,
    pub component_type: ComponentType,
    pub tokens_used: BTreeSet<String>,
    pub hardcoded_values: usize,
    pub coverage_score: f64,
    pub needs_attention: bool,
    pub attention_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_style: Option<String>,
    /// Generated utility classes for a token category without a catalog hit.
    #[serde(skip_serializing_if = "is_zero")]
    pub utility_classes: usize,
}

// ============================================================================
// Discovery and classification
// ============================================================================

/// Component files among the scanned sources, deduplicated, in path order.
pub fn discover_components(sources: &[SourceFile]) -> Vec<&FileInfo> {
    let mut seen = HashSet::new();
    let mut found: Vec<&FileInfo> = sources
        .iter()
        .filter(|source| source.kind != SourceKind::Style)
        .map(|source| &source.info)
        .filter(|info| is_component_file(info))
        .filter(|info| seen.insert(info.path.clone()))
        .collect();
    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}

pub fn is_component_file(info: &FileInfo) -> bool {
    let stem = component_name(info);
    let lower_name = info.name.to_lowercase();
    let kind = SourceKind::from_extension(&info.extension);

    if kind == SourceKind::Style
        || EXCLUDED_STEMS.contains(&stem.to_lowercase().as_str())
        || EXCLUDED_MARKERS.iter().any(|m| lower_name.contains(m))
        || info.directory.split('/').any(|dir| EXCLUDED_DIRECTORIES.contains(&dir))
    {
        return false;
    }

    COMPONENT_EXTENSIONS.contains(&info.extension.as_str())
        || info.directory.split('/').any(|dir| dir == "components")
        || (kind == SourceKind::Script
            && stem.starts_with(|c: char| c.is_ascii_uppercase()))
}

/// File name up to the first dot.
pub fn component_name(info: &FileInfo) -> &str {
    info.name.split('.').next().unwrap_or(&info.name)
}

/// Keyword lookup on the component name, then on its directory.
pub fn classify_component(name: &str, path: &str) -> ComponentType {
    let name = name.to_lowercase();
    let path = path.to_lowercase();
    [name.as_str(), path.as_str()]
        .iter()
        .find_map(|haystack| {
            COMPONENT_KEYWORDS
                .iter()
                .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
                .map(|(kind, _)| *kind)
        })
        .unwrap_or(ComponentType::Unknown)
}

// ============================================================================
// Coverage and attention
// ============================================================================

/// `tokens / (tokens + hardcoded) * 100`, rounded to one decimal.
pub fn coverage_score(tokens_used: usize, hardcoded: usize) -> f64 {
    match (tokens_used, hardcoded) {
        (0, 0) => 0.0,
        (_, 0) => 100.0,
        (t, h) => ((t as f64 / (t + h) as f64) * 1000.0).round() / 10.0,
    }
}

/// Reasons a component needs attention. A perfect score clears them all.
pub fn attention_reasons(
    tokens_used: usize,
    hardcoded: usize,
    coverage: f64,
    policy: &AttentionPolicy,
) -> Vec<String> {
    if tokens_used > 0 && hardcoded == 0 {
        return Vec::new();
    }

    let mut reasons = Vec::new();
    if coverage < policy.coverage_threshold {
        reasons.push(format!("Low token coverage ({}%)", coverage));
    }
    if hardcoded > policy.high_hardcoded {
        reasons.push(format!("High number of hardcoded values ({})", hardcoded));
    } else if hardcoded > policy.multiple_hardcoded {
        reasons.push(format!("Multiple hardcoded values ({})", hardcoded));
    }
    if tokens_used == 0 && hardcoded > 0 {
        reasons.push("No design tokens used".to_string());
    }
    reasons
}

// ============================================================================
// Analysis
// ============================================================================

/// Analyze every discovered component. A component that fails is logged,
/// reported as a diagnostic and left out.
pub fn analyze_components(
    fs: &dyn FileSystem,
    outcome: &ScanOutcome,
    matcher: &ValueMatcher<'_>,
    policy: &AttentionPolicy,
) -> (Vec<ComponentTokenUsage>, Vec<Diagnostic>) {
    let mut results = Vec::new();
    let mut diagnostics = Vec::new();

    for info in discover_components(&outcome.sources) {
        match analyze_component(fs, info, outcome, matcher, policy) {
            Ok(usage) => results.push(usage),
            Err(err) => {
                log_status!("components", "Skipping {}: {}", info.path, err);
                diagnostics.push(Diagnostic::component_skipped(&info.path, &err.to_string()));
            }
        }
    }

    let flagged = results.iter().filter(|c| c.needs_attention).count();
    log_status!(
        "components",
        "Analyzed {} component(s), {} need attention",
        results.len(),
        flagged
    );
    (results, diagnostics)
}

fn analyze_component(
    fs: &dyn FileSystem,
    info: &FileInfo,
    outcome: &ScanOutcome,
    matcher: &ValueMatcher<'_>,
    policy: &AttentionPolicy,
) -> Result<ComponentTokenUsage> {
    let name = component_name(info).to_string();
    let mut paths = vec![info.path.clone()];
    let mut tokens_used = tokens_at(&outcome.usage, &paths);
    let mut hardcoded = occurrences_at(&outcome.hardcoded, &paths);

    let paired = find_paired_style(fs, info, outcome)?;
    let paired_style = match paired {
        Some(PairedStyle::Scanned(path)) => {
            paths.push(path.clone());
            tokens_used = tokens_at(&outcome.usage, &paths);
            hardcoded = occurrences_at(&outcome.hardcoded, &paths);
            Some(path)
        }
        Some(PairedStyle::Unscanned(source)) => {
            let (usage, table) = scan_isolated(&source, matcher);
            let only = [source.info.path.clone()];
            tokens_used.extend(tokens_at(&usage, &only));
            hardcoded += occurrences_at(&table, &only);
            Some(source.info.path)
        }
        None => None,
    };

    let coverage = coverage_score(tokens_used.len(), hardcoded);
    let attention_reasons = attention_reasons(tokens_used.len(), hardcoded, coverage, policy);

    Ok(ComponentTokenUsage {
        component_path: info.path.clone(),
        component_type: classify_component(&name, &info.directory),
        component_name: name,
        tokens_used,
        hardcoded_values: hardcoded,
        coverage_score: coverage,
        needs_attention: !attention_reasons.is_empty(),
        attention_reasons,
        paired_style,
        utility_classes: outcome.utility_classes.get(&info.path).copied().unwrap_or(0),
    })
}

enum PairedStyle {
    /// Already part of the main scan.
    Scanned(String),
    /// Exists on disk but fell outside the scan patterns.
    Unscanned(SourceFile),
}

fn find_paired_style(fs: &dyn FileSystem, info: &FileInfo, outcome: &ScanOutcome) -> Result<Option<PairedStyle>> {
    let stem = component_name(info);
    for suffix in PAIRED_STYLE_SUFFIXES {
        let candidate = if info.directory.is_empty() {
            format!("{}{}", stem, suffix)
        } else {
            format!("{}/{}{}", info.directory, stem, suffix)
        };

        if outcome.sources.iter().any(|s| s.info.path == candidate) {
            return Ok(Some(PairedStyle::Scanned(candidate)));
        }
        if fs.exists(&candidate) {
            let text = fs.read(&candidate)?;
            let paired_info = FileInfo::from_relative(fs.root(), &candidate, text.len() as u64);
            return Ok(Some(PairedStyle::Unscanned(SourceFile::new(paired_info, text))));
        }
    }
    Ok(None)
}

/// Distinct tokens with a usage in any of `paths`. Custom properties that
/// layer over the token system count under their `--name`.
fn tokens_at(usage: &UsageMap, paths: &[String]) -> BTreeSet<String> {
    usage
        .records()
        .iter()
        .filter(|record| record.files.iter().any(|f| paths.contains(&f.path)))
        .map(|record| record.token_name.clone())
        .collect()
}

fn occurrences_at(table: &HardcodedTable, paths: &[String]) -> usize {
    table
        .values()
        .iter()
        .flat_map(|value| value.files.iter())
        .filter(|f| paths.contains(&f.path))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::MatchingConfig;
    use crate::local_files::MemoryFs;
    use crate::token_audit::convention::TransformPattern;
    use crate::token_audit::scan::scan_sources;
    use crate::tokens::{Token, TokenCatalog, TokenType};

    fn info(path: &str) -> FileInfo {
        FileInfo::from_relative(std::path::Path::new("/p"), path, 0)
    }

    #[test]
    fn discovery_skips_tests_stories_and_helpers() {
        assert!(is_component_file(&info("src/components/Button.tsx")));
        assert!(is_component_file(&info("src/App.vue")));
        assert!(is_component_file(&info("src/components/card.js")));
        assert!(is_component_file(&info("src/widgets/Header.js")));
        assert!(!is_component_file(&info("src/components/Button.test.tsx")));
        assert!(!is_component_file(&info("src/components/Button.stories.tsx")));
        assert!(!is_component_file(&info("src/components/index.tsx")));
        assert!(!is_component_file(&info("src/components/__tests__/Button.tsx")));
        assert!(!is_component_file(&info("src/lib/format.ts")));
        assert!(!is_component_file(&info("src/hooks.tsx")));
        assert!(!is_component_file(&info("src/components/Button.module.css")));
    }

    #[test]
    fn classification_uses_keyword_table() {
        assert_eq!(classify_component("IconButton", "src"), ComponentType::Button);
        assert_eq!(classify_component("TextField", "src"), ComponentType::Input);
        assert_eq!(classify_component("NavBar", "src"), ComponentType::Navigation);
        assert_eq!(classify_component("ProductCard", "src"), ComponentType::Card);
        assert_eq!(classify_component("Heading", "src"), ComponentType::Text);
        assert_eq!(classify_component("Stack", "src"), ComponentType::Layout);
        assert_eq!(classify_component("Avatar", "src/layout"), ComponentType::Layout);
        assert_eq!(classify_component("Avatar", "src/misc"), ComponentType::Unknown);
    }

    #[test]
    fn coverage_edges() {
        assert_eq!(coverage_score(0, 0), 0.0);
        assert_eq!(coverage_score(1, 0), 100.0);
        assert_eq!(coverage_score(3, 8), 27.3);
        assert_eq!(coverage_score(0, 4), 0.0);
    }

    #[test]
    fn attention_reasons_follow_policy() {
        let policy = AttentionPolicy::default();

        assert!(attention_reasons(10, 0, 100.0, &policy).is_empty());

        let reasons = attention_reasons(3, 8, 27.3, &policy);
        assert_eq!(
            reasons,
            vec!["Low token coverage (27.3%)", "Multiple hardcoded values (8)"]
        );

        let reasons = attention_reasons(0, 12, 0.0, &policy);
        assert_eq!(
            reasons,
            vec![
                "Low token coverage (0%)",
                "High number of hardcoded values (12)",
                "No design tokens used"
            ]
        );

        assert!(attention_reasons(9, 1, 90.0, &policy).is_empty());
    }

    #[test]
    fn components_count_paired_style_files() {
        let catalog = TokenCatalog::new(vec![
            Token::new("color.primary", "#0000FF", TokenType::Color),
            Token::new("spacing.md", "16px", TokenType::Spacing),
        ]);
        let matcher = ValueMatcher::new(&catalog, TransformPattern::default(), &MatchingConfig::default());
        let fs = MemoryFs::new()
            .with_file(
                "src/components/Button.tsx",
                "export const Button = () => <button className=\"bg-primary\" />;",
            )
            .with_file(
                "src/components/Button.module.css",
                ".root { padding: 16px; color: #112233; margin: 3px; }",
            )
            .with_file("src/components/Button.test.tsx", "it('renders', () => {});");

        let files = fs.scan_files(&["**/*.tsx".to_string()], &[]).unwrap();
        let outcome = scan_sources(&fs, files, &matcher, UsageMap::from_catalog(&catalog));
        let (components, diagnostics) =
            analyze_components(&fs, &outcome, &matcher, &AttentionPolicy::default());

        assert!(diagnostics.is_empty());
        assert_eq!(components.len(), 1);
        let button = &components[0];
        assert_eq!(button.component_name, "Button");
        assert_eq!(button.component_type, ComponentType::Button);
        assert_eq!(button.paired_style.as_deref(), Some("src/components/Button.module.css"));
        assert_eq!(
            button.tokens_used.iter().cloned().collect::<Vec<_>>(),
            vec!["color.primary", "spacing.md"]
        );
        assert_eq!(button.hardcoded_values, 2);
        assert_eq!(button.coverage_score, 50.0);
        assert!(button.needs_attention);
    }

    #[test]
    fn custom_property_layers_count_as_token_usage() {
        let catalog = TokenCatalog::new(vec![Token::new("color.primary", "#0000FF", TokenType::Color)]);
        let matcher = ValueMatcher::new(&catalog, TransformPattern::default(), &MatchingConfig::default());
        let fs = MemoryFs::new()
            .with_file("src/styles/vars.css", ":root { --surface: var(--color-primary); }")
            .with_file("src/components/Button.tsx", "export const Button = () => <button />;")
            .with_file(
                "src/components/Button.module.css",
                ".root { background: var(--surface); padding: 13px; }",
            );

        let files = fs
            .scan_files(&["**/*.tsx".to_string(), "**/*.css".to_string()], &[])
            .unwrap();
        let outcome = scan_sources(&fs, files, &matcher, UsageMap::from_catalog(&catalog));
        let (components, _) = analyze_components(&fs, &outcome, &matcher, &AttentionPolicy::default());

        let button = &components[0];
        assert_eq!(
            button.tokens_used.iter().cloned().collect::<Vec<_>>(),
            vec!["--surface"]
        );
        assert_eq!(button.hardcoded_values, 1);
        assert_eq!(button.coverage_score, 50.0);
        assert!(!button
            .attention_reasons
            .iter()
            .any(|r| r == "No design tokens used"));
    }

    #[test]
    fn unreadable_paired_style_excludes_component() {
        struct BrokenStyles(MemoryFs);
        impl FileSystem for BrokenStyles {
            fn root(&self) -> &std::path::Path {
                self.0.root()
            }
            fn scan_files(&self, include: &[String], exclude: &[String]) -> Result<Vec<FileInfo>> {
                self.0.scan_files(include, exclude)
            }
            fn read(&self, path: &str) -> Result<String> {
                if path.ends_with(".css") {
                    return Err(crate::Error::internal_io("denied", None));
                }
                self.0.read(path)
            }
            fn exists(&self, path: &str) -> bool {
                self.0.exists(path)
            }
        }

        let catalog = TokenCatalog::new(vec![Token::new("color.primary", "#00f", TokenType::Color)]);
        let matcher = ValueMatcher::new(&catalog, TransformPattern::default(), &MatchingConfig::default());
        let fs = BrokenStyles(
            MemoryFs::new()
                .with_file("src/Card.tsx", "export const Card = () => null;")
                .with_file("src/Card.css", ".card { color: red; }"),
        );
        let files = fs.scan_files(&["**/*.tsx".to_string()], &[]).unwrap();
        let outcome = scan_sources(&fs, files, &matcher, UsageMap::from_catalog(&catalog));
        let (components, diagnostics) =
            analyze_components(&fs, &outcome, &matcher, &AttentionPolicy::default());

        assert!(components.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path.as_deref(), Some("src/Card.tsx"));
    }
}
