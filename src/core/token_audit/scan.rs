//! Source scanning: structural references, then a line-by-line literal pass.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::matcher::{ApproximateMatch, ClassMatch, ValueMatcher};
use super::references::{extract_all_token_references, extract_token_reference, TokenReference};
use super::source_kind::{Literal, SourceKind, SourceReferences};
use super::usage::{FileReference, UsageMap};
use super::values::{is_expression_or_sentinel, is_hardcodable, literal_type, normalize_value, split_value_parts};
use super::Diagnostic;
use crate::local_files::{FileInfo, FileSystem};
use crate::tokens::{Token, TokenType};

/// A literal that duplicates or nearly duplicates a token value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardcodedValue {
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: TokenType,
    pub property: String,
    pub files: Vec<FileReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl HardcodedValue {
    pub fn occurrences(&self) -> usize {
        self.files.len()
    }

    pub fn is_near_miss(&self) -> bool {
        self.matched_token.is_some()
    }
}

/// Three decimals, capped below 1.0: a 1.0 would read as an exact match.
fn reported_similarity(similarity: f64) -> f64 {
    ((similarity * 1000.0).round() / 1000.0).min(0.999)
}

/// Findings keyed by `(value, property)`, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct HardcodedTable {
    values: Vec<HardcodedValue>,
    index: HashMap<(String, String), usize>,
}

impl HardcodedTable {
    pub fn add(
        &mut self,
        value: &str,
        property: &str,
        reference: FileReference,
        near: Option<ApproximateMatch<'_>>,
    ) {
        let key = (value.to_string(), property.to_string());
        let idx = match self.index.get(&key) {
            Some(idx) => *idx,
            None => {
                self.values.push(HardcodedValue {
                    value: value.to_string(),
                    value_type: literal_type(value, Some(property)),
                    property: property.to_string(),
                    files: Vec::new(),
                    matched_token: near.map(|m| m.token.name.clone()),
                    similarity: near.map(|m| reported_similarity(m.similarity)),
                });
                self.index.insert(key, self.values.len() - 1);
                self.values.len() - 1
            }
        };
        self.values[idx].files.push(reference);
    }

    pub fn values(&self) -> &[HardcodedValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<HardcodedValue> {
        self.values
    }

    /// Total occurrences across every finding.
    pub fn occurrences(&self) -> usize {
        self.values.iter().map(HardcodedValue::occurrences).sum()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A file read for scanning, with its structural references already extracted.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub info: FileInfo,
    pub kind: SourceKind,
    pub text: String,
    pub references: SourceReferences,
}

impl SourceFile {
    pub fn new(info: FileInfo, text: String) -> Self {
        let kind = SourceKind::from_path(&info.path);
        let references = kind.extract_references(&text);
        Self {
            info,
            kind,
            text,
            references,
        }
    }
}

/// Everything the scan phase hands to later phases.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub usage: UsageMap,
    pub hardcoded: HardcodedTable,
    pub sources: Vec<SourceFile>,
    /// Generated utility classes with no catalog token, per file.
    pub utility_classes: BTreeMap<String, usize>,
    pub diagnostics: Vec<Diagnostic>,
    pub files_skipped: usize,
}

// ============================================================================
// Phase entry point
// ============================================================================

/// Read and scan every file. Unreadable files are logged and skipped.
pub fn scan_sources(
    fs: &dyn FileSystem,
    files: Vec<FileInfo>,
    matcher: &ValueMatcher<'_>,
    mut usage: UsageMap,
) -> ScanOutcome {
    let mut diagnostics = Vec::new();
    let mut sources = Vec::with_capacity(files.len());
    let mut files_skipped = 0;

    for info in files {
        match fs.read(&info.path) {
            Ok(text) => sources.push(SourceFile::new(info, text)),
            Err(err) => {
                log_status!("scan", "Skipping {}: {}", info.path, err);
                diagnostics.push(Diagnostic::file_skipped(&info.path, &err.to_string()));
                files_skipped += 1;
            }
        }
    }

    register_definitions(&sources, matcher, &mut usage);

    let mut hardcoded = HardcodedTable::default();
    let mut utility_classes = BTreeMap::new();
    for source in &sources {
        let hits = scan_source(source, matcher, &mut usage, &mut hardcoded);
        if hits > 0 {
            utility_classes.insert(source.info.path.clone(), hits);
        }
    }

    log_status!(
        "scan",
        "Scanned {} file(s), {} hardcoded value(s)",
        sources.len(),
        hardcoded.occurrences()
    );

    ScanOutcome {
        usage,
        hardcoded,
        sources,
        utility_classes,
        diagnostics,
        files_skipped,
    }
}

/// Custom properties defined as a token reference or a token's exact value
/// join the token system, so their own usages are counted.
pub fn register_definitions(sources: &[SourceFile], matcher: &ValueMatcher<'_>, usage: &mut UsageMap) {
    for source in sources {
        for definition in &source.references.style.definitions {
            let value = normalize_value(&definition.value);
            let points_at_token = match extract_token_reference(&value) {
                Some(reference) => resolve_reference(matcher, &reference).is_some(),
                None => matcher.find_exact_match(&value, None).is_some(),
            };
            if points_at_token {
                usage.register_system_variable(&definition.name);
            }
        }
    }
}

/// Scan one file into the shared tables. Returns generated utility class hits.
pub fn scan_source(
    source: &SourceFile,
    matcher: &ValueMatcher<'_>,
    usage: &mut UsageMap,
    hardcoded: &mut HardcodedTable,
) -> usize {
    let mut scanner = Scanner {
        path: &source.info.path,
        kind: source.kind,
        matcher,
        usage,
        hardcoded,
        utility_classes: 0,
    };
    scanner.record_structural(&source.references);
    for literal in source.kind.extract_literals(&source.text) {
        scanner.handle_literal(&literal);
    }
    scanner.utility_classes
}

/// Scan a file outside the main pass, into tables of its own.
pub fn scan_isolated(source: &SourceFile, matcher: &ValueMatcher<'_>) -> (UsageMap, HardcodedTable) {
    let mut usage = UsageMap::from_catalog(matcher.catalog());
    let mut hardcoded = HardcodedTable::default();
    scan_source(source, matcher, &mut usage, &mut hardcoded);
    (usage, hardcoded)
}

/// Resolve a single-value reference to a catalog token.
pub fn resolve_reference<'m>(matcher: &ValueMatcher<'m>, reference: &TokenReference) -> Option<&'m Token> {
    if reference.is_variable() {
        matcher.find_token_by_custom_property_name(&reference.name)
    } else {
        resolve_api_path(matcher, &reference.name)
    }
}

/// Try the whole path, then every shorter sub-path, longest first.
fn resolve_api_path<'m>(matcher: &ValueMatcher<'m>, path: &str) -> Option<&'m Token> {
    if let Some(token) = matcher.catalog().get(path) {
        return Some(token);
    }
    let mut candidates = extract_all_token_references(path);
    if candidates.is_empty() {
        candidates.push(path.to_string());
    }
    candidates
        .iter()
        .find_map(|candidate| matcher.find_token_by_api_reference(candidate))
}

// ============================================================================
// Per-file scanner
// ============================================================================

struct Scanner<'s, 'm> {
    path: &'s str,
    kind: SourceKind,
    matcher: &'s ValueMatcher<'m>,
    usage: &'s mut UsageMap,
    hardcoded: &'s mut HardcodedTable,
    utility_classes: usize,
}

impl Scanner<'_, '_> {
    fn at(&self, line: usize, context: &str) -> FileReference {
        FileReference::new(self.path, line, context)
    }

    fn record_structural(&mut self, refs: &SourceReferences) {
        for class in &refs.script.class_names {
            match self.matcher.find_token_by_class_name(&class.value) {
                Some(ClassMatch::Token(token)) => {
                    let at = self.at(class.line, &class.context);
                    self.usage.record(&token.name, at);
                }
                Some(ClassMatch::Category(_)) => self.utility_classes += 1,
                None => {}
            }
        }

        for api in &refs.script.api_references {
            if let Some(token) = resolve_api_path(self.matcher, &api.value) {
                let at = self.at(api.line, &api.context);
                self.usage.record(&token.name, at);
            }
        }

        for prop in &refs.script.prop_usages {
            if let Some(token) = self.matcher.find_token_by_prop_value(&prop.prop, &prop.value) {
                let at = self.at(prop.line, &prop.context);
                self.usage.record(&token.name, at);
            } else {
                let literal = Literal {
                    property: prop.prop.clone(),
                    value: prop.value.clone(),
                    line: prop.line,
                    context: prop.context.clone(),
                };
                self.handle_literal(&literal);
            }
        }

        for usage in &refs.style.usages {
            let at = self.at(usage.line, &usage.context);
            self.usage.record_custom_property(self.matcher, &usage.value, at);
        }
    }

    /// References are recorded and never value-matched. Everything else goes
    /// through exact match, near-miss and then plausibility as a hardcoded value.
    fn handle_literal(&mut self, literal: &Literal) {
        let value = normalize_value(&literal.value);
        if value.is_empty() {
            return;
        }
        let at = self.at(literal.line, &literal.context);

        if let Some(reference) = extract_token_reference(&value) {
            self.handle_reference(&reference, at);
            return;
        }

        let parts = split_value_parts(&value);
        if parts.len() <= 1 {
            self.handle_part(&value, &literal.property, at);
            return;
        }
        // Composite values (shadows, borders) may match a token as a whole.
        if let Some(token) = self.matcher.find_exact_match(&value, Some(&literal.property)) {
            self.usage.record(&token.name, at);
            return;
        }
        for part in parts {
            self.handle_part(&part, &literal.property, at.clone());
        }
    }

    fn handle_part(&mut self, value: &str, property: &str, at: FileReference) {
        if let Some(reference) = extract_token_reference(value) {
            self.handle_reference(&reference, at);
            return;
        }
        if is_expression_or_sentinel(value) {
            return;
        }
        if let Some(token) = self.matcher.find_exact_match(value, Some(property)) {
            self.usage.record(&token.name, at);
            return;
        }

        let near = self
            .matcher
            .find_approximate_match(value, Some(property))
            .filter(|m| m.similarity >= self.matcher.threshold());
        if near.is_some() || is_hardcodable(value, Some(property)) {
            self.hardcoded.add(value, property, at, near);
        }
    }

    fn handle_reference(&mut self, reference: &TokenReference, at: FileReference) {
        if self.kind.counts_structurally(reference.form) {
            return;
        }
        if reference.is_variable() {
            self.usage.record_custom_property(self.matcher, &reference.name, at);
        } else if let Some(token) = resolve_reference(self.matcher, reference) {
            self.usage.record(&token.name, at);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
