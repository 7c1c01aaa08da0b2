//! Value and reference matching against the token catalog.

use std::collections::HashMap;
use std::sync::LazyLock;

use heck::ToKebabCase;
use regex::Regex;
use serde::Serialize;

use super::convention::TransformPattern;
use super::values::{
    canonical_value, classify_value, normalize_value, parse_color, parse_length, property_kind,
    Length, Rgba, ValueKind,
};
use crate::defaults::MatchingConfig;
use crate::tokens::{Token, TokenCatalog, TokenType};

/// Root objects stripped from API paths (`theme.colors.primary`).
const API_ROOTS: &[&str] = &["theme", "tokens", "t", "vars", "designTokens", "$tokens", "dt"];

/// Plural path segments and their catalog spelling.
const SINGULAR_SEGMENTS: &[(&str, &str)] = &[
    ("colors", "color"),
    ("spacings", "spacing"),
    ("sizes", "size"),
    ("fonts", "font"),
    ("fontSizes", "fontSize"),
    ("fontWeights", "fontWeight"),
    ("lineHeights", "lineHeight"),
    ("shadows", "shadow"),
    ("borders", "border"),
    ("radii", "radius"),
];

/// Utility class prefixes and the token types they draw from. Longest prefixes first.
const UTILITY_PREFIXES: &[(&str, &[TokenType])] = &[
    ("tracking-", &[TokenType::Typography]),
    ("leading-", &[TokenType::Typography]),
    ("rounded-", &[TokenType::Border, TokenType::Spacing]),
    ("outline-", &[TokenType::Color, TokenType::Border]),
    ("border-", &[TokenType::Color, TokenType::Border]),
    ("stroke-", &[TokenType::Color]),
    ("shadow-", &[TokenType::Shadow]),
    ("space-", &[TokenType::Spacing]),
    ("text-", &[TokenType::Color, TokenType::Typography]),
    ("font-", &[TokenType::Typography]),
    ("fill-", &[TokenType::Color]),
    ("ring-", &[TokenType::Color]),
    ("gap-", &[TokenType::Spacing]),
    ("bg-", &[TokenType::Color]),
    ("px-", &[TokenType::Spacing]),
    ("py-", &[TokenType::Spacing]),
    ("pt-", &[TokenType::Spacing]),
    ("pr-", &[TokenType::Spacing]),
    ("pb-", &[TokenType::Spacing]),
    ("pl-", &[TokenType::Spacing]),
    ("mx-", &[TokenType::Spacing]),
    ("my-", &[TokenType::Spacing]),
    ("mt-", &[TokenType::Spacing]),
    ("mr-", &[TokenType::Spacing]),
    ("mb-", &[TokenType::Spacing]),
    ("ml-", &[TokenType::Spacing]),
    ("p-", &[TokenType::Spacing]),
    ("m-", &[TokenType::Spacing]),
];

/// Style props and the token types their values name.
const PROP_TYPES: &[(&str, &[TokenType])] = &[
    ("color", &[TokenType::Color]),
    ("bg", &[TokenType::Color]),
    ("background", &[TokenType::Color]),
    ("backgroundColor", &[TokenType::Color]),
    ("borderColor", &[TokenType::Color, TokenType::Border]),
    ("fill", &[TokenType::Color]),
    ("stroke", &[TokenType::Color]),
    ("p", &[TokenType::Spacing]),
    ("px", &[TokenType::Spacing]),
    ("py", &[TokenType::Spacing]),
    ("m", &[TokenType::Spacing]),
    ("mx", &[TokenType::Spacing]),
    ("my", &[TokenType::Spacing]),
    ("padding", &[TokenType::Spacing]),
    ("margin", &[TokenType::Spacing]),
    ("gap", &[TokenType::Spacing]),
    ("spacing", &[TokenType::Spacing]),
    ("size", &[TokenType::Spacing, TokenType::Typography]),
    ("fontSize", &[TokenType::Typography]),
    ("fontWeight", &[TokenType::Typography]),
    ("fontFamily", &[TokenType::Typography]),
    ("lineHeight", &[TokenType::Typography]),
    ("shadow", &[TokenType::Shadow]),
    ("boxShadow", &[TokenType::Shadow]),
    ("elevation", &[TokenType::Shadow]),
    ("radius", &[TokenType::Border]),
    ("rounded", &[TokenType::Border]),
    ("borderRadius", &[TokenType::Border]),
];

static COLOR_SCALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+(?:-[a-z]+)?-\d{2,3}$").unwrap());

static SIZE_SCALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+(?:\.\d+)?|\d?x[sl]|sm|md|lg|base|px)$").unwrap());

/// A near-miss between a literal and a token.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateMatch<'a> {
    pub token: &'a Token,
    pub similarity: f64,
}

/// What a utility class resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassMatch<'a> {
    /// A specific catalog token.
    Token(&'a Token),
    /// A generated utility class for a token category, without a catalog hit.
    Category(TokenType),
}

/// Tokens sharing one effective value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRedundancy {
    pub value: String,
    pub tokens: Vec<String>,
}

/// Matches literals and symbolic references to catalog tokens.
///
/// All indexes are built once from the catalog; every lookup breaks ties by
/// catalog order.
pub struct ValueMatcher<'a> {
    catalog: &'a TokenCatalog,
    pattern: TransformPattern,
    threshold: f64,
    rem_base_px: f64,
    by_value: HashMap<String, Vec<usize>>,
    colors: Vec<(usize, Rgba)>,
    lengths: Vec<(usize, Length)>,
    pattern_names: HashMap<String, usize>,
    kebab_names: HashMap<String, usize>,
    loose_names: HashMap<String, usize>,
}

impl<'a> ValueMatcher<'a> {
    pub fn new(catalog: &'a TokenCatalog, pattern: TransformPattern, matching: &MatchingConfig) -> Self {
        let mut matcher = Self {
            catalog,
            pattern,
            threshold: matching.approximate_threshold,
            rem_base_px: matching.rem_base_px,
            by_value: HashMap::new(),
            colors: Vec::new(),
            lengths: Vec::new(),
            pattern_names: HashMap::new(),
            kebab_names: HashMap::new(),
            loose_names: HashMap::new(),
        };

        for (idx, token) in catalog.tokens().iter().enumerate() {
            matcher
                .pattern_names
                .entry(matcher.pattern.to_variable_name(&token.name))
                .or_insert(idx);
            matcher.kebab_names.entry(token.name.to_kebab_case()).or_insert(idx);
            matcher.loose_names.entry(loose_key(&token.name)).or_insert(idx);

            let Some(resolved) = catalog.resolve_value(token) else {
                continue;
            };
            let normalized = normalize_value(resolved);
            matcher
                .by_value
                .entry(canonical_value(&normalized, matcher.rem_base_px))
                .or_default()
                .push(idx);
            if let Some(color) = parse_color(&normalized) {
                matcher.colors.push((idx, color));
            } else if let Some(length) = parse_length(&normalized).filter(|l| !l.unit.is_empty()) {
                matcher.lengths.push((idx, length));
            }
        }

        matcher
    }

    pub fn catalog(&self) -> &'a TokenCatalog {
        self.catalog
    }

    pub fn pattern(&self) -> &TransformPattern {
        &self.pattern
    }

    /// Similarity a near-miss needs before it is reported against a token.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn token(&self, idx: usize) -> &'a Token {
        &self.catalog.tokens()[idx]
    }

    // ========================================================================
    // Literal matching
    // ========================================================================

    /// Literal equality after normalization.
    ///
    /// With a property, only tokens that property can stand in for are
    /// candidates; a unitless number additionally needs a property that names
    /// the token's type (`z-index: 400` is not a font weight). Base tokens win
    /// over aliases sharing their value, then catalog order decides.
    pub fn find_exact_match(&self, value: &str, property: Option<&str>) -> Option<&'a Token> {
        let normalized = normalize_value(value);
        if normalized.is_empty() {
            return None;
        }
        let candidates = self.by_value.get(&canonical_value(&normalized, self.rem_base_px))?;
        let kind = property.map(property_kind);
        let unitless = classify_value(&normalized) == ValueKind::Number;

        let compatible = |token: &Token| match kind {
            None => true,
            Some(k) if unitless => k.token_types().contains(&token.token_type),
            Some(k) => k.accepts(token.token_type),
        };

        let mut matches = candidates
            .iter()
            .map(|idx| self.token(*idx))
            .filter(|token| compatible(*token));
        let first = matches.next()?;
        if !first.is_alias() {
            return Some(first);
        }
        matches.find(|token| !token.is_alias()).or(Some(first))
    }

    /// Closest color or length token. Exact matches never come back from here.
    pub fn find_approximate_match(
        &self,
        value: &str,
        property: Option<&str>,
    ) -> Option<ApproximateMatch<'a>> {
        if self.find_exact_match(value, property).is_some() {
            return None;
        }
        let normalized = normalize_value(value);
        let kind = property.map(property_kind);
        let accepts = |token: &Token| kind.map_or(true, |k| k.accepts(token.token_type));

        let scored: Vec<(usize, f64)> = if let Some(color) = parse_color(&normalized) {
            self.colors
                .iter()
                .filter(|(idx, _)| accepts(self.token(*idx)))
                .map(|(idx, candidate)| (*idx, color.similarity(candidate)))
                .collect()
        } else if let Some(length) = parse_length(&normalized).filter(|l| !l.unit.is_empty()) {
            self.lengths
                .iter()
                .filter(|(idx, _)| accepts(self.token(*idx)))
                .filter_map(|(idx, candidate)| {
                    length
                        .similarity(candidate, self.rem_base_px)
                        .map(|s| (*idx, s))
                })
                .collect()
        } else {
            return None;
        };

        let mut best: Option<(usize, f64)> = None;
        for (idx, similarity) in scored {
            if similarity >= 1.0 {
                continue;
            }
            if best.map_or(true, |(_, top)| similarity > top) {
                best = Some((idx, similarity));
            }
        }

        best.map(|(idx, similarity)| ApproximateMatch {
            token: self.token(idx),
            similarity,
        })
    }

    /// Groups of tokens whose resolved values are equal, ordered by first member.
    /// Unresolvable aliases are left out.
    pub fn find_redundant_tokens(&self) -> Vec<TokenRedundancy> {
        let mut groups: Vec<(&String, &Vec<usize>)> =
            self.by_value.iter().filter(|(_, members)| members.len() > 1).collect();
        groups.sort_by_key(|(_, members)| members[0]);

        groups
            .into_iter()
            .map(|(value, members)| TokenRedundancy {
                value: value.clone(),
                tokens: members.iter().map(|idx| self.token(*idx).name.clone()).collect(),
            })
            .collect()
    }

    // ========================================================================
    // Structural matching
    // ========================================================================

    /// Resolve a utility or semantic class name.
    pub fn find_token_by_class_name(&self, class_name: &str) -> Option<ClassMatch<'a>> {
        let class_name = strip_variants(class_name);
        if class_name.is_empty() {
            return None;
        }
        self.class_direct(class_name)
            .or_else(|| self.class_prefix_stripped(class_name))
            .or_else(|| self.class_generated(class_name))
            .or_else(|| self.class_part_overlap(class_name))
    }

    fn class_direct(&self, class_name: &str) -> Option<ClassMatch<'a>> {
        self.pattern_names
            .get(class_name)
            .or_else(|| self.kebab_names.get(class_name))
            .map(|idx| ClassMatch::Token(self.token(*idx)))
    }

    fn class_prefix_stripped(&self, class_name: &str) -> Option<ClassMatch<'a>> {
        let (prefix, types) = utility_prefix(class_name)?;
        let rest = &class_name[prefix.len()..];
        let suffix = format!("-{}", rest);

        self.catalog
            .tokens()
            .iter()
            .filter(|token| types.contains(&token.token_type))
            .find(|token| {
                let kebab = token.name.to_kebab_case();
                kebab == rest || kebab.ends_with(&suffix)
            })
            .map(ClassMatch::Token)
    }

    fn class_generated(&self, class_name: &str) -> Option<ClassMatch<'a>> {
        let (prefix, types) = utility_prefix(class_name)?;
        let rest = &class_name[prefix.len()..];

        if COLOR_SCALE.is_match(rest) && types.contains(&TokenType::Color) {
            return Some(ClassMatch::Category(TokenType::Color));
        }
        if SIZE_SCALE.is_match(rest) {
            let category = types
                .iter()
                .copied()
                .find(|t| *t != TokenType::Color)
                .unwrap_or(types[0]);
            return Some(ClassMatch::Category(category));
        }
        None
    }

    fn class_part_overlap(&self, class_name: &str) -> Option<ClassMatch<'a>> {
        let parts: Vec<&str> = class_name.split(['-', '_']).filter(|p| !p.is_empty()).collect();
        if parts.len() < 2 {
            return None;
        }

        let mut best: Option<(usize, usize)> = None;
        for (idx, token) in self.catalog.tokens().iter().enumerate() {
            let kebab = token.name.to_kebab_case();
            let segments: Vec<&str> = kebab.split('-').collect();
            if !parts.iter().all(|p| segments.contains(p)) {
                continue;
            }
            let extra = segments.len() - parts.len().min(segments.len());
            if best.map_or(true, |(_, fewest)| extra < fewest) {
                best = Some((idx, extra));
            }
        }
        best.map(|(idx, _)| ClassMatch::Token(self.token(idx)))
    }

    /// Resolve a dotted API path (`theme.colors.primary`, `tokens.spacing.md`).
    pub fn find_token_by_api_reference(&self, reference: &str) -> Option<&'a Token> {
        let mut segments: Vec<&str> = reference
            .split('.')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if segments.len() > 1 && API_ROOTS.contains(&segments[0]) {
            segments.remove(0);
        }
        if segments.is_empty() {
            return None;
        }

        let raw = segments.join(".");
        let singular = segments
            .iter()
            .map(|s| {
                SINGULAR_SEGMENTS
                    .iter()
                    .find(|(plural, _)| plural == s)
                    .map_or(*s, |(_, single)| *single)
            })
            .collect::<Vec<_>>()
            .join(".");

        if let Some(token) = self.catalog.get(&raw).or_else(|| self.catalog.get(&singular)) {
            return Some(token);
        }

        let key = loose_key(&singular);
        if let Some(idx) = self.loose_names.get(&key).or_else(|| self.loose_names.get(&loose_key(&raw))) {
            return Some(self.token(*idx));
        }

        if segments.len() < 2 {
            return None;
        }
        let suffix = format!(".{}", singular);
        self.catalog
            .tokens()
            .iter()
            .find(|token| token.name.ends_with(&suffix))
    }

    /// Resolve a component prop value (`<Box bg="brand.500" p="md">`).
    pub fn find_token_by_prop_value(&self, prop: &str, value: &str) -> Option<&'a Token> {
        let (_, types) = PROP_TYPES.iter().find(|(name, _)| *name == prop)?;
        let value = normalize_value(value.trim_matches(|c: char| c == '{' || c == '}'));
        if value.is_empty() {
            return None;
        }

        if let Some(token) = self.catalog.get(&value) {
            return Some(token);
        }

        let key = loose_key(&value);
        if key.is_empty() {
            return None;
        }
        self.catalog.tokens().iter().find(|token| {
            if !types.contains(&token.token_type) {
                return false;
            }
            let name_key = loose_key(&token.name);
            name_key == key
                || token
                    .name
                    .rsplit('.')
                    .next()
                    .is_some_and(|last| loose_key(last) == key)
                || (value.contains(['.', '-']) && name_key.ends_with(&key))
        })
    }

    /// Resolve a custom property name (without `--`).
    pub fn find_token_by_custom_property_name(&self, variable: &str) -> Option<&'a Token> {
        let variable = variable.trim().trim_start_matches("--").trim_start_matches('$');
        if variable.is_empty() {
            return None;
        }
        self.variable_by_pattern(variable)
            .or_else(|| self.variable_by_kebab(variable))
            .or_else(|| self.variable_prefix_stripped(variable))
            .or_else(|| self.variable_loose(variable))
    }

    fn variable_by_pattern(&self, variable: &str) -> Option<&'a Token> {
        self.pattern_names.get(variable).map(|idx| self.token(*idx))
    }

    fn variable_by_kebab(&self, variable: &str) -> Option<&'a Token> {
        self.kebab_names.get(variable).map(|idx| self.token(*idx))
    }

    fn variable_prefix_stripped(&self, variable: &str) -> Option<&'a Token> {
        let stripped = self.pattern.strip_prefix(variable);
        if stripped != variable {
            if let Some(idx) = self.kebab_names.get(stripped) {
                return Some(self.token(*idx));
            }
        }
        // An unknown one-segment prefix (`--acme-color-primary`).
        let (_, rest) = variable.split_once(['-', '_'])?;
        self.kebab_names.get(rest).map(|idx| self.token(*idx))
    }

    fn variable_loose(&self, variable: &str) -> Option<&'a Token> {
        self.loose_names
            .get(&loose_key(self.pattern.strip_prefix(variable)))
            .or_else(|| self.loose_names.get(&loose_key(variable)))
            .map(|idx| self.token(*idx))
    }
}

/// Lowercase alphanumerics only, so `font.size.md`, `fontSizeMd` and `font-size-md` agree.
fn loose_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Drop responsive/state variants (`md:hover:`), important and negative markers.
fn strip_variants(class_name: &str) -> &str {
    let base = class_name.rsplit(':').next().unwrap_or(class_name);
    base.trim_start_matches('!').trim_start_matches('-')
}

fn utility_prefix(class_name: &str) -> Option<(&'static str, &'static [TokenType])> {
    UTILITY_PREFIXES
        .iter()
        .find(|(prefix, _)| class_name.len() > prefix.len() && class_name.starts_with(prefix))
        .copied()
}

// ============================================================================
// Tests
// ============================================================================
