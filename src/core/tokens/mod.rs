//! Design token catalog: token records, alias resolution, and loading.

mod loader;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub use loader::{load_catalog, parse_token_document, LoadedCatalog, SkippedTokenFile};

use crate::token_audit::values::parse_color;

/// Longest alias chain followed before giving up.
pub const MAX_ALIAS_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Color,
    Spacing,
    Typography,
    Shadow,
    Border,
    Other,
}

/// Path keywords that imply a token type, checked against each path segment.
const TYPE_KEYWORDS: &[(&str, TokenType)] = &[
    ("color", TokenType::Color),
    ("colors", TokenType::Color),
    ("colour", TokenType::Color),
    ("palette", TokenType::Color),
    ("spacing", TokenType::Spacing),
    ("space", TokenType::Spacing),
    ("gap", TokenType::Spacing),
    ("inset", TokenType::Spacing),
    ("size", TokenType::Spacing),
    ("sizing", TokenType::Spacing),
    ("typography", TokenType::Typography),
    ("font", TokenType::Typography),
    ("fonts", TokenType::Typography),
    ("line-height", TokenType::Typography),
    ("letter-spacing", TokenType::Typography),
    ("shadow", TokenType::Shadow),
    ("shadows", TokenType::Shadow),
    ("elevation", TokenType::Shadow),
    ("border", TokenType::Border),
    ("borders", TokenType::Border),
    ("radius", TokenType::Border),
    ("radii", TokenType::Border),
    ("outline", TokenType::Border),
];

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Spacing => "spacing",
            TokenType::Typography => "typography",
            TokenType::Shadow => "shadow",
            TokenType::Border => "border",
            TokenType::Other => "other",
        }
    }

    /// Map a declared `type` / `$type` from a token file.
    pub fn from_declared(declared: &str) -> Self {
        match declared.to_lowercase().as_str() {
            "color" => TokenType::Color,
            "dimension" | "spacing" | "sizing" | "space" => TokenType::Spacing,
            "typography" | "fontfamily" | "fontfamilies" | "fontweight" | "fontweights"
            | "fontsize" | "fontsizes" | "lineheight" | "lineheights" | "letterspacing" => {
                TokenType::Typography
            }
            "shadow" | "boxshadow" => TokenType::Shadow,
            "border" | "borderradius" | "borderwidth" | "strokestyle" => TokenType::Border,
            _ => TokenType::Other,
        }
    }

    /// Infer a type from the token path, falling back to the value's shape.
    pub fn infer(name: &str, value: &str) -> Self {
        let segments: Vec<String> = name.split('.').map(|s| s.to_lowercase()).collect();
        for segment in &segments {
            if let Some((_, token_type)) = TYPE_KEYWORDS.iter().find(|(k, _)| *k == segment.as_str()) {
                return *token_type;
            }
        }
        if parse_color(value).is_some() {
            return TokenType::Color;
        }
        TokenType::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Global,
    Semantic,
    Component,
}

impl TokenCategory {
    /// Infer the tier from path segments or the source file name.
    pub fn infer(name: &str, source_path: &str, is_alias: bool) -> Self {
        let haystack = format!("{}/{}", source_path.to_lowercase(), name.to_lowercase());
        let parts: Vec<&str> = haystack
            .split(|c: char| c == '.' || c == '/' || c == '-' || c == '_')
            .collect();

        if parts.iter().any(|p| *p == "component" || *p == "components") {
            TokenCategory::Component
        } else if parts
            .iter()
            .any(|p| matches!(*p, "semantic" | "alias" | "aliases" | "theme" | "themes"))
        {
            TokenCategory::Semantic
        } else if parts
            .iter()
            .any(|p| matches!(*p, "global" | "core" | "base" | "primitive" | "primitives"))
        {
            TokenCategory::Global
        } else if is_alias {
            TokenCategory::Semantic
        } else {
            TokenCategory::Global
        }
    }
}

/// A named design value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub category: TokenCategory,
    #[serde(default)]
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
}

impl Token {
    /// Build a token; a `{a.b.c}` value marks it as an alias of `a.b.c`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, token_type: TokenType) -> Self {
        let name = name.into();
        let value = value.into();
        let alias_of = parse_alias(&value);
        let category = TokenCategory::infer(&name, "", alias_of.is_some());
        Self {
            name,
            value,
            token_type,
            category,
            source_path: String::new(),
            alias_of,
        }
    }

    pub fn with_category(mut self, category: TokenCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_source(mut self, source_path: impl Into<String>) -> Self {
        self.source_path = source_path.into();
        self
    }

    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }
}

/// Extract `a.b.c` from a `{a.b.c}` alias value.
pub fn parse_alias(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix('{')?.strip_suffix('}')?.trim();
    let inner = inner.strip_suffix(".value").unwrap_or(inner);
    if inner.is_empty() || inner.contains(|c: char| c.is_whitespace() || c == '{' || c == '}') {
        return None;
    }
    Some(inner.to_string())
}

/// The token catalog, in declaration order, with unique names.
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    tokens: Vec<Token>,
    index: HashMap<String, usize>,
}

impl TokenCatalog {
    /// Build a catalog. Later duplicates of a name are dropped.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut catalog = Self::default();
        for token in tokens {
            if catalog.index.contains_key(&token.name) {
                continue;
            }
            catalog.index.insert(token.name.clone(), catalog.tokens.len());
            catalog.tokens.push(token);
        }
        catalog
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        self.index.get(name).map(|idx| &self.tokens[*idx])
    }

    /// Catalog position, used for deterministic tie-breaking.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Follow the alias chain to a concrete value.
    ///
    /// Returns `None` for dangling references, cycles, or chains longer than
    /// [`MAX_ALIAS_DEPTH`].
    pub fn resolve_value<'a>(&'a self, token: &'a Token) -> Option<&'a str> {
        let mut current = token;
        let mut seen: HashSet<&str> = HashSet::new();

        for _ in 0..=MAX_ALIAS_DEPTH {
            let Some(target) = current.alias_of.as_deref() else {
                return Some(current.value.as_str());
            };
            if !seen.insert(current.name.as_str()) {
                return None;
            }
            current = self.get(target)?;
        }
        None
    }

    pub fn resolve_name(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|t| self.resolve_value(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(tokens: &[(&str, &str)]) -> TokenCatalog {
        TokenCatalog::new(
            tokens
                .iter()
                .map(|(n, v)| Token::new(*n, *v, TokenType::infer(n, v)))
                .collect(),
        )
    }

    #[test]
    fn alias_values_set_alias_of() {
        let token = Token::new("color.action", "{color.blue.500}", TokenType::Color);
        assert_eq!(token.alias_of.as_deref(), Some("color.blue.500"));
        assert_eq!(token.category, TokenCategory::Semantic);
        assert_eq!(parse_alias("{color.blue.500.value}").as_deref(), Some("color.blue.500"));
        assert_eq!(parse_alias("#fff"), None);
        assert_eq!(parse_alias("{a} {b}"), None);
    }

    #[test]
    fn duplicate_names_keep_first() {
        let cat = catalog(&[("color.a", "#fff"), ("color.a", "#000")]);
        assert_eq!(cat.len(), 1);
        assert_eq!(cat.get("color.a").unwrap().value, "#fff");
    }

    #[test]
    fn alias_chain_resolves() {
        let cat = catalog(&[
            ("color.blue.500", "#0000ff"),
            ("color.primary", "{color.blue.500}"),
            ("color.action", "{color.primary}"),
        ]);
        assert_eq!(cat.resolve_name("color.action"), Some("#0000ff"));
    }

    #[test]
    fn cyclic_and_dangling_aliases_resolve_to_none() {
        let cat = catalog(&[
            ("a", "{b}"),
            ("b", "{a}"),
            ("c", "{missing}"),
            ("self", "{self}"),
        ]);
        assert_eq!(cat.resolve_name("a"), None);
        assert_eq!(cat.resolve_name("c"), None);
        assert_eq!(cat.resolve_name("self"), None);
    }

    #[test]
    fn types_infer_from_path_then_value() {
        assert_eq!(TokenType::infer("spacing.sm", "8px"), TokenType::Spacing);
        assert_eq!(TokenType::infer("brand.primary", "#fff"), TokenType::Color);
        assert_eq!(TokenType::infer("font.size.md", "16px"), TokenType::Typography);
        assert_eq!(TokenType::infer("z.modal", "100"), TokenType::Other);
        assert_eq!(TokenType::from_declared("dimension"), TokenType::Spacing);
        assert_eq!(TokenType::from_declared("fontWeight"), TokenType::Typography);
    }

    #[test]
    fn categories_infer_from_path_or_file() {
        assert_eq!(
            TokenCategory::infer("button.bg", "tokens/components.json", false),
            TokenCategory::Component
        );
        assert_eq!(
            TokenCategory::infer("color.blue", "tokens/core.json", false),
            TokenCategory::Global
        );
        assert_eq!(
            TokenCategory::infer("semantic.text", "tokens/all.json", false),
            TokenCategory::Semantic
        );
    }
}
