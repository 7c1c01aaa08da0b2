//! Symbolic token reference extraction.
//!
//! Pattern based, no syntax tree. Text that doesn't look like a reference
//! is ignored; nothing here can fail.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::utils::parser::{line_at, line_snippet};

static CLASS_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:className|class)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{\s*["'`]([^"'`]*)["'`]\s*\})"#)
        .unwrap()
});

static CLASS_HELPER_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:clsx|cx|classnames|classNames|cn)\(([^)]*)\)").unwrap());

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'`]([^"'`]+)["'`]"#).unwrap());

static API_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(theme|tokens|vars|designTokens)((?:\.[A-Za-z_$][\w$]*|\[\s*["'][^"']+["']\s*\]|\[\d+\])+)"#,
    )
    .unwrap()
});

static BRACKET_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[\s*["']?([^"'\]]+)["']?\s*\]"#).unwrap());

static TOKEN_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:token|getToken|useToken|theme)\(\s*["'`]([\w.-]+)["'`]\s*\)"#).unwrap()
});

static PROP_USAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\s(color|bg|background|backgroundColor|borderColor|fill|stroke|p|px|py|m|mx|my|padding|margin|gap|spacing|size|fontSize|fontWeight|fontFamily|lineHeight|shadow|boxShadow|elevation|radius|rounded|borderRadius)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{\s*["'`]([^"'`]*)["'`]\s*\})"#,
    )
    .unwrap()
});

static CSS_VAR_USAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\(\s*--([\w-]+)").unwrap());

static CSS_VAR_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|[;{\s])--([\w-]+)\s*:\s*([^;}]+)").unwrap());

static VAR_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^var\(\s*--([\w-]+)\s*(?:,.*)?\)$").unwrap());

static ALIAS_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\s*([\w-]+(?:\.[\w-]+)*)\s*\}$").unwrap());

static PREPROCESSOR_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[$@]([a-zA-Z][\w-]*)$").unwrap());

static FUNCTION_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:theme|token|getToken|useToken)\(\s*["'`]?([\w.-]+)["'`]?\s*\)$"#).unwrap()
});

static DOTTED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:theme|tokens|vars|designTokens)(?:\.[A-Za-z_$][\w$]*)+$").unwrap()
});

/// One extracted reference with its location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub value: String,
    pub line: usize,
    pub context: String,
}

/// A style prop on a component (`<Box bg="brand.500">`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropUsage {
    pub prop: String,
    pub value: String,
    pub line: usize,
    pub context: String,
}

/// A custom property definition (`--name: value`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CssDefinition {
    pub name: String,
    pub value: String,
    pub line: usize,
    pub context: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptReferences {
    pub class_names: Vec<Reference>,
    pub api_references: Vec<Reference>,
    pub prop_usages: Vec<PropUsage>,
}

impl ScriptReferences {
    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty() && self.api_references.is_empty() && self.prop_usages.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleReferences {
    pub usages: Vec<Reference>,
    pub definitions: Vec<CssDefinition>,
}

/// The syntactic shape of a single-value reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceForm {
    /// `var(--name)`
    CustomProperty,
    /// `$name` or `@name`
    Preprocessor,
    /// `{a.b}`
    Alias,
    /// `theme('a.b')`, `token('a.b')`
    Function,
    /// `theme.a.b`
    Dotted,
}

/// A value that refers to a token instead of spelling out a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReference {
    pub form: ReferenceForm,
    pub name: String,
}

impl TokenReference {
    fn new(form: ReferenceForm, name: &str) -> Self {
        Self {
            form,
            name: name.to_string(),
        }
    }

    /// Variable forms resolve through naming conventions, the rest as token paths.
    pub fn is_variable(&self) -> bool {
        matches!(self.form, ReferenceForm::CustomProperty | ReferenceForm::Preprocessor)
    }
}

fn reference_at(content: &str, offset: usize, value: String) -> Reference {
    let line = line_at(content, offset);
    Reference {
        value,
        line,
        context: line_snippet(content, line),
    }
}

/// First non-empty capture among groups `1..`.
fn first_capture<'t>(caps: &regex::Captures<'t>) -> Option<regex::Match<'t>> {
    caps.iter().skip(1).flatten().next()
}

// ============================================================================
// Script and markup
// ============================================================================

/// Class names, API paths and style props in script or template text.
pub fn parse_js_for_tokens(content: &str) -> ScriptReferences {
    let mut refs = ScriptReferences::default();

    for caps in CLASS_ATTRIBUTE.captures_iter(content) {
        if let Some(m) = first_capture(&caps) {
            push_classes(content, m.start(), m.as_str(), &mut refs.class_names);
        }
    }
    for caps in CLASS_HELPER_CALL.captures_iter(content) {
        let Some(args) = caps.get(1) else { continue };
        for literal in STRING_LITERAL.captures_iter(args.as_str()) {
            if let Some(m) = literal.get(1) {
                push_classes(content, args.start() + m.start(), m.as_str(), &mut refs.class_names);
            }
        }
    }

    for caps in API_PATH.captures_iter(content) {
        let (Some(whole), Some(root), Some(path)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let dotted = BRACKET_SEGMENT.replace_all(path.as_str(), ".$1");
        let value = format!("{}{}", root.as_str(), dotted);
        refs.api_references.push(reference_at(content, whole.start(), value));
    }
    for caps in TOKEN_CALL.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            refs.api_references
                .push(reference_at(content, m.start(), m.as_str().to_string()));
        }
    }

    for caps in PROP_USAGE.captures_iter(content) {
        let (Some(prop), Some(value)) = (caps.get(1), caps.iter().skip(2).flatten().next()) else {
            continue;
        };
        let line = line_at(content, prop.start());
        refs.prop_usages.push(PropUsage {
            prop: prop.as_str().to_string(),
            value: value.as_str().to_string(),
            line,
            context: line_snippet(content, line),
        });
    }

    refs
}

fn push_classes(content: &str, offset: usize, classes: &str, out: &mut Vec<Reference>) {
    let line = line_at(content, offset);
    let context = line_snippet(content, line);
    for class in classes.split_whitespace() {
        if class.contains("${") || class.contains('}') {
            continue;
        }
        out.push(Reference {
            value: class.to_string(),
            line,
            context: context.clone(),
        });
    }
}

/// Every sub-path of length two or more in a dotted reference, longest first.
///
/// `theme.colors.brand.primary` yields the full path, then
/// `theme.colors.brand`, `colors.brand.primary`, and so on.
pub fn extract_all_token_references(reference: &str) -> Vec<String> {
    let segments: Vec<&str> = reference.split('.').filter(|s| !s.is_empty()).collect();
    let mut paths = Vec::new();
    for len in (2..=segments.len()).rev() {
        for start in 0..=segments.len() - len {
            paths.push(segments[start..start + len].join("."));
        }
    }
    paths
}

// ============================================================================
// Styles
// ============================================================================

/// `var(--x)` usages and `--x: value` definitions in style text.
pub fn parse_css_for_tokens(content: &str) -> StyleReferences {
    let mut refs = StyleReferences::default();

    for caps in CSS_VAR_USAGE.captures_iter(content) {
        if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
            refs.usages
                .push(reference_at(content, whole.start(), name.as_str().to_string()));
        }
    }

    for caps in CSS_VAR_DEFINITION.captures_iter(content) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let line = line_at(content, name.start());
        refs.definitions.push(CssDefinition {
            name: name.as_str().to_string(),
            value: value.as_str().trim().to_string(),
            line,
            context: line_snippet(content, line),
        });
    }

    refs
}

// ============================================================================
// Single values
// ============================================================================

/// Whether a value is a reference wrapper rather than a raw literal.
pub fn is_token_reference(value: &str) -> bool {
    extract_token_reference(value).is_some()
}

pub fn extract_token_reference(value: &str) -> Option<TokenReference> {
    let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`');

    if let Some(caps) = VAR_REFERENCE.captures(value) {
        return Some(TokenReference::new(ReferenceForm::CustomProperty, &caps[1]));
    }
    if let Some(caps) = ALIAS_REFERENCE.captures(value) {
        return Some(TokenReference::new(ReferenceForm::Alias, &caps[1]));
    }
    if let Some(caps) = PREPROCESSOR_VARIABLE.captures(value) {
        return Some(TokenReference::new(ReferenceForm::Preprocessor, &caps[1]));
    }
    if let Some(caps) = FUNCTION_REFERENCE.captures(value) {
        return Some(TokenReference::new(ReferenceForm::Function, &caps[1]));
    }
    if DOTTED_REFERENCE.is_match(value) {
        return Some(TokenReference::new(ReferenceForm::Dotted, value));
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_come_from_attributes_and_helpers() {
        let jsx = r#"
export function Card() {
  return <div className="bg-primary p-md">
    <span class='text-sm'>x</span>
    <b className={clsx("font-bold", active && 'ring-primary')} />
  </div>;
}
"#;
        let refs = parse_js_for_tokens(jsx);
        let classes: Vec<(&str, usize)> = refs
            .class_names
            .iter()
            .map(|r| (r.value.as_str(), r.line))
            .collect();
        assert_eq!(
            classes,
            vec![
                ("bg-primary", 3),
                ("p-md", 3),
                ("text-sm", 4),
                ("font-bold", 5),
                ("ring-primary", 5),
            ]
        );
        assert!(refs.class_names[0].context.starts_with("return <div"));
    }

    #[test]
    fn template_classes_skip_interpolation() {
        let refs = parse_js_for_tokens("<a className={`btn ${size}`} />");
        let classes: Vec<&str> = refs.class_names.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(classes, vec!["btn"]);
    }

    #[test]
    fn api_paths_normalize_brackets() {
        let js = "const c = theme.colors.primary;\nconst s = tokens['spacing'][\"md\"];\nconst x = token('radius.sm');";
        let refs = parse_js_for_tokens(js);
        let paths: Vec<(&str, usize)> = refs
            .api_references
            .iter()
            .map(|r| (r.value.as_str(), r.line))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("theme.colors.primary", 1),
                ("tokens.spacing.md", 2),
                ("radius.sm", 3)
            ]
        );
    }

    #[test]
    fn style_props_are_extracted() {
        let jsx = r#"<Box bg="brand.500" p={"md"} onClick="go" color='text.muted' />"#;
        let refs = parse_js_for_tokens(jsx);
        let props: Vec<(&str, &str)> = refs
            .prop_usages
            .iter()
            .map(|p| (p.prop.as_str(), p.value.as_str()))
            .collect();
        assert_eq!(props, vec![("bg", "brand.500"), ("p", "md"), ("color", "text.muted")]);
    }

    #[test]
    fn plain_code_has_no_references() {
        assert!(parse_js_for_tokens("const a = 1 + 2;\nfunction f() {}").is_empty());
    }

    #[test]
    fn sub_paths_longest_first() {
        assert_eq!(
            extract_all_token_references("theme.colors.primary"),
            vec!["theme.colors.primary", "theme.colors", "colors.primary"]
        );
        assert!(extract_all_token_references("theme").is_empty());
    }

    #[test]
    fn css_usages_and_definitions() {
        let css = ":root {\n  --brand: #00f;\n  --button-bg: var(--brand);\n}\n.a { color: var( --brand , red); }";
        let refs = parse_css_for_tokens(css);

        let usages: Vec<(&str, usize)> = refs.usages.iter().map(|r| (r.value.as_str(), r.line)).collect();
        assert_eq!(usages, vec![("brand", 3), ("brand", 5)]);

        let defs: Vec<(&str, &str, usize)> = refs
            .definitions
            .iter()
            .map(|d| (d.name.as_str(), d.value.as_str(), d.line))
            .collect();
        assert_eq!(defs, vec![("brand", "#00f", 2), ("button-bg", "var(--brand)", 3)]);
    }

    #[test]
    fn reference_wrappers_are_recognized() {
        let parsed = |v: &str| extract_token_reference(v).map(|r| (r.form, r.name));

        assert_eq!(
            parsed("var(--color-primary)"),
            Some((ReferenceForm::CustomProperty, "color-primary".to_string()))
        );
        assert_eq!(
            parsed("var(--gap, 8px)"),
            Some((ReferenceForm::CustomProperty, "gap".to_string()))
        );
        assert_eq!(
            parsed("{color.primary}"),
            Some((ReferenceForm::Alias, "color.primary".to_string()))
        );
        assert_eq!(
            parsed("$spacing-md"),
            Some((ReferenceForm::Preprocessor, "spacing-md".to_string()))
        );
        assert_eq!(
            parsed("theme('colors.primary')"),
            Some((ReferenceForm::Function, "colors.primary".to_string()))
        );
        assert_eq!(
            parsed("theme.colors.primary"),
            Some((ReferenceForm::Dotted, "theme.colors.primary".to_string()))
        );
        assert!(extract_token_reference("$x").unwrap().is_variable());
        assert!(!extract_token_reference("{a.b}").unwrap().is_variable());
        assert!(!is_token_reference("#0000ff"));
        assert!(!is_token_reference("calc(var(--a) * 2)"));
        assert!(!is_token_reference("1px solid var(--border)"));
    }
}
