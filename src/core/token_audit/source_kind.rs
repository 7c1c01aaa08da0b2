//! Per-extension parse strategies.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::references::{
    parse_css_for_tokens, parse_js_for_tokens, ReferenceForm, ScriptReferences, StyleReferences,
};
use super::values::{property_kind, PropertyKind};
use crate::utils::parser::snippet;

const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "pcss"];

/// Unitless numbers in these script properties are pixels.
const PX_SCRIPT_PROPERTIES: &[&str] = &["fontSize", "letterSpacing"];

/// `property: value` in style text, inline `style="..."` attributes, and CSS-in-JS templates.
static CSS_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[;{\s"'])(-{0,2}[a-zA-Z][a-zA-Z-]*)\s*:\s*([^;{}"'<>]+)"#).unwrap()
});

/// `key: 'value'` or `key: 12` entries in a script style object.
static SCRIPT_OBJECT_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b([a-zA-Z][\w]*)\s*:\s*(?:"([^"]*)"|'([^']*)'|`([^`$]*)`|(-?\d+(?:\.\d+)?)\b)"#)
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Script,
    Style,
    Markup,
}

/// Everything symbolic a file refers to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceReferences {
    pub script: ScriptReferences,
    pub style: StyleReferences,
}

/// A `(property, value)` pair found on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub property: String,
    pub value: String,
    pub line: usize,
    pub context: String,
}

impl SourceKind {
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_lowercase();
        if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            SourceKind::Script
        } else if STYLE_EXTENSIONS.contains(&ext.as_str()) {
            SourceKind::Style
        } else {
            SourceKind::Markup
        }
    }

    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        match name.rfind('.') {
            Some(idx) if idx > 0 => Self::from_extension(&name[idx + 1..]),
            _ => SourceKind::Markup,
        }
    }

    /// Structural references: script text goes through the JS parser, style
    /// text through the CSS parser. Markup has none and relies on the line scan.
    pub fn extract_references(&self, text: &str) -> SourceReferences {
        match self {
            SourceKind::Script => SourceReferences {
                script: parse_js_for_tokens(text),
                style: StyleReferences::default(),
            },
            SourceKind::Style => SourceReferences {
                script: ScriptReferences::default(),
                style: parse_css_for_tokens(text),
            },
            SourceKind::Markup => SourceReferences::default(),
        }
    }

    /// Whether the structural pass for this kind already counted references
    /// of this form, so the line scan must not count them again.
    pub fn counts_structurally(&self, form: ReferenceForm) -> bool {
        match self {
            SourceKind::Script => matches!(form, ReferenceForm::Function | ReferenceForm::Dotted),
            SourceKind::Style => form == ReferenceForm::CustomProperty,
            SourceKind::Markup => false,
        }
    }

    /// Literal `(property, value)` pairs, line by line.
    pub fn extract_literals(&self, text: &str) -> Vec<Literal> {
        let mut literals = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
                continue;
            }

            let before = literals.len();
            if *self == SourceKind::Script {
                script_object_entries(line, idx + 1, &mut literals);
            }
            if literals.len() == before {
                css_declarations(line, idx + 1, &mut literals);
            }
        }
        literals
    }
}

fn css_declarations(line: &str, line_no: usize, out: &mut Vec<Literal>) {
    for caps in CSS_DECLARATION.captures_iter(line) {
        let property = &caps[1];
        if property.starts_with("--") {
            continue;
        }
        let value = caps[2].trim().trim_end_matches(',').trim();
        if value.is_empty() {
            continue;
        }
        out.push(Literal {
            property: property.to_string(),
            value: value.to_string(),
            line: line_no,
            context: snippet(line),
        });
    }
}

fn script_object_entries(line: &str, line_no: usize, out: &mut Vec<Literal>) {
    for caps in SCRIPT_OBJECT_ENTRY.captures_iter(line) {
        let property = &caps[1];
        let value = if let Some(number) = caps.get(5) {
            script_number(property, number.as_str())
        } else {
            match caps.iter().skip(2).flatten().next() {
                Some(m) => m.as_str().trim().to_string(),
                None => continue,
            }
        };
        if value.is_empty() {
            continue;
        }
        out.push(Literal {
            property: property.to_string(),
            value,
            line: line_no,
            context: snippet(line),
        });
    }
}

/// Script style objects treat bare numbers as pixels for length properties.
fn script_number(property: &str, number: &str) -> String {
    let is_length = matches!(
        property_kind(property),
        PropertyKind::Spacing | PropertyKind::Sizing | PropertyKind::Radius
    ) || PX_SCRIPT_PROPERTIES.contains(&property);

    if is_length && number != "0" {
        format!("{}px", number)
    } else {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(literals: &[Literal]) -> Vec<(&str, &str, usize)> {
        literals
            .iter()
            .map(|l| (l.property.as_str(), l.value.as_str(), l.line))
            .collect()
    }

    #[test]
    fn kinds_follow_extension() {
        assert_eq!(SourceKind::from_path("src/App.tsx"), SourceKind::Script);
        assert_eq!(SourceKind::from_path("src/app.module.SCSS"), SourceKind::Style);
        assert_eq!(SourceKind::from_path("src/App.vue"), SourceKind::Markup);
        assert_eq!(SourceKind::from_path("Makefile"), SourceKind::Markup);
        assert!(SourceKind::Style.counts_structurally(ReferenceForm::CustomProperty));
        assert!(!SourceKind::Style.counts_structurally(ReferenceForm::Preprocessor));
        assert!(SourceKind::Script.counts_structurally(ReferenceForm::Dotted));
        assert!(!SourceKind::Markup.counts_structurally(ReferenceForm::CustomProperty));
    }

    #[test]
    fn style_literals_skip_definitions_and_comments() {
        let css = ".btn {\n  color: #0000FF;\n  padding: 8px 12px;\n  --local: #fff;\n}\n/* color: red; */";
        let literals = SourceKind::Style.extract_literals(css);
        assert_eq!(
            pairs(&literals),
            vec![("color", "#0000FF", 2), ("padding", "8px 12px", 3)]
        );
    }

    #[test]
    fn script_objects_add_px_to_lengths() {
        let js = "const s = { padding: 16, fontWeight: 700, color: '#333', lineHeight: 1.5 };";
        let literals = SourceKind::Script.extract_literals(js);
        assert_eq!(
            pairs(&literals),
            vec![
                ("padding", "16px", 1),
                ("fontWeight", "700", 1),
                ("color", "#333", 1),
                ("lineHeight", "1.5", 1)
            ]
        );
    }

    #[test]
    fn script_templates_fall_back_to_declarations() {
        let js = "const Button = styled.button`\n  background: #0000FE;\n`;";
        let literals = SourceKind::Script.extract_literals(js);
        assert_eq!(pairs(&literals), vec![("background", "#0000FE", 2)]);
    }

    #[test]
    fn markup_reads_inline_styles() {
        let html = r#"<div style="color: #112233; margin: 4px">hi</div>"#;
        let literals = SourceKind::Markup.extract_literals(html);
        assert_eq!(pairs(&literals), vec![("color", "#112233", 1), ("margin", "4px", 1)]);
        assert_eq!(SourceKind::Markup.extract_references(html), SourceReferences::default());
    }
}
