//! Token file loading (Style Dictionary `value` / W3C `$value` JSON).

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{Token, TokenCatalog, TokenCategory, TokenType};
use crate::error::{Error, Result};
use crate::local_files::FileSystem;
use crate::utils::io::read_file;

/// Directories a token glob never reaches into.
const TOKEN_EXCLUDES: &[&str] = &["**/node_modules/**", "**/package.json", "**/tsconfig*.json"];

/// A catalog plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: TokenCatalog,
    pub files: Vec<String>,
    pub skipped: Vec<SkippedTokenFile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTokenFile {
    pub path: String,
    pub reason: String,
}

/// Load every token file matching `patterns`.
///
/// Relative patterns are resolved through `fs`; absolute ones are expanded
/// directly with `glob`. A file that fails to parse is skipped, but a run
/// that ends with no tokens at all is an error: nothing can be audited
/// without a catalog.
pub fn load_catalog(fs: &dyn FileSystem, patterns: &[String]) -> Result<LoadedCatalog> {
    let (absolute, relative): (Vec<&String>, Vec<&String>) =
        patterns.iter().partition(|p| Path::new(p.as_str()).is_absolute());

    let mut sources: Vec<(String, Result<String>)> = Vec::new();

    if !relative.is_empty() {
        let include: Vec<String> = relative.into_iter().cloned().collect();
        let exclude: Vec<String> = TOKEN_EXCLUDES.iter().map(|s| s.to_string()).collect();
        for file in fs.scan_files(&include, &exclude)? {
            let content = fs.read(&file.path);
            sources.push((file.path, content));
        }
    }

    for pattern in absolute {
        let entries = glob::glob(pattern).map_err(|e| {
            Error::validation_invalid_argument(
                "tokens",
                format!("Invalid glob pattern '{}': {}", pattern, e),
                Some(pattern.clone()),
                None,
            )
        })?;
        for path in entries.filter_map(|entry| entry.ok()).filter(|p| p.is_file()) {
            let display = path.to_string_lossy().to_string();
            let content = read_file(&path, "read token file");
            sources.push((display, content));
        }
    }

    if sources.is_empty() {
        return Err(Error::catalog_not_found(
            fs.root().display().to_string(),
            patterns.to_vec(),
        ));
    }

    let mut tokens = Vec::new();
    let mut files = Vec::new();
    let mut skipped = Vec::new();
    let mut first_failure: Option<Error> = None;

    for (path, content) in sources {
        let parsed = content.and_then(|text| {
            serde_json::from_str::<Value>(&text)
                .map_err(|e| Error::catalog_invalid(path.clone(), e.to_string()))
        });
        match parsed {
            Ok(document) => {
                tokens.extend(parse_token_document(&document, &path));
                files.push(path);
            }
            Err(err) => {
                log_status!("tokens", "Skipping {}: {}", path, err);
                skipped.push(SkippedTokenFile {
                    path: path.clone(),
                    reason: err.to_string(),
                });
                first_failure.get_or_insert(err);
            }
        }
    }

    let catalog = TokenCatalog::new(tokens);
    if catalog.is_empty() {
        return Err(match (files.is_empty(), first_failure) {
            (true, Some(err)) => err,
            _ => Error::catalog_empty(fs.root().display().to_string()),
        });
    }

    log_status!(
        "tokens",
        "Loaded {} tokens from {} file(s)",
        catalog.len(),
        files.len()
    );

    Ok(LoadedCatalog {
        catalog,
        files,
        skipped,
    })
}

/// Flatten a nested token document into tokens named by dot path.
pub fn parse_token_document(document: &Value, source_path: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    if let Value::Object(map) = document {
        walk_group(map, &mut Vec::new(), None, source_path, &mut tokens);
    }
    tokens
}

fn walk_group(
    map: &Map<String, Value>,
    path: &mut Vec<String>,
    inherited_type: Option<&str>,
    source_path: &str,
    tokens: &mut Vec<Token>,
) {
    let group_type = map
        .get("$type")
        .and_then(Value::as_str)
        .or(inherited_type);

    for (key, child) in map {
        if key.starts_with('$') {
            continue;
        }
        let Value::Object(child_map) = child else {
            continue;
        };

        path.push(key.clone());
        if let Some(raw) = child_map.get("$value").or_else(|| child_map.get("value")) {
            let declared = child_map
                .get("$type")
                .or_else(|| child_map.get("type"))
                .and_then(Value::as_str)
                .or(group_type);
            tokens.push(build_token(&path.join("."), raw, declared, source_path));
        } else {
            walk_group(child_map, path, group_type, source_path, tokens);
        }
        path.pop();
    }
}

fn build_token(name: &str, raw: &Value, declared: Option<&str>, source_path: &str) -> Token {
    let value = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };

    let token_type = declared
        .map(TokenType::from_declared)
        .filter(|t| *t != TokenType::Other)
        .unwrap_or_else(|| TokenType::infer(name, &value));

    let token = Token::new(name, value, token_type);
    let category = TokenCategory::infer(name, source_path, token.is_alias());
    token.with_category(category).with_source(source_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_files::{LocalFs, MemoryFs};
    use crate::ErrorCode;
    use serde_json::json;

    fn patterns() -> Vec<String> {
        vec!["tokens/**/*.json".to_string()]
    }

    #[test]
    fn style_dictionary_document_flattens() {
        let doc = json!({
            "color": {
                "blue": { "500": { "value": "#0000ff", "type": "color" } },
                "primary": { "value": "{color.blue.500}" }
            },
            "spacing": { "sm": { "value": "8px" } }
        });

        let tokens = parse_token_document(&doc, "tokens/core.json");
        let names: Vec<&str> = tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["color.blue.500", "color.primary", "spacing.sm"]);
        assert_eq!(tokens[1].alias_of.as_deref(), Some("color.blue.500"));
        assert_eq!(tokens[1].token_type, TokenType::Color);
        assert_eq!(tokens[2].token_type, TokenType::Spacing);
        assert_eq!(tokens[0].category, TokenCategory::Global);
        assert_eq!(tokens[0].source_path, "tokens/core.json");
    }

    #[test]
    fn tokens_keep_declaration_order() {
        let text = r##"{
  "spacing": { "lg": { "value": "24px" }, "sm": { "value": "8px" } },
  "color": { "primary": { "value": "#0000FF" }, "link": { "value": "{color.primary}" } }
}"##;
        let doc: Value = serde_json::from_str(text).unwrap();
        let names: Vec<String> = parse_token_document(&doc, "tokens/core.json")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["spacing.lg", "spacing.sm", "color.primary", "color.link"]);
    }

    #[test]
    fn w3c_group_type_is_inherited() {
        let doc = json!({
            "space": {
                "$type": "dimension",
                "$description": "spacing scale",
                "gutter": { "$value": "24px" }
            },
            "weight": { "bold": { "$value": 700, "$type": "fontWeight" } }
        });

        let tokens = parse_token_document(&doc, "design.tokens.json");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].name, "space.gutter");
        assert_eq!(tokens[0].token_type, TokenType::Spacing);
        assert_eq!(tokens[1].value, "700");
        assert_eq!(tokens[1].token_type, TokenType::Typography);
    }

    #[test]
    fn loads_from_file_system() {
        let fs = MemoryFs::new()
            .with_file("tokens/color.json", r##"{"color":{"primary":{"value":"#0000FF"}}}"##)
            .with_file("tokens/broken.json", "{oops")
            .with_file("src/app.css", "a{}");

        let loaded = load_catalog(&fs, &patterns()).unwrap();
        assert_eq!(loaded.catalog.len(), 1);
        assert_eq!(loaded.files, vec!["tokens/color.json"]);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].path, "tokens/broken.json");
    }

    #[test]
    fn missing_catalog_is_fatal() {
        let err = load_catalog(&MemoryFs::new(), &patterns()).unwrap_err();
        assert_eq!(err.code, ErrorCode::CatalogNotFound);
    }

    #[test]
    fn unparsable_catalog_is_fatal() {
        let fs = MemoryFs::new().with_file("tokens/broken.json", "{oops");
        let err = load_catalog(&fs, &patterns()).unwrap_err();
        assert_eq!(err.code, ErrorCode::CatalogInvalid);
    }

    #[test]
    fn empty_catalog_is_fatal() {
        let fs = MemoryFs::new().with_file("tokens/empty.json", r#"{"meta":{"x":1}}"#);
        let err = load_catalog(&fs, &patterns()).unwrap_err();
        assert_eq!(err.code, ErrorCode::CatalogEmpty);
    }

    #[test]
    fn absolute_patterns_expand_with_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("brand.json"),
            r#"{"spacing":{"md":{"value":"16px"}}}"#,
        )
        .unwrap();

        let pattern = format!("{}/*.json", dir.path().display());
        let loaded = load_catalog(&LocalFs::new(dir.path()), &[pattern]).unwrap();
        assert_eq!(loaded.catalog.get("spacing.md").unwrap().value, "16px");
    }
}
