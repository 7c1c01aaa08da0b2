//! Token naming convention detection.
//!
//! Works out how token paths become style variable names in this project:
//!
//! 1. A build-tool config (Style Dictionary JSON or JS) naming a prefix or name transform
//! 2. Sampling generated style output for the dominant prefix and case
//! 3. Falling back to plain kebab-case with no prefix
//!
//! Detection never fails. Every read or parse problem falls through to the
//! next strategy.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::defaults::ConventionConfig;
use crate::local_files::FileSystem;
use crate::tokens::TokenType;
use crate::utils::parser::extract_first;

/// Fewest sampled variables needed before a sampled pattern is trusted.
const MIN_SAMPLED_VARIABLES: usize = 3;

/// Share of sampled names that must start with the same segment for it to count as a prefix.
const PREFIX_SHARE: f64 = 0.8;

static CSS_VARIABLE_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--([a-zA-Z][\w-]*)\s*:").unwrap());

static SCSS_VARIABLE_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\$([a-zA-Z][\w-]*)\s*:").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStyle {
    Kebab,
    Camel,
    Snake,
    Pascal,
    Constant,
}

impl CaseStyle {
    pub fn separator(&self) -> &'static str {
        match self {
            CaseStyle::Kebab => "-",
            CaseStyle::Snake | CaseStyle::Constant => "_",
            CaseStyle::Camel | CaseStyle::Pascal => "",
        }
    }

    pub fn apply(&self, words: &str) -> String {
        match self {
            CaseStyle::Kebab => words.to_kebab_case(),
            CaseStyle::Camel => words.to_lower_camel_case(),
            CaseStyle::Snake => words.to_snake_case(),
            CaseStyle::Pascal => words.to_upper_camel_case(),
            CaseStyle::Constant => words.to_shouty_snake_case(),
        }
    }

    /// Map a Style Dictionary name transform (`name/cti/kebab`, `name/camel`).
    fn from_transform(transform: &str) -> Option<Self> {
        let last = transform.strip_prefix("name/")?.rsplit('/').next()?;
        match last {
            "kebab" => Some(CaseStyle::Kebab),
            "camel" => Some(CaseStyle::Camel),
            "snake" => Some(CaseStyle::Snake),
            "pascal" => Some(CaseStyle::Pascal),
            "constant" => Some(CaseStyle::Constant),
            _ => None,
        }
    }

    /// The naming a built-in Style Dictionary transform group implies.
    fn from_transform_group(group: &str) -> Option<Self> {
        match group {
            "css" | "scss" | "less" | "web" => Some(CaseStyle::Kebab),
            "js" | "ios" => Some(CaseStyle::Pascal),
            "ios-swift" | "ios-swift-separate" | "compose" | "flutter" => Some(CaseStyle::Camel),
            "android" => Some(CaseStyle::Snake),
            _ => None,
        }
    }

    /// Guess the case of a single identifier. `None` when it is a single lowercase word.
    fn of_identifier(name: &str) -> Option<Self> {
        let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
        if name.contains('-') {
            Some(CaseStyle::Kebab)
        } else if name.contains('_') {
            if has_lower {
                Some(CaseStyle::Snake)
            } else {
                Some(CaseStyle::Constant)
            }
        } else if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            Some(CaseStyle::Pascal)
        } else if has_upper {
            Some(CaseStyle::Camel)
        } else {
            None
        }
    }
}

/// How a token path maps to a style variable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformPattern {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub case_style: CaseStyle,
    pub separator: String,
}

impl Default for TransformPattern {
    fn default() -> Self {
        Self::new(None, CaseStyle::Kebab)
    }
}

impl TransformPattern {
    pub fn new(prefix: Option<String>, case_style: CaseStyle) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()),
            case_style,
            separator: case_style.separator().to_string(),
        }
    }

    /// Variable name (without the leading `--` or `$`) for a token path.
    pub fn to_variable_name(&self, token_name: &str) -> String {
        let words = match &self.prefix {
            Some(prefix) => format!("{}.{}", prefix, token_name),
            None => token_name.to_string(),
        };
        self.case_style.apply(&words)
    }

    /// Drop this pattern's prefix from a variable name, if present.
    pub fn strip_prefix<'a>(&self, variable: &'a str) -> &'a str {
        let Some(prefix) = &self.prefix else {
            return variable;
        };
        let cased_prefix = self.case_style.apply(prefix);
        variable
            .strip_prefix(cased_prefix.as_str())
            .map(|rest| rest.strip_prefix(self.separator.as_str()).unwrap_or(rest))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(variable)
    }
}

/// Where the detected pattern came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConventionSource {
    Config { path: String },
    Sampled { files: usize, variables: usize },
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedConvention {
    pub pattern: TransformPattern,
    pub source: ConventionSource,
}

impl DetectedConvention {
    pub fn is_default(&self) -> bool {
        self.source == ConventionSource::Default
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Detect the project's transform pattern. Never fails.
pub fn detect(fs: &dyn FileSystem, config: &ConventionConfig) -> DetectedConvention {
    if let Some(found) = detect_from_config(fs, &config.config_files) {
        log_status!(
            "convention",
            "Using {:?} naming from {}",
            found.pattern.case_style,
            match &found.source {
                ConventionSource::Config { path } => path.as_str(),
                _ => "config",
            }
        );
        return found;
    }

    if let Some(found) = detect_from_samples(fs, config) {
        log_status!(
            "convention",
            "Inferred {:?} naming from generated styles",
            found.pattern.case_style
        );
        return found;
    }

    log_status!("convention", "No convention found, assuming kebab-case");
    DetectedConvention {
        pattern: TransformPattern::default(),
        source: ConventionSource::Default,
    }
}

fn detect_from_config(fs: &dyn FileSystem, candidates: &[String]) -> Option<DetectedConvention> {
    candidates.iter().find_map(|path| {
        if !fs.exists(path) {
            return None;
        }
        let content = match fs.read(path) {
            Ok(content) => content,
            Err(err) => {
                log_status!("convention", "Skipping {}: {}", path, err);
                return None;
            }
        };

        let pattern = if path.ends_with(".json") {
            pattern_from_json_config(&content)
        } else {
            pattern_from_script_config(&content)
        }?;

        Some(DetectedConvention {
            pattern,
            source: ConventionSource::Config { path: path.clone() },
        })
    })
}

/// Read a Style Dictionary JSON config. Style-output platforms win over others.
pub fn pattern_from_json_config(content: &str) -> Option<TransformPattern> {
    let config: Value = serde_json::from_str(content).ok()?;
    let platforms = config.get("platforms")?.as_object()?;

    let mut ordered: Vec<(&String, &Value)> = platforms.iter().collect();
    ordered.sort_by_key(|(name, _)| !matches!(name.as_str(), "css" | "scss" | "less" | "web"));

    let (_, platform) = ordered.into_iter().next()?;

    let prefix = platform
        .get("prefix")
        .and_then(Value::as_str)
        .map(str::to_string);

    let from_transforms = platform
        .get("transforms")
        .and_then(Value::as_array)
        .and_then(|transforms| {
            transforms
                .iter()
                .filter_map(Value::as_str)
                .find_map(CaseStyle::from_transform)
        });

    let from_group = platform
        .get("transformGroup")
        .and_then(Value::as_str)
        .and_then(CaseStyle::from_transform_group);

    let case_style = from_transforms.or(from_group).unwrap_or(CaseStyle::Kebab);
    Some(TransformPattern::new(prefix, case_style))
}

/// Pull the same settings out of a JS config with regexes. No evaluation.
pub fn pattern_from_script_config(content: &str) -> Option<TransformPattern> {
    let prefix = extract_first(content, r#"prefix\s*:\s*['"`]([\w-]+)['"`]"#);
    let from_transform = extract_first(content, r#"['"`](name/(?:cti/)?\w+)['"`]"#)
        .and_then(|t| CaseStyle::from_transform(&t));
    let from_group = extract_first(content, r#"transformGroup\s*:\s*['"`]([\w-]+)['"`]"#)
        .and_then(|g| CaseStyle::from_transform_group(&g));

    if prefix.is_none() && from_transform.is_none() && from_group.is_none() {
        return None;
    }

    let case_style = from_transform.or(from_group).unwrap_or(CaseStyle::Kebab);
    Some(TransformPattern::new(prefix, case_style))
}

fn detect_from_samples(fs: &dyn FileSystem, config: &ConventionConfig) -> Option<DetectedConvention> {
    let exclude = vec!["**/node_modules/**".to_string()];
    let files = match fs.scan_files(&config.sample_patterns, &exclude) {
        Ok(files) => files,
        Err(err) => {
            log_status!("convention", "Sampling failed: {}", err);
            return None;
        }
    };

    let mut names = Vec::new();
    let mut sampled = 0;
    for file in files.iter().take(config.sample_limit) {
        let Ok(content) = fs.read(&file.path) else {
            continue;
        };
        sampled += 1;
        names.extend(sample_variable_names(&content));
    }

    let pattern = infer_pattern(&names)?;
    Some(DetectedConvention {
        pattern,
        source: ConventionSource::Sampled {
            files: sampled,
            variables: names.len(),
        },
    })
}

/// Custom property and SCSS variable names defined in a style file.
pub fn sample_variable_names(content: &str) -> Vec<String> {
    CSS_VARIABLE_DEFINITION
        .captures_iter(content)
        .chain(SCSS_VARIABLE_DEFINITION.captures_iter(content))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// The most common case style and shared prefix across sampled names.
pub fn infer_pattern(names: &[String]) -> Option<TransformPattern> {
    if names.len() < MIN_SAMPLED_VARIABLES {
        return None;
    }

    let mut case_counts: BTreeMap<CaseStyle, usize> = BTreeMap::new();
    for name in names {
        if let Some(style) = CaseStyle::of_identifier(name) {
            *case_counts.entry(style).or_default() += 1;
        }
    }
    // BTreeMap iteration order makes ties deterministic.
    let case_style = case_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(style, _)| *style)
        .unwrap_or(CaseStyle::Kebab);

    Some(TransformPattern::new(shared_prefix(names, case_style), case_style))
}

fn shared_prefix(names: &[String], case_style: CaseStyle) -> Option<String> {
    let mut first_segments: BTreeMap<String, usize> = BTreeMap::new();
    for name in names {
        let first = match case_style {
            CaseStyle::Kebab => name.split('-').next().map(str::to_lowercase),
            CaseStyle::Snake | CaseStyle::Constant => name.split('_').next().map(str::to_lowercase),
            CaseStyle::Camel | CaseStyle::Pascal => {
                name.to_kebab_case().split('-').next().map(str::to_string)
            }
        };
        if let Some(first) = first.filter(|f| !f.is_empty()) {
            *first_segments.entry(first).or_default() += 1;
        }
    }

    let (segment, count) = first_segments
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))?;
    let is_category_word = TokenType::infer(&segment, "") != TokenType::Other;
    if is_category_word || (count as f64) < names.len() as f64 * PREFIX_SHARE {
        return None;
    }
    Some(segment)
}

// ============================================================================
// Tests
// ============================================================================
