use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::local_files::FileSystem;

/// Per-project config file, looked up at the audited project's root.
pub const CONFIG_FILE: &str = "tokencov.json";

/// Root configuration structure for tokencov.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TokenCovConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via tokencov.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Defaults {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub attention: AttentionPolicy,

    #[serde(default)]
    pub convention: ConventionConfig,

    #[serde(default)]
    pub weights: CategoryWeights,
}

/// Which project files are audited and where the token catalog lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default = "default_token_patterns")]
    pub tokens: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            tokens: default_token_patterns(),
        }
    }
}

/// Value matcher tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchingConfig {
    /// Minimum similarity for a near-miss to be reported against a token.
    #[serde(default = "default_approximate_threshold")]
    pub approximate_threshold: f64,

    /// Pixel size of `1rem` / `1em` when comparing lengths.
    #[serde(default = "default_rem_base_px")]
    pub rem_base_px: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            approximate_threshold: default_approximate_threshold(),
            rem_base_px: default_rem_base_px(),
        }
    }
}

/// Thresholds behind a component's "needs attention" verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttentionPolicy {
    /// Coverage percentage below which a component is flagged.
    #[serde(default = "default_coverage_threshold")]
    pub coverage_threshold: f64,

    /// Hardcoded count above which a component has "multiple" hardcoded values.
    #[serde(default = "default_multiple_hardcoded")]
    pub multiple_hardcoded: usize,

    /// Hardcoded count above which the count is "high".
    #[serde(default = "default_high_hardcoded")]
    pub high_hardcoded: usize,
}

impl Default for AttentionPolicy {
    fn default() -> Self {
        Self {
            coverage_threshold: default_coverage_threshold(),
            multiple_hardcoded: default_multiple_hardcoded(),
            high_hardcoded: default_high_hardcoded(),
        }
    }
}

/// Where the convention detector looks for transform configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConventionConfig {
    #[serde(default = "default_convention_files")]
    pub config_files: Vec<String>,

    /// Generated style files sampled when no config file is found.
    #[serde(default = "default_sample_patterns")]
    pub sample_patterns: Vec<String>,

    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
}

impl Default for ConventionConfig {
    fn default() -> Self {
        Self {
            config_files: default_convention_files(),
            sample_patterns: default_sample_patterns(),
            sample_limit: default_sample_limit(),
        }
    }
}

/// Fixed weights of each audit category in the overall score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryWeights {
    #[serde(default = "default_tokens_weight")]
    pub tokens: f64,
    #[serde(default = "default_components_weight")]
    pub components: f64,
    #[serde(default = "default_accessibility_weight")]
    pub accessibility: f64,
    #[serde(default = "default_consistency_weight")]
    pub consistency: f64,
    #[serde(default = "default_documentation_weight")]
    pub documentation: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            tokens: default_tokens_weight(),
            components: default_components_weight(),
            accessibility: default_accessibility_weight(),
            consistency: default_consistency_weight(),
            documentation: default_documentation_weight(),
        }
    }
}

impl CategoryWeights {
    pub fn weight_for(&self, category_id: &str) -> Option<f64> {
        match category_id {
            "tokens" => Some(self.tokens),
            "components" => Some(self.components),
            "accessibility" => Some(self.accessibility),
            "consistency" => Some(self.consistency),
            "documentation" => Some(self.documentation),
            _ => None,
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_include() -> Vec<String> {
    strings(&[
        "**/*.{js,jsx,ts,tsx,mjs,cjs}",
        "**/*.{css,scss,sass,less,pcss}",
        "**/*.{html,vue,svelte,astro,hbs}",
    ])
}

fn default_exclude() -> Vec<String> {
    strings(&[
        "**/node_modules/**",
        "**/dist/**",
        "**/build/**",
        "**/coverage/**",
        "**/.git/**",
        "**/*.min.*",
        "**/*.test.*",
        "**/*.spec.*",
        "**/*.stories.*",
        "**/__tests__/**",
        "**/*.d.ts",
    ])
}

fn default_token_patterns() -> Vec<String> {
    strings(&["tokens/**/*.json", "**/*.tokens.json", "design-tokens/**/*.json"])
}

fn default_approximate_threshold() -> f64 {
    0.9
}

fn default_rem_base_px() -> f64 {
    16.0
}

fn default_coverage_threshold() -> f64 {
    80.0
}

fn default_multiple_hardcoded() -> usize {
    5
}

fn default_high_hardcoded() -> usize {
    10
}

fn default_convention_files() -> Vec<String> {
    strings(&[
        "style-dictionary.config.json",
        "sd.config.json",
        "tokens.config.json",
        "style-dictionary.config.js",
        "style-dictionary.config.mjs",
        "style-dictionary.config.cjs",
        "sd.config.js",
        "sd.config.mjs",
        "config.json",
    ])
}

fn default_sample_patterns() -> Vec<String> {
    strings(&[
        "build/**/*.css",
        "dist/**/*.css",
        "**/tokens.css",
        "**/variables.css",
        "**/_variables.scss",
        "**/*.css",
    ])
}

fn default_sample_limit() -> usize {
    20
}

fn default_tokens_weight() -> f64 {
    0.25
}

fn default_components_weight() -> f64 {
    0.25
}

fn default_accessibility_weight() -> f64 {
    0.2
}

fn default_consistency_weight() -> f64 {
    0.15
}

fn default_documentation_weight() -> f64 {
    0.15
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load the project's tokencov.json, falling back to defaults on any error.
pub fn load_config(fs: &dyn FileSystem) -> TokenCovConfig {
    match load_config_from(fs, CONFIG_FILE) {
        Ok(Some(config)) => config,
        Ok(None) => TokenCovConfig::default(),
        Err(err) => {
            log_status!("config", "Ignoring {}: {}", CONFIG_FILE, err);
            TokenCovConfig::default()
        }
    }
}

/// Attempt to load config from a project-relative path. `Ok(None)` when absent.
pub fn load_config_from(fs: &dyn FileSystem, path: &str) -> crate::Result<Option<TokenCovConfig>> {
    if !fs.exists(path) {
        return Ok(None);
    }

    let content = fs.read(path)?;
    parse_config(&content, path).map(Some)
}

/// Load config from an explicit file on disk (CLI `--config`).
pub fn load_config_file(path: &Path) -> crate::Result<TokenCovConfig> {
    let content = crate::utils::io::read_file(path, &format!("read {}", path.display()))?;
    parse_config(&content, &path.display().to_string())
}

fn parse_config(content: &str, path: &str) -> crate::Result<TokenCovConfig> {
    let config: TokenCovConfig = serde_json::from_str(content)
        .map_err(|e| crate::Error::config_invalid_json(path, e))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &TokenCovConfig) -> crate::Result<()> {
    let matching = &config.defaults.matching;
    if !(0.0..=1.0).contains(&matching.approximate_threshold) {
        return Err(crate::Error::config_invalid_value(
            "defaults.matching.approximate_threshold",
            Some(matching.approximate_threshold.to_string()),
            "must be between 0 and 1",
        ));
    }
    if matching.rem_base_px <= 0.0 {
        return Err(crate::Error::config_invalid_value(
            "defaults.matching.rem_base_px",
            Some(matching.rem_base_px.to_string()),
            "must be positive",
        ));
    }
    let attention = &config.defaults.attention;
    if attention.high_hardcoded < attention.multiple_hardcoded {
        return Err(crate::Error::config_invalid_value(
            "defaults.attention.high_hardcoded",
            Some(attention.high_hardcoded.to_string()),
            "must be at least multiple_hardcoded",
        ));
    }
    Ok(())
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_files::MemoryFs;

    #[test]
    fn missing_config_uses_builtins() {
        let config = load_config(&MemoryFs::new());
        assert_eq!(config.defaults, builtin_defaults());
        assert_eq!(config.defaults.attention.coverage_threshold, 80.0);
        assert_eq!(config.defaults.matching.approximate_threshold, 0.9);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let fs = MemoryFs::new().with_file(
            CONFIG_FILE,
            r#"{"defaults":{"attention":{"coverage_threshold":60}}}"#,
        );
        let config = load_config(&fs);
        assert_eq!(config.defaults.attention.coverage_threshold, 60.0);
        assert_eq!(config.defaults.attention.high_hardcoded, 10);
        assert_eq!(config.defaults.scan, ScanConfig::default());
    }

    #[test]
    fn invalid_json_falls_back() {
        let fs = MemoryFs::new().with_file(CONFIG_FILE, "{not json");
        assert!(load_config_from(&fs, CONFIG_FILE).is_err());
        assert_eq!(load_config(&fs), TokenCovConfig::default());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let fs = MemoryFs::new().with_file(
            CONFIG_FILE,
            r#"{"defaults":{"matching":{"approximate_threshold":1.5}}}"#,
        );
        let err = load_config_from(&fs, CONFIG_FILE).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn weights_lookup_by_category() {
        let weights = CategoryWeights::default();
        assert_eq!(weights.weight_for("tokens"), Some(0.25));
        assert_eq!(weights.weight_for("performance"), None);
    }
}
