use clap::Args;
use serde::Serialize;

use tokencov::defaults;
use tokencov::local_files::LocalFs;
use tokencov::token_audit::{TokenRedundancy, TransformPattern, ValueMatcher};
use tokencov::tokens::{self, SkippedTokenFile, Token};

use super::CmdResult;

#[derive(Args)]
pub struct TokensArgs {
    /// Project directory holding the token files
    pub path: String,

    /// Token file glob (repeatable). Overrides the configured catalog patterns
    #[arg(long = "tokens", value_name = "GLOB")]
    pub tokens: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolvedToken {
    #[serde(flatten)]
    pub token: Token,
    /// Effective value after following aliases; absent for broken chains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "command", rename = "tokens")]
pub struct TokensOutput {
    pub source_path: String,
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedTokenFile>,
    pub count: usize,
    pub tokens: Vec<ResolvedToken>,
    pub redundancies: Vec<TokenRedundancy>,
}

pub fn run(args: TokensArgs, _global: &super::GlobalArgs) -> CmdResult<TokensOutput> {
    let path = super::project_dir(&args.path)?;
    let fs = LocalFs::new(&path);
    let config = defaults::load_config(&fs);

    let patterns = if args.tokens.is_empty() {
        config.defaults.scan.tokens.clone()
    } else {
        super::token_patterns(&args.tokens)
    };
    let loaded = tokens::load_catalog(&fs, &patterns)?;

    let matcher = ValueMatcher::new(
        &loaded.catalog,
        TransformPattern::default(),
        &config.defaults.matching,
    );
    let redundancies = matcher.find_redundant_tokens();

    let resolved = loaded
        .catalog
        .tokens()
        .iter()
        .map(|token| ResolvedToken {
            resolved_value: loaded.catalog.resolve_value(token).map(str::to_string),
            token: token.clone(),
        })
        .collect();

    Ok((
        TokensOutput {
            source_path: path.display().to_string(),
            files: loaded.files.clone(),
            skipped: loaded.skipped.clone(),
            count: loaded.catalog.len(),
            tokens: resolved,
            redundancies,
        },
        0,
    ))
}
