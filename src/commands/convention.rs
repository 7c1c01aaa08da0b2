use clap::Args;
use serde::Serialize;

use tokencov::defaults;
use tokencov::local_files::LocalFs;
use tokencov::token_audit::convention::{self, DetectedConvention};

use super::CmdResult;

#[derive(Args)]
pub struct ConventionArgs {
    /// Project directory to inspect
    pub path: String,

    /// Token name to render with the detected pattern (repeatable)
    #[arg(long = "example", value_name = "TOKEN")]
    pub examples: Vec<String>,
}

#[derive(Serialize)]
pub struct RenderedName {
    pub token: String,
    pub variable: String,
}

#[derive(Serialize)]
#[serde(tag = "command", rename = "convention")]
pub struct ConventionOutput {
    pub source_path: String,
    #[serde(flatten)]
    pub detected: DetectedConvention,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<RenderedName>,
}

pub fn run(args: ConventionArgs, _global: &super::GlobalArgs) -> CmdResult<ConventionOutput> {
    let path = super::project_dir(&args.path)?;
    let fs = LocalFs::new(&path);
    let config = defaults::load_config(&fs);
    let detected = convention::detect(&fs, &config.defaults.convention);

    let examples = args
        .examples
        .into_iter()
        .map(|token| RenderedName {
            variable: format!("--{}", detected.pattern.to_variable_name(&token)),
            token,
        })
        .collect();

    Ok((
        ConventionOutput {
            source_path: path.display().to_string(),
            detected,
            examples,
        },
        0,
    ))
}
