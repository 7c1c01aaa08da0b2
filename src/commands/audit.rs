use clap::Args;
use serde::Serialize;

use tokencov::defaults;
use tokencov::io;
use tokencov::local_files::LocalFs;
use tokencov::scoring::{self, AuditScore, CategoryResult};
use tokencov::token_audit::{self, AuditOptions, ComponentTokenUsage, TokenCoverageReport};
use tokencov::{log_status, Error};

use super::CmdResult;

#[derive(Args)]
pub struct AuditArgs {
    /// Project directory to audit
    pub path: String,

    /// Token file glob (repeatable). Overrides the configured catalog patterns
    #[arg(long = "tokens", value_name = "GLOB")]
    pub tokens: Vec<String>,

    /// Config file to use instead of the project's tokencov.json
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Only show per-component coverage
    #[arg(long)]
    pub components: bool,

    /// Skip component analysis
    #[arg(long, conflicts_with = "components")]
    pub no_components: bool,

    /// Also write the full report JSON to this file
    #[arg(long, value_name = "FILE")]
    pub output: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum AuditOutput {
    #[serde(rename = "audit")]
    Full {
        report: Box<TokenCoverageReport>,
        category: CategoryResult,
        score: AuditScore,
    },

    #[serde(rename = "audit.components")]
    Components {
        source_path: String,
        components: Vec<ComponentTokenUsage>,
        needs_attention: usize,
    },
}

/// Exit code 1 when any component needs attention.
pub fn run(args: AuditArgs, _global: &super::GlobalArgs) -> CmdResult<AuditOutput> {
    let path = super::project_dir(&args.path)?;
    let config = args
        .config
        .as_deref()
        .map(super::expand_path)
        .transpose()?;

    let weights = match &config {
        Some(file) => defaults::load_config_file(file)?.defaults.weights,
        None => defaults::load_config(&LocalFs::new(&path)).defaults.weights,
    };

    let options = AuditOptions {
        tokens: super::token_patterns(&args.tokens),
        config,
        skip_components: args.no_components,
    };
    let report = token_audit::audit_path(&path.to_string_lossy(), &options)?;
    let exit_code = if report.needs_attention() { 1 } else { 0 };

    if let Some(output) = &args.output {
        let file = super::expand_path(output)?;
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize report".to_string()))
        })?;
        io::write_file_atomic(&file, &json, &format!("write {}", file.display()))?;
        log_status!("audit", "Report written to {}", file.display());
    }

    if args.components {
        return Ok((
            AuditOutput::Components {
                needs_attention: report.summary.components_needing_attention,
                source_path: report.source_path,
                components: report.component_usage,
            },
            exit_code,
        ));
    }

    let category = token_audit::token_category(&report);
    let score = scoring::score_categories(std::slice::from_ref(&category), &weights);

    Ok((
        AuditOutput::Full {
            report: Box::new(report),
            category,
            score,
        },
        exit_code,
    ))
}
