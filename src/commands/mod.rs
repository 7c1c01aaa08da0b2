use std::path::{Path, PathBuf};

pub type CmdResult<T> = tokencov::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod audit;
pub mod convention;
pub mod tokens;

/// Expand `~` and environment variables in a user-supplied path.
pub(crate) fn expand_path(raw: &str) -> tokencov::Result<PathBuf> {
    let expanded = shellexpand::full(raw).map_err(|e| {
        tokencov::Error::validation_invalid_argument(
            "path",
            format!("Cannot expand '{}': {}", raw, e),
            Some(raw.to_string()),
            None,
        )
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Expand a project path and require it to be a directory.
pub(crate) fn project_dir(raw: &str) -> tokencov::Result<PathBuf> {
    let path = expand_path(raw)?;
    if !Path::new(&path).is_dir() {
        return Err(tokencov::Error::validation_invalid_argument(
            "path",
            format!("Not a directory: {}", path.display()),
            Some(raw.to_string()),
            None,
        )
        .with_hint("Pass the root of the project to audit"));
    }
    Ok(path)
}

/// Token globs from the CLI: `~` is expanded, relative globs stay project-relative.
pub(crate) fn token_patterns(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|pattern| shellexpand::tilde(pattern).to_string())
        .collect()
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (tokencov::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Audit(args) => dispatch!(args, global, audit),
        crate::Commands::Convention(args) => dispatch!(args, global, convention),
        crate::Commands::Tokens(args) => dispatch!(args, global, tokens),
    }
}
