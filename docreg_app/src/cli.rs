use std::path::PathBuf;

use anyhow::bail;

pub const DEFAULT_CONFIG_PATH: &str = "config/submitter.toml";

const USAGE: &str = "usage: docreg_submit [config.toml] <document.json>...";

/// Positional arguments of the submitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Config file named on the command line, if any
    pub config_path: Option<PathBuf>,
    pub documents: Vec<PathBuf>,
}

/// Parses the submitter arguments from the process command line
pub fn from_env() -> anyhow::Result<CliArgs> {
    parse(std::env::args().skip(1))
}

/// Parses `[config.toml] <document.json>...`
///
/// A leading `.toml` argument selects the config file. Without one the
/// submitter falls back to [`DEFAULT_CONFIG_PATH`], or to built-in defaults
/// when that file is missing.
pub fn parse<I>(args: I) -> anyhow::Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();

    let config_path = args.next_if(|arg| arg.ends_with(".toml")).map(PathBuf::from);

    let documents: Vec<PathBuf> = args.map(PathBuf::from).collect();
    if documents.is_empty() {
        bail!("no documents given\n{USAGE}");
    }

    Ok(CliArgs { config_path, documents })
}
