use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "garagechat")]
#[command(
    about = "Terminal service assistant for Maverick's IntelliTune Garage",
    long_about = "Terminal service assistant for Maverick's IntelliTune Garage\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/garagechat/config.toml\n    2. ~/.config/garagechat/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log redacted HTTP requests and responses to stderr.
    #[arg(long)]
    pub verbose: bool,
}
