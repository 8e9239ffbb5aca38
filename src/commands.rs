//! CLI argument definitions
//!
//! Flag names keep reclient's underscore spelling (`--src_dir`) so the
//! check can be invoked with the same arguments as the config generator.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CheckArgs {
    /// Chromium src directory
    #[arg(long = "src_dir", value_name = "DIR")]
    pub src_dir: PathBuf,

    /// Path to Chromium reclient_cfgs directory
    /// [default: {src_dir}/buildtools/reclient_cfgs]
    #[arg(long = "reclient_cfgs_dir", value_name = "DIR")]
    pub reclient_cfgs_dir: Option<String>,

    /// Path to Chromium reclient directory
    /// [default: {src_dir}/buildtools/reclient]
    #[arg(long = "reclient_dir", value_name = "DIR")]
    pub reclient_dir: Option<String>,

    /// Configuration file (default: platform config dir, e.g. ~/.config/reclient-check/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log the exact commands being run
    #[arg(long, short)]
    pub verbose: bool,
}
