//! CLI command handling
//!
//! Turns parsed arguments into resolved paths and configuration, then
//! runs the smoke test against the real reclient binaries.

use crate::check::{Outcome, SmokeTest, SystemLauncher};
use crate::commands::CheckArgs;
use crate::common::config::Config;
use crate::common::paths::ReclientPaths;
use crate::common::Result;

/// Load configuration and resolve the reclient directories
///
/// Flags win over the config file, which wins over the built-in templates.
pub fn prepare(args: &CheckArgs) -> Result<(ReclientPaths, Config)> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let reclient_cfgs_dir = args
        .reclient_cfgs_dir
        .as_deref()
        .or(config.paths.reclient_cfgs_dir.as_deref());
    let reclient_dir = args
        .reclient_dir
        .as_deref()
        .or(config.paths.reclient_dir.as_deref());

    let paths = ReclientPaths::resolve(&args.src_dir, reclient_cfgs_dir, reclient_dir)?;
    tracing::debug!(?paths, "Resolved reclient paths");

    Ok((paths, config))
}

/// Run the reproxy check with the given arguments
pub async fn run(args: CheckArgs) -> Result<Outcome> {
    let (paths, config) = prepare(&args)?;
    SmokeTest::new(&paths, &config.platform, SystemLauncher)
        .run()
        .await
}
