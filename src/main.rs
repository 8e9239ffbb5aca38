//! check-reclient - verify that reproxy can execute a remote command
//!
//! Exit codes: 0 when the remote output matched, 1 when it did not,
//! 2 for any other failure.

use std::process::ExitCode;

use clap::Parser;
use reclient_check::commands::CheckArgs;
use reclient_check::{cli, common::logging};

/// Exit code for failures other than an output mismatch
const FAILURE_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "check-reclient", about = "Check that reproxy can execute a remote command")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: CheckArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_cli(cli.args.verbose);

    match cli::run(cli.args).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}
