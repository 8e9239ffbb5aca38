//! Reproxy smoke test
//!
//! Proves that a configured reproxy accepts and correctly executes one
//! trivial remote command.

pub mod launcher;
mod runner;

pub use launcher::{Invocation, Launcher, SystemLauncher};
pub use runner::{verify_output, Outcome, SmokeTest, EXPECTED_OUTPUT, OUTPUT_FILE, REMOTE_COMMAND};
