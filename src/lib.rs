//! Reclient smoke test
//!
//! Verifies that a reproxy installation is configured correctly by
//! starting it, executing one command remotely through rewrapper and
//! checking the downloaded output.

pub mod check;
pub mod cli;
pub mod commands;
pub mod common;

pub use check::Outcome;
pub use common::{Error, Result};
