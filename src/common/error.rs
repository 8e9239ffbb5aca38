//! Error types for the reclient smoke test
//!
//! Messages name the program or file involved so a failed check points
//! straight at the broken piece of the installation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the smoke test
#[derive(Error, Debug)]
pub enum Error {
    // === External Process Errors ===
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' failed with {}", exit_description(.code))]
    ProcessFailed { program: PathBuf, code: Option<i32> },

    // === Remote Output Errors ===
    #[error("Failed to read remote output '{path}': {source}")]
    OutputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create a spawn error for a program that could not be started
    pub fn spawn(program: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Create a process failed error from an exit status code
    pub fn process_failed(program: impl Into<PathBuf>, code: Option<i32>) -> Self {
        Self::ProcessFailed {
            program: program.into(),
            code,
        }
    }
}
