//! External process invocation
//!
//! The runner talks to `bootstrap` and `rewrapper` only through the
//! [`Launcher`] trait, so tests can substitute a recording fake.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::{Error, Result};

/// A single blocking call to an external program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Working directory; inherits ours when `None`
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Whether any argument equals `flag`
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }
}

impl fmt::Display for Invocation {
    /// Shell-like rendering for logs; arguments with spaces are quoted
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Runs external programs to completion
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run the invocation and wait for it; non-zero exit is an error
    async fn run(&self, invocation: &Invocation) -> Result<()>;
}

#[async_trait]
impl<T: Launcher + ?Sized> Launcher for &T {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation).await
    }
}

/// Launcher backed by real child processes with inherited stdio
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

#[async_trait]
impl Launcher for SystemLauncher {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::debug!(command = %invocation, cwd = ?invocation.cwd, "Running");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let status = cmd
            .status()
            .await
            .map_err(|e| Error::spawn(&invocation.program, e))?;

        if status.success() {
            Ok(())
        } else {
            tracing::debug!(program = %invocation.program.display(), ?status, "Process failed");
            Err(Error::process_failed(&invocation.program, status.code()))
        }
    }
}
