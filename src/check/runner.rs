//! Smoke test runner
//!
//! Starts reproxy, executes one trivial command remotely through rewrapper
//! in a scratch directory, compares the retrieved output and always shuts
//! reproxy down again once it has been started.

use std::path::Path;

use colored::Colorize;

use crate::common::config::PlatformConfig;
use crate::common::paths::ReclientPaths;
use crate::common::{Error, Result};

use super::launcher::{Invocation, Launcher};

/// Shell command executed on the remote worker
pub const REMOTE_COMMAND: &str = "echo hello > hello";

/// File produced by [`REMOTE_COMMAND`] and downloaded by rewrapper
pub const OUTPUT_FILE: &str = "hello";

/// Exact content the output file must have
pub const EXPECTED_OUTPUT: &[u8] = b"hello\n";

/// Result of a smoke test that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The remote output matched exactly
    Passed,
    /// The remote output differed; `actual` is what came back
    Mismatch { actual: String },
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Passed => 0,
            Outcome::Mismatch { .. } => 1,
        }
    }
}

/// Compare retrieved output against [`EXPECTED_OUTPUT`] byte for byte
pub fn verify_output(actual: &[u8]) -> Outcome {
    if actual == EXPECTED_OUTPUT {
        Outcome::Passed
    } else {
        Outcome::Mismatch {
            actual: String::from_utf8_lossy(actual).into_owned(),
        }
    }
}

/// One run of the reproxy smoke test
pub struct SmokeTest<'a, L> {
    paths: &'a ReclientPaths,
    platform: &'a PlatformConfig,
    launcher: L,
}

impl<'a, L: Launcher> SmokeTest<'a, L> {
    pub fn new(paths: &'a ReclientPaths, platform: &'a PlatformConfig, launcher: L) -> Self {
        Self {
            paths,
            platform,
            launcher,
        }
    }

    /// Run the whole check
    ///
    /// A failed start returns immediately. Every later failure still
    /// shuts reproxy down before the error is returned.
    pub async fn run(&self) -> Result<Outcome> {
        println!("Starting reproxy");
        self.launcher.run(&self.start_invocation()).await?;

        let result = self.execute_remotely().await;

        println!("Shutting down reproxy");
        let shutdown = self.launcher.run(&self.shutdown_invocation()).await;

        match (result, shutdown) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
            (Err(e), Err(shutdown_err)) => {
                tracing::warn!(error = %shutdown_err, "reproxy shutdown failed as well");
                Err(e)
            }
        }
    }

    /// Run the remote command inside a scratch directory that never outlives this call
    async fn execute_remotely(&self) -> Result<Outcome> {
        let scratch = tempfile::Builder::new()
            .prefix("reclient-check-")
            .tempdir()?;
        tracing::debug!(dir = %scratch.path().display(), "Created scratch directory");

        let outcome = self.execute_in(scratch.path()).await?;
        scratch.close()?;
        Ok(outcome)
    }

    async fn execute_in(&self, dir: &Path) -> Result<Outcome> {
        println!("Remotely executing \"{}\"", REMOTE_COMMAND);
        self.launcher.run(&self.rewrapper_invocation(dir)).await?;

        let output_path = dir.join(OUTPUT_FILE);
        let actual = tokio::fs::read(&output_path)
            .await
            .map_err(|source| Error::OutputRead {
                path: output_path.clone(),
                source,
            })?;

        let outcome = verify_output(&actual);
        match &outcome {
            Outcome::Passed => println!("{}", "Received expected result".green()),
            Outcome::Mismatch { actual } => {
                println!("{} \"{}\"", "Received unexpected result:".red(), actual)
            }
        }
        Ok(outcome)
    }

    fn start_invocation(&self) -> Invocation {
        Invocation::new(self.paths.bootstrap())
            .arg("--cfg")
            .arg(self.paths.reproxy_cfg())
    }

    fn shutdown_invocation(&self) -> Invocation {
        self.start_invocation().arg("--shutdown")
    }

    fn rewrapper_invocation(&self, dir: &Path) -> Invocation {
        Invocation::new(self.paths.rewrapper())
            .arg("--labels=type=tool")
            .arg(format!("--platform={}", self.platform.descriptor()))
            .arg(format!("--output_files={}", OUTPUT_FILE))
            .args(["/bin/bash", "-c", REMOTE_COMMAND])
            .current_dir(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Which call a recorded invocation was
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Start,
        Remote,
        Shutdown,
    }

    /// Fake launcher that records calls and plays the remote side
    #[derive(Default)]
    struct FakeLauncher {
        calls: Mutex<Vec<(Call, Invocation)>>,
        fail_start: bool,
        fail_remote: bool,
        fail_shutdown: bool,
        /// Written to the output file by the remote call; nothing when `None`
        remote_output: Option<&'static [u8]>,
    }

    impl FakeLauncher {
        fn producing(output: &'static [u8]) -> Self {
            Self {
                remote_output: Some(output),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
        }

        fn invocation(&self, call: Call) -> Invocation {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|(c, _)| *c == call)
                .map(|(_, i)| i.clone())
                .expect("call was not recorded")
        }

        fn scratch_dir(&self) -> PathBuf {
            self.invocation(Call::Remote).cwd.expect("remote call has a cwd")
        }
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        async fn run(&self, invocation: &Invocation) -> Result<()> {
            let call = if invocation.program == paths().rewrapper() {
                Call::Remote
            } else if invocation.has_arg("--shutdown") {
                Call::Shutdown
            } else {
                Call::Start
            };
            self.calls.lock().unwrap().push((call, invocation.clone()));

            let fail = match call {
                Call::Start => self.fail_start,
                Call::Shutdown => self.fail_shutdown,
                Call::Remote => {
                    if let (Some(output), Some(cwd)) = (self.remote_output, &invocation.cwd) {
                        std::fs::write(cwd.join(OUTPUT_FILE), output)?;
                    }
                    self.fail_remote
                }
            };

            if fail {
                Err(Error::process_failed(&invocation.program, Some(1)))
            } else {
                Ok(())
            }
        }
    }

    fn paths() -> ReclientPaths {
        ReclientPaths::resolve_from(Path::new("/"), Path::new("/chromium/src"), None, None)
            .unwrap()
    }

    async fn run_with(launcher: &FakeLauncher) -> Result<Outcome> {
        let paths = paths();
        let platform = PlatformConfig::default();
        SmokeTest::new(&paths, &platform, launcher).run().await
    }

    #[test]
    fn test_verify_output_exact_match() {
        assert_eq!(verify_output(b"hello\n"), Outcome::Passed);
        assert_eq!(Outcome::Passed.exit_code(), 0);
    }

    #[test]
    fn test_verify_output_any_difference_is_a_mismatch() {
        for actual in [
            &b"hello"[..],
            &b"Hello\n"[..],
            &b"hello\n\n"[..],
            &b"hello \n"[..],
            &b""[..],
        ] {
            let outcome = verify_output(actual);
            assert_eq!(
                outcome,
                Outcome::Mismatch {
                    actual: String::from_utf8_lossy(actual).into_owned()
                }
            );
            assert_eq!(outcome.exit_code(), 1);
        }
    }

    #[tokio::test]
    async fn test_successful_run() {
        let launcher = FakeLauncher::producing(b"hello\n");

        let outcome = run_with(&launcher).await.unwrap();

        assert_eq!(outcome, Outcome::Passed);
        assert_eq!(launcher.calls(), vec![Call::Start, Call::Remote, Call::Shutdown]);
        assert!(!launcher.scratch_dir().exists());
    }

    #[tokio::test]
    async fn test_invocations_match_reclient_contract() {
        let launcher = FakeLauncher::producing(b"hello\n");
        run_with(&launcher).await.unwrap();
        let paths = paths();
        let cfg = paths.reproxy_cfg().into_os_string();

        let start = launcher.invocation(Call::Start);
        assert_eq!(start.program, paths.bootstrap());
        assert_eq!(start.args, vec!["--cfg".into(), cfg.clone()]);
        assert_eq!(start.cwd, None);

        let shutdown = launcher.invocation(Call::Shutdown);
        assert_eq!(shutdown.program, paths.bootstrap());
        assert_eq!(
            shutdown.args,
            vec!["--cfg".into(), cfg, "--shutdown".into()]
        );

        let remote = launcher.invocation(Call::Remote);
        assert_eq!(remote.program, paths.rewrapper());
        let args: Vec<String> = remote
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--labels=type=tool".to_string(),
                format!(
                    "--platform=container-image={},OSFamily=linux",
                    crate::common::config::DEFAULT_CONTAINER_IMAGE
                ),
                "--output_files=hello".to_string(),
                "/bin/bash".to_string(),
                "-c".to_string(),
                "echo hello > hello".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_mismatch_still_shuts_down() {
        let launcher = FakeLauncher::producing(b"goodbye\n");

        let outcome = run_with(&launcher).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Mismatch {
                actual: "goodbye\n".to_string()
            }
        );
        assert_eq!(launcher.calls(), vec![Call::Start, Call::Remote, Call::Shutdown]);
        assert!(!launcher.scratch_dir().exists());
    }

    #[tokio::test]
    async fn test_failed_start_skips_everything_else() {
        let launcher = FakeLauncher {
            fail_start: true,
            ..FakeLauncher::producing(b"hello\n")
        };

        let err = run_with(&launcher).await.unwrap_err();

        assert!(matches!(err, Error::ProcessFailed { .. }));
        assert_eq!(launcher.calls(), vec![Call::Start]);
    }

    #[tokio::test]
    async fn test_failed_remote_call_shuts_down_once() {
        let launcher = FakeLauncher {
            fail_remote: true,
            ..FakeLauncher::default()
        };

        let err = run_with(&launcher).await.unwrap_err();

        assert!(matches!(err, Error::ProcessFailed { ref program, .. } if *program == paths().rewrapper()));
        assert_eq!(launcher.calls(), vec![Call::Start, Call::Remote, Call::Shutdown]);
        assert!(!launcher.scratch_dir().exists());
    }

    #[tokio::test]
    async fn test_missing_output_file_shuts_down() {
        let launcher = FakeLauncher::default();

        let err = run_with(&launcher).await.unwrap_err();

        assert!(matches!(err, Error::OutputRead { .. }));
        assert_eq!(launcher.calls(), vec![Call::Start, Call::Remote, Call::Shutdown]);
        assert!(!launcher.scratch_dir().exists());
    }

    #[tokio::test]
    async fn test_shutdown_failure_overrides_mismatch() {
        let launcher = FakeLauncher {
            fail_shutdown: true,
            ..FakeLauncher::producing(b"nope\n")
        };

        let err = run_with(&launcher).await.unwrap_err();

        assert!(matches!(err, Error::ProcessFailed { .. }));
        assert_eq!(launcher.calls(), vec![Call::Start, Call::Remote, Call::Shutdown]);
    }

    #[tokio::test]
    async fn test_body_error_wins_over_shutdown_error() {
        let launcher = FakeLauncher {
            fail_shutdown: true,
            ..FakeLauncher::default()
        };

        let err = run_with(&launcher).await.unwrap_err();

        assert!(matches!(err, Error::OutputRead { .. }));
    }
}
