//! The worker invocation boundary.
//!
//! The external worker is modeled as a capability with one operation: run
//! with a prompt, return captured text, obey a timeout. Exactly two kinds
//! exist — the default interactive worker (supervised by a human or outer
//! harness, no timeout) and the headless/batch worker (wall-clock timeout
//! enforced by killing the process). The only contract the controller
//! relies on is the presence or absence of the completion marker in the
//! captured output stream.

use async_trait::async_trait;
use clap::ValueEnum;
use std::io::Write as _;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{Result, WorkloopError};

/// Literal token in worker output signaling all work is done.
pub const COMPLETION_MARKER: &str = "<promise>COMPLETE</promise>";

/// Environment variable overriding the worker command line
/// (whitespace-split program + args; the prompt is still piped on stdin).
pub const WORKER_CMD_ENV: &str = "WORKLOOP_WORKER_CMD";

/// Default wall-clock timeout for the headless worker, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Worker kind
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WorkerKind {
    /// Default interactive worker; supervised, no enforced timeout
    Interactive,
    /// Headless/batch worker; enforced wall-clock timeout
    Headless,
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerKind::Interactive => write!(f, "interactive"),
            WorkerKind::Headless => write!(f, "headless"),
        }
    }
}

/// External configuration for the worker invocation.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub kind: WorkerKind,
    pub timeout: Duration,
    pub command_override: Option<String>,
}

impl WorkerConfig {
    pub fn new(kind: WorkerKind, timeout_secs: u64) -> Self {
        Self {
            kind,
            timeout: Duration::from_secs(timeout_secs),
            command_override: None,
        }
    }

    pub fn with_override(mut self, command: Option<String>) -> Self {
        self.command_override = command;
        self
    }

    /// Resolve the program and arguments for this worker.
    pub fn command(&self) -> (String, Vec<String>) {
        if let Some(raw) = &self.command_override {
            let mut parts = raw.split_whitespace().map(String::from);
            let program = parts.next().unwrap_or_default();
            return (program, parts.collect());
        }

        match self.kind {
            WorkerKind::Interactive => (
                "claude".to_string(),
                vec![
                    "--dangerously-skip-permissions".to_string(),
                    "--print".to_string(),
                ],
            ),
            WorkerKind::Headless => (
                "claude".to_string(),
                vec![
                    "-p".to_string(),
                    "--dangerously-skip-permissions".to_string(),
                    "--output-format".to_string(),
                    "text".to_string(),
                ],
            ),
        }
    }
}

/// What one worker invocation produced.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// Everything captured from the worker's output stream, possibly
    /// partial when the invocation timed out.
    pub output: String,
    pub timed_out: bool,
    pub exit_code: Option<i32>,
}

impl WorkerOutcome {
    /// True when the completion marker appears anywhere in the output.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.output.contains(COMPLETION_MARKER)
    }
}

/// Abstraction for the worker subprocess.
///
/// Enables testing loop logic without spawning real processes.
#[async_trait]
pub trait WorkerProcess: Send + Sync {
    /// Run one iteration's worth of work with the given prompt.
    ///
    /// Blocks until the worker exits or, for the headless kind, until the
    /// configured timeout forcibly terminates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the process fails to spawn or its output
    /// stream cannot be read. A timeout is not an error.
    async fn invoke(&self, prompt: &str) -> Result<WorkerOutcome>;
}

/// The real, process-backed worker.
#[derive(Debug)]
pub struct CommandWorker {
    config: WorkerConfig,
}

impl CommandWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Check that the worker binary is reachable.
    ///
    /// Called once at loop entry so a misconfigured worker is fatal before
    /// any iteration runs.
    pub fn validate(&self) -> Result<()> {
        let (program, _) = self.config.command();
        if program.is_empty() {
            return Err(WorkloopError::InvalidConfig {
                field: "worker command".to_string(),
                reason: "override resolves to an empty command".to_string(),
            });
        }
        which::which(&program).map_err(|_| WorkloopError::MissingTool { tool: program })?;
        Ok(())
    }

    async fn spawn(&self) -> Result<Child> {
        let (program, args) = self.config.command();
        debug!("Spawning worker: {} {}", program, args.join(" "));

        Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkloopError::Worker {
                message: format!("failed to start '{}': {}", program, e),
            })
    }

    /// Stream the worker's stdout to the console while capturing it.
    async fn capture(child: &mut Child, output: &mut String) -> Result<i32> {
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| WorkloopError::worker("worker stdout was not captured"))?;

        let mut buffer = [0u8; 1024];
        loop {
            let n = stdout
                .read(&mut buffer)
                .await
                .map_err(WorkloopError::Io)?;
            if n == 0 {
                break;
            }
            let chunk = String::from_utf8_lossy(&buffer[..n]);
            print!("{}", chunk);
            std::io::stdout().flush().ok();
            output.push_str(&chunk);
        }

        let status = child.wait().await.map_err(WorkloopError::Io)?;
        Ok(status.code().unwrap_or(1))
    }
}

#[async_trait]
impl WorkerProcess for CommandWorker {
    async fn invoke(&self, prompt: &str) -> Result<WorkerOutcome> {
        let mut child = self.spawn().await?;

        // Write prompt to stdin and close it to signal EOF
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(WorkloopError::Io)?;
            stdin.flush().await.map_err(WorkloopError::Io)?;
            drop(stdin);
        }

        let mut output = String::new();

        match self.config.kind {
            WorkerKind::Interactive => {
                let exit_code = Self::capture(&mut child, &mut output).await?;
                Ok(WorkerOutcome {
                    output,
                    timed_out: false,
                    exit_code: Some(exit_code),
                })
            }
            WorkerKind::Headless => {
                match tokio::time::timeout(
                    self.config.timeout,
                    Self::capture(&mut child, &mut output),
                )
                .await
                {
                    Ok(result) => {
                        let exit_code = result?;
                        Ok(WorkerOutcome {
                            output,
                            timed_out: false,
                            exit_code: Some(exit_code),
                        })
                    }
                    Err(_) => {
                        warn!(
                            "Worker exceeded {}s timeout, terminating",
                            self.config.timeout.as_secs()
                        );
                        child.kill().await.ok();
                        child.wait().await.ok();
                        Ok(WorkerOutcome {
                            output,
                            timed_out: true,
                            exit_code: None,
                        })
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(WorkerKind::Interactive.to_string(), "interactive");
        assert_eq!(WorkerKind::Headless.to_string(), "headless");
    }

    #[test]
    fn test_default_commands() {
        let (program, args) = WorkerConfig::new(WorkerKind::Interactive, 1800).command();
        assert_eq!(program, "claude");
        assert!(args.contains(&"--print".to_string()));

        let (program, args) = WorkerConfig::new(WorkerKind::Headless, 1800).command();
        assert_eq!(program, "claude");
        assert!(args.contains(&"-p".to_string()));
    }

    #[test]
    fn test_override_is_whitespace_split() {
        let config = WorkerConfig::new(WorkerKind::Headless, 10)
            .with_override(Some("/bin/cat -".to_string()));
        let (program, args) = config.command();
        assert_eq!(program, "/bin/cat");
        assert_eq!(args, vec!["-".to_string()]);
    }

    #[test]
    fn test_validate_rejects_missing_binary() {
        let config = WorkerConfig::new(WorkerKind::Headless, 10)
            .with_override(Some("definitely-not-a-real-binary-xyz".to_string()));
        let err = CommandWorker::new(config).validate().unwrap_err();
        assert!(matches!(err, WorkloopError::MissingTool { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_override() {
        let config =
            WorkerConfig::new(WorkerKind::Headless, 10).with_override(Some("   ".to_string()));
        let err = CommandWorker::new(config).validate().unwrap_err();
        assert!(matches!(err, WorkloopError::InvalidConfig { .. }));
    }

    #[test]
    fn test_outcome_detects_marker() {
        let outcome = WorkerOutcome {
            output: format!("did some work\n{}\n", COMPLETION_MARKER),
            timed_out: false,
            exit_code: Some(0),
        };
        assert!(outcome.is_complete());

        let outcome = WorkerOutcome {
            output: "still going".to_string(),
            timed_out: false,
            exit_code: Some(0),
        };
        assert!(!outcome.is_complete());
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script_worker(temp: &TempDir, body: &str, kind: WorkerKind, timeout: u64) -> CommandWorker {
            let path = temp.path().join("worker.sh");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

            let config = WorkerConfig::new(kind, timeout)
                .with_override(Some(path.display().to_string()));
            CommandWorker::new(config)
        }

        #[tokio::test]
        async fn test_invoke_captures_stdout() {
            let temp = TempDir::new().unwrap();
            let worker = script_worker(
                &temp,
                "cat > /dev/null\necho hello from the worker",
                WorkerKind::Interactive,
                0,
            );

            let outcome = worker.invoke("the prompt").await.unwrap();
            assert!(outcome.output.contains("hello from the worker"));
            assert!(!outcome.timed_out);
            assert_eq!(outcome.exit_code, Some(0));
        }

        #[tokio::test]
        async fn test_invoke_sees_completion_marker() {
            let temp = TempDir::new().unwrap();
            let worker = script_worker(
                &temp,
                "cat > /dev/null\necho '<promise>COMPLETE</promise>'",
                WorkerKind::Headless,
                30,
            );

            let outcome = worker.invoke("finish up").await.unwrap();
            assert!(outcome.is_complete());
        }

        #[tokio::test]
        async fn test_headless_timeout_kills_worker() {
            let temp = TempDir::new().unwrap();
            let worker = script_worker(
                &temp,
                "cat > /dev/null\necho partial\nsleep 30",
                WorkerKind::Headless,
                1,
            );

            let outcome = worker.invoke("slow work").await.unwrap();
            assert!(outcome.timed_out);
            assert_eq!(outcome.exit_code, None);
            // output captured before the kill is retained
            assert!(outcome.output.contains("partial"));
        }

        #[tokio::test]
        async fn test_interactive_receives_prompt_on_stdin() {
            let temp = TempDir::new().unwrap();
            let worker = script_worker(&temp, "cat", WorkerKind::Interactive, 0);

            let outcome = worker.invoke("echo this back").await.unwrap();
            assert!(outcome.output.contains("echo this back"));
        }
    }
}
