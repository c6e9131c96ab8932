// ABOUTME: Subprocess execution of composed runtime commands with bounded retry.
// ABOUTME: Classifies failures as retryable or terminal before waiting a fixed delay.

use super::command::{ComposedCommand, RuntimeCommand};
use super::detection::{BinaryProbe, DetectionError, WhichProbe, detect_runtime};
use super::error::RuntimeError;
use super::types::{RuntimeConfig, RuntimeType};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;

/// Output from a runtime command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// A single failed execution attempt.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {}", exit_label(.exit_code), .stderr.trim())]
    Failed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retryable,
    Terminal,
}

/// Runtime messages that mean the same command will fail again.
const TERMINAL_MARKERS: &[&str] = &[
    "no such image",
    "not found",
    "invalid reference format",
    "manifest unknown",
    "unauthorized",
    "denied",
    "no such file or directory",
    "is using its referenced image",
    "image is being used",
    "must be forced",
];

impl ExecError {
    pub fn failed(
        program: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        ExecError::Failed {
            program: program.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            ExecError::Spawn { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    Disposition::Terminal
                }
                _ => Disposition::Retryable,
            },
            ExecError::Failed { stderr, .. } => {
                let stderr = stderr.to_ascii_lowercase();
                if TERMINAL_MARKERS.iter().any(|m| stderr.contains(m)) {
                    Disposition::Terminal
                } else {
                    Disposition::Retryable
                }
            }
        }
    }

    /// Captured stderr, or the spawn error message.
    pub fn detail(&self) -> String {
        match self {
            ExecError::Spawn { source, .. } => source.to_string(),
            ExecError::Failed { stderr, .. } => stderr.trim().to_string(),
        }
    }
}

/// Runs one composed command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ComposedCommand) -> Result<CommandOutput, ExecError>;
}

/// Runs commands as child processes without an intermediate shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ComposedCommand) -> Result<CommandOutput, ExecError> {
        let output = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: command.program().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(ExecError::failed(
                command.program(),
                output.status.code(),
                stderr,
            ))
        }
    }
}

/// Fixed-delay retry bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Re-attempts after the initial failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub delay: Duration,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(1000)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay: default_retry_delay(),
        }
    }
}

/// Resolves the runtime for each command and runs it with retry.
pub struct Executor<R = ProcessRunner, P = WhichProbe> {
    runner: R,
    probe: P,
    runtime: RuntimeConfig,
    retry: RetryPolicy,
}

impl Executor {
    /// Executor backed by real subprocesses and `PATH` probing.
    pub fn system(runtime: RuntimeConfig, retry: RetryPolicy) -> Self {
        Self::new(ProcessRunner, WhichProbe, runtime, retry)
    }
}

impl<R: CommandRunner, P: BinaryProbe> Executor<R, P> {
    pub fn new(runner: R, probe: P, runtime: RuntimeConfig, retry: RetryPolicy) -> Self {
        Self {
            runner,
            probe,
            runtime,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Probe for the runtime the next command would be dispatched to.
    pub fn detect(&self) -> Result<RuntimeType, DetectionError> {
        detect_runtime(&self.probe, &self.runtime)
    }

    /// Detect the runtime, translate `command` for it and run it.
    pub async fn dispatch(&self, command: &RuntimeCommand) -> Result<CommandOutput, RuntimeError> {
        let runtime = self.detect()?;
        let composed = runtime.compose(command);
        self.run_with_retry(&composed).await
    }

    /// Run an already composed command, retrying retryable failures.
    pub async fn run_with_retry(
        &self,
        composed: &ComposedCommand,
    ) -> Result<CommandOutput, RuntimeError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let started = Instant::now();
            tracing::debug!(command = %composed, attempt, "executing runtime command");

            match self.runner.run(composed).await {
                Ok(output) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    if !output.stderr.trim().is_empty() {
                        tracing::warn!(
                            command = %composed,
                            stderr = %output.stderr.trim(),
                            "runtime command wrote to stderr"
                        );
                    }
                    tracing::info!(command = %composed, attempt, elapsed_ms, "runtime command succeeded");
                    return Ok(output);
                }
                Err(error) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    let disposition = error.disposition();

                    if disposition == Disposition::Terminal {
                        tracing::error!(command = %composed, attempt, elapsed_ms, %error, "runtime command failed permanently");
                        return Err(RuntimeError::Execution {
                            source: error,
                            attempts: attempt,
                        });
                    }

                    if attempt > self.retry.max_retries {
                        tracing::error!(command = %composed, attempt, elapsed_ms, %error, "runtime command failed, retries exhausted");
                        return Err(RuntimeError::Execution {
                            source: error,
                            attempts: attempt,
                        });
                    }

                    tracing::warn!(
                        command = %composed,
                        attempt,
                        elapsed_ms,
                        %error,
                        "runtime command failed, retrying in {:?}",
                        self.retry.delay
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_terminal() {
        let err = ExecError::Spawn {
            program: "docker".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.disposition(), Disposition::Terminal);
    }

    #[test]
    fn no_such_image_is_terminal() {
        let err = ExecError::failed(
            "docker",
            Some(1),
            "Error response from daemon: No such image: ghost:latest",
        );
        assert_eq!(err.disposition(), Disposition::Terminal);
    }

    #[test]
    fn daemon_hiccup_is_retryable() {
        let err = ExecError::failed(
            "docker",
            Some(1),
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock",
        );
        assert_eq!(err.disposition(), Disposition::Retryable);
    }

    #[test]
    fn failed_display_includes_status_and_stderr() {
        let err = ExecError::failed("nerdctl", Some(125), "boom\n");
        assert_eq!(err.to_string(), "nerdctl exited with status 125: boom");

        let err = ExecError::failed("docker", None, "killed");
        assert_eq!(err.to_string(), "docker exited with signal: killed");
    }

    #[test]
    fn default_policy_is_three_retries_one_second_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::from_millis(1000));
    }
}
