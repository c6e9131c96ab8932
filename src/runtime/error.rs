// ABOUTME: Runtime error types with SNAFU pattern.
// ABOUTME: Unifies detection and execution errors for programmatic handling.

use snafu::Snafu;

use super::detection::DetectionError;
use super::executor::{Disposition, ExecError};

/// Unified runtime error for detection and command failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("runtime command failed after {attempts} attempt(s): {source}"))]
    Execution { source: ExecError, attempts: u32 },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No usable container runtime binary on the system.
    NoRuntimeFound,
    /// The command failed in a way that repeating it cannot fix.
    CommandRejected,
    /// The command kept failing until the retry bound was reached.
    RetriesExhausted,
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { .. } => RuntimeErrorKind::NoRuntimeFound,
            RuntimeError::Execution { source, .. } => match source.disposition() {
                Disposition::Terminal => RuntimeErrorKind::CommandRejected,
                Disposition::Retryable => RuntimeErrorKind::RetriesExhausted,
            },
        }
    }

    /// Number of executions made before giving up (0 if nothing ran).
    pub fn attempts(&self) -> u32 {
        match self {
            RuntimeError::Detection { .. } => 0,
            RuntimeError::Execution { attempts, .. } => *attempts,
        }
    }

    /// Last stderr (or spawn error) reported by the runtime.
    pub fn detail(&self) -> String {
        match self {
            RuntimeError::Detection { source } => source.to_string(),
            RuntimeError::Execution { source, .. } => source.detail(),
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}
