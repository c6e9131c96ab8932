// ABOUTME: Container runtime selection and command execution.
// ABOUTME: Probes docker/nerdctl/crictl, translates commands and runs them with retry.

mod command;
mod detection;
mod error;
mod executor;
mod types;

pub use command::{ComposedCommand, NERDCTL_NAMESPACE, RuntimeCommand};
pub use detection::{BinaryProbe, DetectionError, WhichProbe, detect_runtime};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use executor::{
    CommandOutput, CommandRunner, Disposition, ExecError, Executor, ProcessRunner, RetryPolicy,
};
pub use types::{RuntimeConfig, RuntimeType, UnknownRuntime};
