// ABOUTME: Test support utilities.
// ABOUTME: Scripted command runner and switchable binary probe for driving the executor offline.

use imagedash::runtime::{
    BinaryProbe, CommandOutput, CommandRunner, ComposedCommand, ExecError, Executor,
    RetryPolicy, RuntimeConfig, RuntimeType,
};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("imagedash=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

type Step = Box<dyn Fn(&ComposedCommand) -> Result<CommandOutput, ExecError> + Send + Sync>;

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    calls: Vec<ComposedCommand>,
}

/// Replays queued results in order; succeeds with empty output once the queue runs dry.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Mutex<Script>>,
}

#[allow(dead_code)]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(&self, stdout: &str) -> &Self {
        let stdout = stdout.to_string();
        self.then(move |_| Ok(CommandOutput::new(stdout.clone(), "")))
    }

    pub fn then_fail(&self, stderr: &str) -> &Self {
        let stderr = stderr.to_string();
        self.then(move |cmd| Err(ExecError::failed(cmd.program(), Some(1), stderr.clone())))
    }

    /// Queue the same failure `times` times.
    pub fn then_fail_times(&self, stderr: &str, times: usize) -> &Self {
        for _ in 0..times {
            self.then_fail(stderr);
        }
        self
    }

    pub fn then<F>(&self, step: F) -> &Self
    where
        F: Fn(&ComposedCommand) -> Result<CommandOutput, ExecError> + Send + Sync + 'static,
    {
        self.script.lock().steps.push_back(Box::new(step));
        self
    }

    pub fn calls(&self) -> Vec<ComposedCommand> {
        self.script.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().calls.len()
    }

    /// Argument lists of every call, without the program name.
    pub fn call_args(&self) -> Vec<Vec<String>> {
        self.calls().iter().map(|c| c.args().to_vec()).collect()
    }
}

#[async_trait::async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &ComposedCommand) -> Result<CommandOutput, ExecError> {
        let step = {
            let mut script = self.script.lock();
            script.calls.push(command.clone());
            script.steps.pop_front()
        };
        match step {
            Some(step) => step(command),
            None => Ok(CommandOutput::default()),
        }
    }
}

/// Pretends a chosen set of runtime binaries is installed; the set can change mid-test.
#[derive(Clone, Default)]
pub struct StaticProbe {
    installed: Arc<Mutex<HashSet<String>>>,
}

#[allow(dead_code)]
impl StaticProbe {
    pub fn with(runtimes: &[RuntimeType]) -> Self {
        let probe = Self::default();
        probe.set(runtimes);
        probe
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn set(&self, runtimes: &[RuntimeType]) {
        *self.installed.lock() = runtimes.iter().map(|r| r.binary().to_string()).collect();
    }
}

impl BinaryProbe for StaticProbe {
    fn is_available(&self, binary: &str) -> bool {
        self.installed.lock().contains(binary)
    }
}

/// Retry policy with the default bound and a short delay.
#[allow(dead_code)]
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        delay: Duration::from_millis(10),
    }
}

#[allow(dead_code)]
pub fn executor(
    runner: &ScriptedRunner,
    probe: &StaticProbe,
    retry: RetryPolicy,
) -> Executor<ScriptedRunner, StaticProbe> {
    Executor::new(runner.clone(), probe.clone(), RuntimeConfig::default(), retry)
}
