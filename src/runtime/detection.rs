// ABOUTME: Runtime detection by probing for container CLI binaries.
// ABOUTME: Checks docker first, then nerdctl, then crictl, on every dispatch.

use super::types::{RuntimeConfig, RuntimeType};

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked docker, nerdctl and crictl)")]
    NoRuntimeFound,

    #[error("configured container runtime {0} is not available")]
    ConfiguredRuntimeMissing(RuntimeType),
}

/// Answers whether a binary can be executed on this host.
pub trait BinaryProbe: Send + Sync {
    fn is_available(&self, binary: &str) -> bool;
}

/// Probes `PATH` the way `which <binary>` does.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhichProbe;

impl BinaryProbe for WhichProbe {
    fn is_available(&self, binary: &str) -> bool {
        which::which(binary).is_ok()
    }
}

/// Detect which container runtime to dispatch to.
///
/// Detection order (when not explicitly configured):
/// 1. `docker`
/// 2. `nerdctl`
/// 3. `crictl`
///
/// If `config` names a runtime, only that binary is probed.
pub fn detect_runtime(
    probe: &impl BinaryProbe,
    config: &RuntimeConfig,
) -> Result<RuntimeType, DetectionError> {
    if let Some(runtime) = config.runtime {
        if probe.is_available(runtime.binary()) {
            return Ok(runtime);
        }
        return Err(DetectionError::ConfiguredRuntimeMissing(runtime));
    }

    for runtime in RuntimeType::PROBE_ORDER {
        if probe.is_available(runtime.binary()) {
            tracing::debug!(%runtime, "container runtime detected");
            return Ok(runtime);
        }
        tracing::trace!(%runtime, "container runtime not found");
    }

    Err(DetectionError::NoRuntimeFound)
}
