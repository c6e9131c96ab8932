// ABOUTME: Runtime type definitions for docker, nerdctl and crictl.
// ABOUTME: Includes RuntimeType enum, probe order and RuntimeConfig override.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The container CLI backend a command is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Nerdctl,
    Crictl,
}

impl RuntimeType {
    /// Auto-detection order. First available binary wins.
    pub const PROBE_ORDER: [RuntimeType; 3] =
        [RuntimeType::Docker, RuntimeType::Nerdctl, RuntimeType::Crictl];

    /// Name of the executable for this runtime.
    pub fn binary(&self) -> &'static str {
        match self {
            RuntimeType::Docker => "docker",
            RuntimeType::Nerdctl => "nerdctl",
            RuntimeType::Crictl => "crictl",
        }
    }
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown container runtime: {0} (expected docker, nerdctl or crictl)")]
pub struct UnknownRuntime(pub String);

impl FromStr for RuntimeType {
    type Err = UnknownRuntime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(RuntimeType::Docker),
            "nerdctl" => Ok(RuntimeType::Nerdctl),
            "crictl" => Ok(RuntimeType::Crictl),
            _ => Err(UnknownRuntime(s.to_string())),
        }
    }
}

/// Configuration for explicit runtime override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    /// Explicit runtime type (restricts probing to this binary).
    pub runtime: Option<RuntimeType>,
}
