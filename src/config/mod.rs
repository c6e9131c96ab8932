// ABOUTME: Configuration types and parsing for imagedash.yml.
// ABOUTME: Handles YAML parsing, file discovery and environment variable overrides.

mod deserialize;
mod init;
mod kubernetes;
mod server;

pub use init::init_config;
pub use kubernetes::KubernetesConfig;
pub use server::ServerConfig;

use crate::error::{Error, Result};
use crate::registry::DEFAULT_REGISTRY_FILE;
use crate::runtime::{RetryPolicy, RuntimeConfig, RuntimeType};
use deserialize::deserialize_runtime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "imagedash.yml";
pub const CONFIG_FILENAME_ALT: &str = "imagedash.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".imagedash/config.yml";

pub const ENV_CONTAINER_RUNTIME: &str = "CONTAINER_RUNTIME";
pub const ENV_KUBECONFIG: &str = "KUBECONFIG";
pub const ENV_KUBERNETES_NAMESPACE: &str = "KUBERNETES_NAMESPACE";
pub const ENV_KUBERNETES_POD_NAME: &str = "KUBERNETES_POD_NAME";
pub const ENV_ENVIRONMENT: &str = "NODE_ENV";
pub const ENV_BIND: &str = "IMAGEDASH_BIND";
pub const ENV_REGISTRY_FILE: &str = "IMAGEDASH_REGISTRY_FILE";

const MAX_RETRIES_LIMIT: u32 = 10;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Runtime override; `None` probes docker, nerdctl, crictl in order.
    #[serde(default, deserialize_with = "deserialize_runtime")]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "default_registry_file")]
    pub registry_file: PathBuf,

    #[serde(default)]
    pub kubernetes: KubernetesConfig,

    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_registry_file() -> PathBuf {
    PathBuf::from(DEFAULT_REGISTRY_FILE)
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: None,
            retry: RetryPolicy::default(),
            server: ServerConfig::default(),
            registry_file: default_registry_file(),
            kubernetes: KubernetesConfig::default(),
            environment: default_environment(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading configuration");
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// File (explicit or discovered) overlaid with the process environment.
    pub fn resolve(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::discover(dir)?,
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides. Empty values count as unset.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(runtime) = get(ENV_CONTAINER_RUNTIME) {
            self.runtime = if runtime.trim().eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(runtime.parse().map_err(|e: crate::runtime::UnknownRuntime| {
                    Error::InvalidConfig(format!("{ENV_CONTAINER_RUNTIME}: {e}"))
                })?)
            };
        }
        if let Some(path) = get(ENV_KUBECONFIG) {
            self.kubernetes.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(namespace) = get(ENV_KUBERNETES_NAMESPACE) {
            self.kubernetes.namespace = Some(namespace);
        }
        if let Some(pod_name) = get(ENV_KUBERNETES_POD_NAME) {
            self.kubernetes.pod_name = Some(pod_name);
        }
        if let Some(environment) = get(ENV_ENVIRONMENT) {
            self.environment = environment;
        }
        if let Some(bind) = get(ENV_BIND) {
            self.server.bind = bind
                .trim()
                .parse()
                .map_err(|e| Error::InvalidConfig(format!("{ENV_BIND}: {e}")))?;
        }
        if let Some(path) = get(ENV_REGISTRY_FILE) {
            self.registry_file = PathBuf::from(path);
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "retry.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                self.retry.max_retries
            )));
        }
        if self.retry.delay > MAX_RETRY_DELAY {
            return Err(Error::InvalidConfig(format!(
                "retry.delay must be at most {}s, got {:?}",
                MAX_RETRY_DELAY.as_secs(),
                self.retry.delay
            )));
        }
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            runtime: self.runtime,
        }
    }
}
