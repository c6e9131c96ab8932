// ABOUTME: Shared state handed to every API handler.
// ABOUTME: Built once at startup from Config; holds no per-request state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::images::ImageService;
use crate::registry::RegistryStore;
use crate::runtime::{Executor, ProcessRunner, WhichProbe};

const REGISTRY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Static facts about where this instance runs, reported by `/health`.
#[derive(Debug, Clone, Default)]
pub struct DeploymentInfo {
    pub environment: String,
    pub hostname: String,
    pub namespace: Option<String>,
    pub pod_name: Option<String>,
    pub kubeconfig: bool,
}

impl DeploymentInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            environment: config.environment.clone(),
            hostname: gethostname::gethostname().to_string_lossy().into_owned(),
            namespace: config.kubernetes.namespace.clone(),
            pod_name: config.kubernetes.pod_name.clone(),
            kubeconfig: config.kubernetes.kubeconfig.is_some(),
        }
    }
}

pub struct AppState<R = ProcessRunner, P = WhichProbe> {
    pub images: Arc<ImageService<R, P>>,
    pub registry: Arc<RegistryStore>,
    pub http: reqwest::Client,
    pub info: Arc<DeploymentInfo>,
}

// Manual impl: derive would demand R: Clone and P: Clone.
impl<R, P> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            images: Arc::clone(&self.images),
            registry: Arc::clone(&self.registry),
            http: self.http.clone(),
            info: Arc::clone(&self.info),
        }
    }
}

impl AppState {
    /// State backed by real subprocesses, as used by `serve`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let executor = Executor::system(config.runtime_config(), config.retry);
        Self::new(
            ImageService::new(executor),
            RegistryStore::new(&config.registry_file),
            DeploymentInfo::from_config(config),
        )
    }
}

impl<R, P> AppState<R, P> {
    pub fn new(
        images: ImageService<R, P>,
        registry: RegistryStore,
        info: DeploymentInfo,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REGISTRY_PROBE_TIMEOUT)
            .build()?;
        Ok(Self {
            images: Arc::new(images),
            registry: Arc::new(registry),
            http,
            info: Arc::new(info),
        })
    }
}
