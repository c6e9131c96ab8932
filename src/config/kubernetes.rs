// ABOUTME: Kubernetes placement details reported by the health endpoint.
// ABOUTME: The service does not talk to the cluster API itself.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KubernetesConfig {
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub pod_name: Option<String>,
}
