// ABOUTME: Registry reachability probe against the Docker Registry HTTP API v2.
// ABOUTME: A 401 still counts as healthy: the registry answered and wants credentials.

use super::settings::RegistrySettings;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryHealth {
    pub healthy: bool,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Probe `GET <registry>/v2/`.
pub async fn check_health(client: &reqwest::Client, settings: &RegistrySettings) -> RegistryHealth {
    let checked_at = Utc::now();
    let Some(base_url) = settings.base_url() else {
        return RegistryHealth {
            healthy: false,
            url: None,
            status: None,
            error: Some("registry is not configured".to_string()),
            checked_at,
        };
    };

    let mut request = client.get(format!("{base_url}/v2/"));
    if let Some(username) = settings.username.as_deref().filter(|u| !u.is_empty()) {
        request = request.basic_auth(username, settings.password.as_deref());
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let healthy = status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED;
            tracing::debug!(url = %base_url, %status, healthy, "registry health probed");
            RegistryHealth {
                healthy,
                url: Some(base_url),
                status: Some(status.as_u16()),
                error: (!healthy).then(|| format!("registry responded with {status}")),
                checked_at,
            }
        }
        Err(e) => {
            tracing::warn!(url = %base_url, error = %e, "registry health probe failed");
            RegistryHealth {
                healthy: false,
                url: Some(base_url),
                status: None,
                error: Some(e.to_string()),
                checked_at,
            }
        }
    }
}
