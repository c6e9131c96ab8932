// ABOUTME: Registry connection settings as persisted in registry.json.
// ABOUTME: Derives the push address and the HTTP base URL from url and port.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Registry host, optionally with scheme (`http://registry.local`).
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl RegistrySettings {
    pub fn is_configured(&self) -> bool {
        self.address().is_some()
    }

    fn host(&self) -> &str {
        let url = self.url.trim();
        url.strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url)
            .trim_end_matches('/')
    }

    /// `host[:port]` as used in image references.
    pub fn address(&self) -> Option<String> {
        let host = self.host();
        if host.is_empty() {
            return None;
        }
        match self.port {
            Some(port) if !host.contains(':') => Some(format!("{host}:{port}")),
            _ => Some(host.to_string()),
        }
    }

    /// Base URL for the registry HTTP API. Plain HTTP unless `url` says https.
    pub fn base_url(&self) -> Option<String> {
        let scheme = if self.url.trim().starts_with("https://") {
            "https"
        } else {
            "http"
        };
        self.address().map(|address| format!("{scheme}://{address}"))
    }
}

/// Settings as returned to API clients, without the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySettingsView {
    pub url: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub has_password: bool,
}

impl From<&RegistrySettings> for RegistrySettingsView {
    fn from(settings: &RegistrySettings) -> Self {
        Self {
            url: settings.url.clone(),
            port: settings.port,
            username: settings.username.clone(),
            has_password: settings.password.as_deref().is_some_and(|p| !p.is_empty()),
        }
    }
}
