// ABOUTME: HTTP server settings.
// ABOUTME: Listen address for the dashboard API.

use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

pub(crate) fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}
