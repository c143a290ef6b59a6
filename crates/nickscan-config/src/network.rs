use std::env;

use serde::{Deserialize, Serialize};

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_endpoint() -> String {
    "api/jugador".to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

/// Stats provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Path prefix under which `{room}/{nick}` is appended
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token, sent only when non-empty
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl NetworkConfig {
    pub fn new() -> Self {
        let server_url = env::var("STATS_SERVER_URL").unwrap_or_else(|_| default_server_url());
        let token = env::var("STATS_TOKEN").unwrap_or_default();
        let timeout_seconds = env::var("HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_seconds);

        Self {
            server_url,
            endpoint: default_endpoint(),
            token,
            timeout_seconds,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            endpoint: default_endpoint(),
            token: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}
