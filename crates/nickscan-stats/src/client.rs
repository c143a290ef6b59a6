use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use nickscan_config::network::NetworkConfig;
use nickscan_core::{RemoteError, StatsService};
use nickscan_types::PlayerStats;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

/// Error body returned by the stats server
#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

/// Stats provider reached over HTTP: `GET {server}/{endpoint}/{room}/{nick}`
#[derive(Clone)]
pub struct HttpStatsService {
    client: reqwest::Client,
    config: NetworkConfig,
}

impl HttpStatsService {
    pub fn new(config: NetworkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build stats HTTP client")?;
        Ok(Self { client, config })
    }

    /// Every segment is percent-encoded, so nicks with spaces or slashes stay one segment
    pub fn stats_url(&self, room: &str, nick: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.config.server_url).map_err(|e| {
            RemoteError::Network(format!("invalid server url '{}': {e}", self.config.server_url))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                RemoteError::Network(format!(
                    "server url '{}' cannot take a path",
                    self.config.server_url
                ))
            })?
            .pop_if_empty()
            .extend(self.config.endpoint.split('/').filter(|s| !s.is_empty()))
            .push(room)
            .push(nick);

        Ok(url)
    }
}

#[async_trait]
impl StatsService for HttpStatsService {
    async fn fetch(&self, nick: &str, room: &str) -> Result<PlayerStats, RemoteError> {
        let url = self.stats_url(room, nick)?;
        tracing::debug!(%url, "fetching player stats");

        let mut request = self.client.get(url);
        if !self.config.token.is_empty() {
            request = request.bearer_auth(&self.config.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(format!("failed to read body: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(nick.to_string()));
        }
        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        let mut stats = parse_stats(&body)?;
        if stats.nick.is_empty() {
            stats.nick = nick.to_string();
        }
        Ok(stats)
    }
}

fn parse_stats(body: &str) -> Result<PlayerStats, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn rejection(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
    RemoteError::Rejected {
        status: status.as_u16(),
        message,
    }
}
