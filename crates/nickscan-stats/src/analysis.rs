use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use nickscan_config::analysis::AnalysisConfig;
use nickscan_core::{AnalysisService, RemoteError};
use nickscan_types::PlayerStats;
use serde::{Deserialize, Serialize};

use crate::prompt::{build_prompt, strip_stats_tail};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Analysis text from an OpenAI-compatible chat completion endpoint.
///
/// A single attempt per call. An empty API key fails before any request is made.
#[derive(Clone)]
pub struct OpenAiAnalysisService {
    client: reqwest::Client,
    config: AnalysisConfig,
}

impl OpenAiAnalysisService {
    pub fn new(config: AnalysisConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build analysis HTTP client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AnalysisService for OpenAiAnalysisService {
    async fn analyze(&self, stats: &PlayerStats) -> Result<String, RemoteError> {
        let api_key = self.config.api_key.trim();
        if api_key.is_empty() {
            return Err(RemoteError::MissingCredentials("OpenAI API key"));
        }

        let prompt = build_prompt(stats);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(model = %self.config.model, nick = %stats.nick, "requesting analysis");
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        extract_analysis(&text)
    }
}

fn extract_analysis(body: &str) -> Result<String, RemoteError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RemoteError::Decode("response has no message content".into()))?;

    let analysis = strip_stats_tail(&content);
    if analysis.is_empty() {
        return Err(RemoteError::Decode("analysis is empty".into()));
    }
    Ok(analysis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let service = OpenAiAnalysisService::new(
            AnalysisConfig {
                api_key: "   ".into(),
                api_url: "http://127.0.0.1:9/never".into(),
                ..AnalysisConfig::default()
            },
            Duration::from_secs(1),
        )
        .unwrap();

        let err = service.analyze(&PlayerStats::new("Alice")).await.unwrap_err();
        assert_eq!(err, RemoteError::MissingCredentials("OpenAI API key"));
    }

    #[test]
    fn test_first_choice_is_used_and_tail_stripped() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Loose passive.\n📊 Stats\n- VPIP: 40%"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        assert_eq!(extract_analysis(body).unwrap(), "Loose passive.");
    }

    #[test]
    fn test_empty_choices_are_a_decode_error() {
        assert!(matches!(
            extract_analysis(r#"{"choices": []}"#),
            Err(RemoteError::Decode(_))
        ));
        assert!(matches!(
            extract_analysis(r#"{"choices": [{"message": {"content": "📊 Stats only"}}]}"#),
            Err(RemoteError::Decode(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 300,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["temperature"], 0.5);
    }
}
