use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::error::AgentError;
use crate::settings::LlmSettings;

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    pub content: Option<String>,
}

/// Blocking client for an OpenAI-compatible chat completions endpoint.
pub struct LlmClient {
    http: Client,
    settings: LlmSettings,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout_secs.map(Duration::from_secs))
            .build()
            .context("failed to build HTTP client")?;
        let api_key = settings.api_key();

        Ok(Self {
            http,
            settings,
            api_key,
        })
    }

    pub fn build_request(&self, system: &str, user: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        }
    }

    /// One request, one reply. No retries here.
    pub fn chat(&self, system: &str, user: &str) -> Result<String, AgentError> {
        let req = self.build_request(system, user);
        debug!(endpoint = %self.settings.endpoint, model = %req.model, "sending chat completion");

        let mut builder = self.http.post(&self.settings.endpoint).json(&req);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let resp = resp
            .json::<ChatCompletionResponse>()
            .map_err(|e| AgentError::Malformed(e.to_string()))?;

        extract_content(resp)
    }
}

pub fn extract_content(resp: ChatCompletionResponse) -> Result<String, AgentError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(AgentError::EmptyContent)
}

fn models_url(endpoint: &str) -> String {
    match endpoint.strip_suffix("/chat/completions") {
        Some(base) => format!("{base}/models"),
        None => format!("{}/models", endpoint.trim_end_matches('/')),
    }
}

pub fn test_connection(settings: &LlmSettings) -> Result<String> {
    let client = Client::new();
    let url = models_url(&settings.endpoint);

    let mut builder = client.get(&url);
    if let Some(key) = settings.api_key() {
        builder = builder.bearer_auth(key);
    }

    let resp: serde_json::Value = builder
        .send()
        .with_context(|| format!("could not reach {url}"))?
        .error_for_status()?
        .json()?;

    Ok(format!(
        "Connected to {url} ({} models available)",
        resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
    ))
}
