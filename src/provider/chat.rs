use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::ProviderError;

/// Body of an OpenAI-compatible `/chat/completions` call. The whole prompt
/// goes out as a single user message.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Msg<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
}

#[derive(Serialize, Debug)]
pub struct Msg<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub fn single_user(model: &'a str, prompt: &'a str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            messages: vec![Msg { role: "user", content: prompt }],
            temperature,
            max_tokens,
            top_p: None,
            frequency_penalty: None,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pulls `error.message` out of a JSON error body, falling back to a
/// shortened copy of the raw text.
pub fn error_message(body: &str) -> String {
    if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(body) {
        return env.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty error body".to_string();
    }
    trimmed.chars().take(500).collect()
}

pub struct ChatCall<'a> {
    pub provider: &'a str,
    pub url: String,
    pub api_key: &'a str,
    pub timeout: Duration,
    pub headers: &'a [(&'a str, &'a str)],
}

/// POST a chat completion and return the first choice's text. An absent
/// choice yields an empty string, as the upstream APIs do on some filters.
pub async fn complete(client: &Client, call: ChatCall<'_>, body: &ChatRequest<'_>) -> Result<String, ProviderError> {
    debug!(provider = call.provider, url = %call.url, model = body.model, "POST chat completion");

    let mut req = client
        .post(&call.url)
        .bearer_auth(call.api_key)
        .timeout(call.timeout)
        .json(body);
    for (k, v) in call.headers {
        req = req.header(*k, *v);
    }

    let resp = req.send().await.map_err(|e| ProviderError::from_reqwest(call.provider, e))?;
    let status = resp.status();
    let text = resp.text().await.map_err(|e| ProviderError::from_reqwest(call.provider, e))?;

    debug!(provider = call.provider, %status, bytes = text.len(), "raw response");

    if !status.is_success() {
        return Err(ProviderError::new(call.provider, Some(status.as_u16()), error_message(&text)));
    }

    let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
        ProviderError::new(call.provider, Some(status.as_u16()), format!("failed to parse response: {e}"))
    })?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}
