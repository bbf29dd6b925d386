use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::chat::error_message;
use super::{ProviderError, TextGenerator};
use crate::config::ProviderSettings;

const NAME: &str = "Gemini";

pub struct Gemini {
    settings: ProviderSettings,
    client: Client,
}

impl Gemini {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings, client: Client::new() }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Rewrites the well-known Gemini failure codes into actionable messages.
fn friendly_message(raw: &str, key_env: &[String]) -> String {
    let env = key_env.first().map(String::as_str).unwrap_or("GOOGLE_API_KEY");
    if raw.contains("API_KEY_INVALID") || raw.contains("API key not valid") {
        format!("Invalid Google API key. Please check your {env}.")
    } else if raw.contains("QUOTA_EXCEEDED") || raw.contains("RESOURCE_EXHAUSTED") {
        "Google API quota exceeded. Please try again later or check your billing.".to_string()
    } else if raw.contains("SAFETY") {
        "Content was blocked by safety filters. Try a different prompt.".to_string()
    } else {
        error_message(raw)
    }
}

#[async_trait]
impl TextGenerator for Gemini {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = self
            .settings
            .resolve_api_key()
            .ok_or_else(|| ProviderError::missing_key(NAME, &self.settings.key_env))?;
        let model = self
            .settings
            .primary_model()
            .ok_or_else(|| ProviderError::new(NAME, None, "no model configured"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        );
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![PartIn { text: prompt }] }],
            generation_config: GenerationConfig {
                max_output_tokens: 8192,
                temperature: 0.3,
                top_p: 0.8,
                top_k: 40,
            },
        };

        debug!(model, prompt_chars = prompt.len(), "POST generateContent");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", key.as_str())])
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(NAME, e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ProviderError::from_reqwest(NAME, e))?;

        if !status.is_success() {
            return Err(ProviderError::new(
                NAME,
                Some(status.as_u16()),
                friendly_message(&text, &self.settings.key_env),
            ));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::new(NAME, Some(status.as_u16()), format!("failed to parse response: {e}"))
        })?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::new(NAME, None, friendly_message(&reason, &self.settings.key_env)));
        }

        let out: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        debug!(chars = out.len(), "Gemini response received");
        Ok(out)
    }
}
