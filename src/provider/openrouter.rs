use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use super::chat::{self, ChatCall, ChatRequest};
use super::{ProviderError, TextGenerator};
use crate::config::ProviderSettings;

const NAME: &str = "OpenRouter";
const REFERER: &str = "https://wavecodegen.app";
const TITLE: &str = "WaveCodeGen";

/// OpenRouter walks its own model list before giving up, so one provider
/// attempt may cost several HTTP calls.
pub struct OpenRouter {
    settings: ProviderSettings,
    client: Client,
}

impl OpenRouter {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings, client: Client::new() }
    }
}

#[async_trait]
impl TextGenerator for OpenRouter {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = self
            .settings
            .resolve_api_key()
            .ok_or_else(|| ProviderError::missing_key(NAME, &self.settings.key_env))?;
        if self.settings.models.is_empty() {
            return Err(ProviderError::new(NAME, None, "no model configured"));
        }

        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let headers = [("HTTP-Referer", REFERER), ("X-Title", TITLE)];
        let mut last: Option<ProviderError> = None;

        for model in &self.settings.models {
            let body = ChatRequest {
                top_p: Some(0.85),
                frequency_penalty: Some(0.5),
                ..ChatRequest::single_user(model, prompt, 0.25, 8192)
            };
            let call = ChatCall {
                provider: NAME,
                url: url.clone(),
                api_key: &key,
                timeout: Duration::from_secs(self.settings.timeout_secs),
                headers: &headers,
            };
            match chat::complete(&self.client, call, &body).await {
                Ok(text) => {
                    info!(model = %model, "OpenRouter model succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "OpenRouter model failed");
                    last = Some(e);
                }
            }
        }

        // keep the last status so quota/auth hints still match
        let (status, message) = last.map(|e| (e.status, e.message)).unwrap_or((None, String::new()));
        Err(ProviderError::new(NAME, status, format!("All OpenRouter models failed; last error: {message}")))
    }
}
