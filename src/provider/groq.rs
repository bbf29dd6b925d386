use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::chat::{self, ChatCall, ChatRequest};
use super::{ProviderError, TextGenerator};
use crate::config::ProviderSettings;

const NAME: &str = "Groq";

/// Groq's OpenAI-compatible endpoint. Fast, short outputs; last in the code
/// chain and first in the text chain.
pub struct Groq {
    settings: ProviderSettings,
    client: Client,
}

impl Groq {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings, client: Client::new() }
    }
}

#[async_trait]
impl TextGenerator for Groq {
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

        let body = ChatRequest::single_user(model, prompt, 0.7, 2048);
        let call = ChatCall {
            provider: NAME,
            url: format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/')),
            api_key: &key,
            timeout: Duration::from_secs(self.settings.timeout_secs),
            headers: &[],
        };
        chat::complete(&self.client, call, &body).await
    }
}
