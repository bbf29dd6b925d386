use async_trait::async_trait;
use std::fmt;

use crate::cli::ProviderKind;
use crate::config::Config;

pub mod chat;
pub mod gemini;
pub mod groq;
pub mod openrouter;

/// A failed call to one provider. `status` is the HTTP status when the
/// request reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub provider: String,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self { provider: provider.into(), status, message: message.into() }
    }

    pub fn missing_key(provider: &str, env: &[String]) -> Self {
        let hint = env.first().map(String::as_str).unwrap_or("the provider key");
        Self::new(provider, None, format!("{provider} API key is missing. Set {hint} in your environment."))
    }

    pub fn from_reqwest(provider: &str, e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        let message = if e.is_timeout() {
            format!("request timed out (network): {e}")
        } else {
            format!("network error: {e}")
        };
        Self::new(provider, status, message)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.provider, code, self.message),
            None => write!(f, "{}: {}", self.provider, self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// One text-generation backend. Implementations make a single attempt per
/// call; retrying is the caller's business.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub type DynGenerator = Box<dyn TextGenerator + Send + Sync>;

pub fn make_provider(kind: ProviderKind, cfg: &Config) -> DynGenerator {
    let settings = cfg.settings(kind).clone();
    match kind {
        ProviderKind::Gemini => Box::new(gemini::Gemini::new(settings)),
        ProviderKind::OpenRouter => Box::new(openrouter::OpenRouter::new(settings)),
        ProviderKind::Groq => Box::new(groq::Groq::new(settings)),
    }
}

pub fn make_providers(order: &[ProviderKind], cfg: &Config) -> Vec<DynGenerator> {
    order.iter().map(|k| make_provider(*k, cfg)).collect()
}

/// Which providers have a usable key, in config order.
pub fn key_status(cfg: &Config) -> Vec<(ProviderKind, bool)> {
    [ProviderKind::Gemini, ProviderKind::OpenRouter, ProviderKind::Groq]
        .into_iter()
        .map(|k| (k, cfg.settings(k).resolve_api_key().is_some()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_when_known() {
        let e = ProviderError::new("Groq", Some(429), "rate limit reached");
        assert_eq!(e.to_string(), "Groq (HTTP 429): rate limit reached");
        let e = ProviderError::new("Groq", None, "boom");
        assert_eq!(e.to_string(), "Groq: boom");
    }

    #[test]
    fn missing_key_mentions_api_key() {
        let e = ProviderError::missing_key("OpenRouter", &["OPENROUTER_API_KEY".to_string()]);
        assert!(e.message.contains("API key"));
        assert!(e.message.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn builds_chain_in_order() {
        let cfg = Config::default();
        let chain = make_providers(&[ProviderKind::Groq, ProviderKind::Gemini], &cfg);
        let names: Vec<_> = chain.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["Groq", "Gemini"]);
    }
}
