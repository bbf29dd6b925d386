use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Args, ProviderKind};
use crate::errors::WaveError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Tried in order; Gemini and Groq only use the first entry.
    pub models: Vec<String>,
    pub timeout_secs: u64,
    /// Environment variables searched for the API key, first hit wins.
    pub key_env: Vec<String>,
    /// Explicit key, mostly for tests. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            models: Vec::new(),
            timeout_secs: 120,
            key_env: Vec::new(),
            api_key: None,
        }
    }
}

impl ProviderSettings {
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(k) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(k.clone());
        }
        self.key_env
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.trim().is_empty())
    }

    pub fn primary_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: String,
    pub root: String,
    pub out_dir: String,
    pub state_path: String,
    /// Chain for code prompts.
    pub provider_order: Vec<ProviderKind>,
    /// Chain for plain-text prompts.
    pub text_provider_order: Vec<ProviderKind>,
    pub gemini: ProviderSettings,
    pub openrouter: ProviderSettings,
    pub groq: ProviderSettings,
    pub max_credits: u32,
    pub unlock_code: String,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: "2025-10-01".into(),
            root: ".".into(),
            out_dir: "wave-out".into(),
            state_path: ".wave/credits.json".into(),
            provider_order: vec![ProviderKind::Gemini, ProviderKind::OpenRouter, ProviderKind::Groq],
            text_provider_order: vec![ProviderKind::Groq, ProviderKind::OpenRouter, ProviderKind::Gemini],
            gemini: ProviderSettings {
                base_url: "https://generativelanguage.googleapis.com".into(),
                models: vec!["gemini-2.0-flash-exp".into()],
                timeout_secs: 120,
                key_env: vec!["GOOGLE_API_KEY".into(), "VITE_GOOGLE_API_KEY".into()],
                api_key: None,
            },
            openrouter: ProviderSettings {
                base_url: "https://openrouter.ai/api/v1".into(),
                models: vec![
                    "meta-llama/llama-3.1-70b-instruct".into(),
                    "meta-llama/llama-3.1-8b-instruct".into(),
                    "mistralai/mistral-7b-instruct".into(),
                    "microsoft/wizardlm-2-8x22b".into(),
                    "qwen/qwen-2.5-7b-instruct".into(),
                ],
                timeout_secs: 120,
                key_env: vec!["OPENROUTER_API_KEY".into(), "VITE_OPENROUTER_API_KEY".into()],
                api_key: None,
            },
            groq: ProviderSettings {
                base_url: "https://api.groq.com/openai/v1".into(),
                models: vec!["llama-3.1-70b-versatile".into()],
                timeout_secs: 30,
                key_env: vec!["GROQ_API_KEY".into(), "VITE_GROQ_API_KEY".into()],
                api_key: None,
            },
            max_credits: 2,
            unlock_code: "Krish".into(),
            retry_attempts: 2,
            retry_base_delay_ms: 1_000,
        }
    }
}

impl Config {
    /// Defaults, overlaid with the TOML file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, WaveError> {
        let Some(path) = path else { return Ok(Self::default()) };
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| WaveError::Config(format!("{}: {e}", path.display())))
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(out) = &args.out { self.out_dir = out.clone(); }
        if let Some(state) = &args.state { self.state_path = state.clone(); }
        if let Some(n) = args.attempts { self.retry_attempts = n.max(1); }
        if !args.providers.is_empty() {
            self.provider_order = args.providers.clone();
            self.text_provider_order = args.providers.clone();
        }
    }

    pub fn settings(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenRouter => &self.openrouter,
            ProviderKind::Groq => &self.groq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn toml_overlays_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
max_credits = 5
provider_order = ["groq", "gemini"]

[groq]
models = ["llama-3.3-70b-versatile"]
"#
        )
        .unwrap();
        let cfg = Config::load(Some(f.path())).unwrap();
        assert_eq!(cfg.max_credits, 5);
        assert_eq!(cfg.provider_order, vec![ProviderKind::Groq, ProviderKind::Gemini]);
        assert_eq!(cfg.groq.primary_model(), Some("llama-3.3-70b-versatile"));
        // untouched sections keep their defaults
        assert_eq!(cfg.openrouter.models.len(), 5);
        assert_eq!(cfg.unlock_code, "Krish");
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "max_credits = \"many\"").unwrap();
        let err = Config::load(Some(f.path())).unwrap_err();
        assert!(matches!(err, WaveError::Config(_)));
    }

    #[test]
    fn args_override_order_and_attempts() {
        let args = Args::parse_from(["wave_codegen", "--provider", "groq", "--attempts", "0"]);
        let mut cfg = Config::default();
        cfg.apply_args(&args);
        assert_eq!(cfg.provider_order, vec![ProviderKind::Groq]);
        assert_eq!(cfg.retry_attempts, 1);
    }

    #[test]
    fn explicit_key_wins() {
        let s = ProviderSettings {
            api_key: Some("k-123".into()),
            key_env: vec!["WAVE_TEST_UNSET_KEY_VAR".into()],
            ..Default::default()
        };
        assert_eq!(s.resolve_api_key().as_deref(), Some("k-123"));

        let s = ProviderSettings {
            api_key: Some("   ".into()),
            key_env: vec!["WAVE_TEST_UNSET_KEY_VAR".into()],
            ..Default::default()
        };
        assert_eq!(s.resolve_api_key(), None);
    }
}
