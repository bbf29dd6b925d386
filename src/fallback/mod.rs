use std::time::Duration;
use tracing::{info, warn};

use crate::errors::WaveError;
use crate::provider::{DynGenerator, ProviderError};

/// A successful generation and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub provider: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 2, base_delay: Duration::from_millis(1_000) }
    }
}

impl RetryPolicy {
    /// Delay after the zero-based attempt `i`: base, 2*base, 4*base, ...
    pub fn delay_after(&self, i: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << i.min(16))
    }
}

/// Tries providers strictly one after another and returns the first success.
/// Holds no state between calls.
pub struct Orchestrator {
    providers: Vec<DynGenerator>,
}

impl Orchestrator {
    pub fn new(providers: Vec<DynGenerator>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn generate(&self, prompt: &str) -> Result<Generation, WaveError> {
        let mut failures: Vec<ProviderError> = Vec::new();

        for p in &self.providers {
            info!(provider = p.name(), "trying provider");
            match p.generate(prompt).await {
                Ok(text) => {
                    if !failures.is_empty() {
                        info!(provider = p.name(), skipped = failures.len(), "fallback provider succeeded");
                    }
                    return Ok(Generation { provider: p.name().to_string(), text });
                }
                Err(e) => {
                    warn!(provider = p.name(), error = %e, "provider failed");
                    failures.push(e);
                }
            }
        }

        Err(WaveError::AllProvidersFailed(failures))
    }

    /// Re-runs the whole chain up to `policy.attempts` times with a doubling
    /// delay in between. The last error is returned.
    pub async fn generate_with_retry(&self, prompt: &str, policy: RetryPolicy) -> Result<Generation, WaveError> {
        let attempts = policy.attempts.max(1);
        let mut i = 0;
        loop {
            match self.generate(prompt).await {
                Ok(g) => return Ok(g),
                Err(e) if i + 1 >= attempts => return Err(e),
                Err(e) => {
                    let delay = policy.delay_after(i);
                    warn!(attempt = i + 1, attempts, ?delay, error = %e, "generation attempt failed, backing off");
                    tokio::time::sleep(delay).await;
                    i += 1;
                }
            }
        }
    }
}

/// Picks the code chain for website prompts and the text chain for the rest.
pub struct Router {
    pub code: Orchestrator,
    pub text: Orchestrator,
}

impl Router {
    pub fn new(code: Orchestrator, text: Orchestrator) -> Self {
        Self { code, text }
    }

    pub fn for_prompt(&self, prompt: &str) -> &Orchestrator {
        if crate::prompt::is_code_prompt(prompt) { &self.code } else { &self.text }
    }

    pub async fn generate_with_retry(&self, prompt: &str, policy: RetryPolicy) -> Result<Generation, WaveError> {
        self.for_prompt(prompt).generate_with_retry(prompt, policy).await
    }
}
