use anyhow::Context;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::cli::ProviderKind;
use crate::credits::{CreditStore, PromptCredits};
use crate::errors::WaveError;
use crate::export::{self, ExportSummary};
use crate::extract;
use crate::fallback::{RetryPolicy, Router};
use crate::log::{self, ArtifactLog};
use crate::prompt;
use crate::validate::{self, ValidationReport};
use crate::wire::{ChatMessage, GeneratedSite, Sender, StylePreferences};

const GREETINGS: &[&str] = &["test", "hello", "ping"];

pub struct SessionOptions {
    pub style: StylePreferences,
    pub retry: RetryPolicy,
    pub unlock_code: String,
    /// Key presence per provider, shown in API key hints.
    pub key_status: Vec<(ProviderKind, bool)>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            style: StylePreferences::default(),
            retry: RetryPolicy::default(),
            unlock_code: String::new(),
            key_status: Vec::new(),
        }
    }
}

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Ignored,
    Greeting,
    OutOfCredits,
    Generated { provider: String, edited: bool, fixes: ValidationReport },
    Failed { error: String },
}

/// Owns the transcript, the current site and the credits for one chat.
/// `submit` takes `&mut self`, so two generations can never interleave on the
/// same session.
pub struct ChatSession {
    router: Router,
    options: SessionOptions,
    credits: PromptCredits,
    messages: Vec<ChatMessage>,
    site: Option<GeneratedSite>,
    suggestions: Vec<String>,
    artifacts: Option<ArtifactLog>,
    turns: usize,
}

impl ChatSession {
    pub fn new(router: Router, credits: PromptCredits, options: SessionOptions) -> Self {
        let welcome = ChatMessage::new(
            Sender::Ai,
            "Describe the website you want and I'll build it. Follow up with changes to refine it.",
        );
        Self {
            router,
            options,
            credits,
            messages: vec![welcome],
            site: None,
            suggestions: Vec::new(),
            artifacts: None,
            turns: 0,
        }
    }

    pub fn with_artifacts(mut self, log: ArtifactLog) -> Self {
        self.artifacts = Some(log);
        self
    }

    pub fn messages(&self) -> &[ChatMessage] { &self.messages }
    pub fn site(&self) -> Option<&GeneratedSite> { self.site.as_ref() }
    pub fn suggestions(&self) -> &[String] { &self.suggestions }
    pub fn credits(&self) -> &PromptCredits { &self.credits }
    pub fn style_mut(&mut self) -> &mut StylePreferences { &mut self.options.style }

    pub fn unlock(&mut self, code: &str) -> bool {
        let ok = self.credits.unlock(code, &self.options.unlock_code);
        let text = if ok { "Unlimited credits unlocked." } else { "That unlock code is not valid." };
        self.push(Sender::System, text);
        ok
    }

    fn push(&mut self, sender: Sender, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(sender, text));
    }

    pub async fn submit(&mut self, input: &str) -> Turn {
        let input = input.trim();
        if input.is_empty() {
            return Turn::Ignored;
        }
        self.push(Sender::User, input);

        if GREETINGS.contains(&input.to_lowercase().as_str()) {
            self.push(Sender::Ai, greeting_text());
            return Turn::Greeting;
        }

        if !self.credits.can_generate() {
            self.push(
                Sender::System,
                "You're out of prompt credits for today. They refill tomorrow, or use an unlock code.",
            );
            return Turn::OutOfCredits;
        }

        let edited = matches!(&self.site, Some(s) if !s.is_empty()) && prompt::is_modification_request(input);
        let prompt_text = match (&self.site, edited) {
            (Some(current), true) => prompt::build_edit_prompt(input, current, &self.options.style),
            _ => prompt::build_generation_prompt(input, &self.options.style),
        };

        self.turns += 1;
        match self.run(&prompt_text).await {
            Ok((provider, site, suggestions, fixes)) => {
                // only a successful generation costs a credit
                if let Err(e) = self.credits.try_consume() {
                    warn!(error = %e, "credit consume after success failed");
                }
                self.push(Sender::Ai, success_text(&site, &provider, edited, &fixes));
                let bytes = site.total_bytes();
                self.site = Some(site);
                self.suggestions = suggestions;
                info!(%provider, edited, bytes, credits = %self.credits.label(), "site updated");
                Turn::Generated { provider, edited, fixes }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(%error, "generation failed; keeping previous site");
                self.push(Sender::Ai, error_hint(&error, &self.options.key_status));
                Turn::Failed { error }
            }
        }
    }

    async fn run(&self, prompt_text: &str) -> Result<(String, GeneratedSite, Vec<String>, ValidationReport), WaveError> {
        let generation = self.router.generate_with_retry(prompt_text, self.options.retry).await;
        let stage = format!("turn-{}", self.turns);
        if let Some(artifacts) = &self.artifacts {
            let response = generation.as_ref().ok().map(|g| g.text.as_str());
            match artifacts.save_stage(&stage, prompt_text, response) {
                Ok(saved) => {
                    for line in log::describe_saved(&stage, &saved) {
                        debug!("{line}");
                    }
                }
                Err(e) => warn!(error = %e, "could not save artifacts"),
            }
        }
        let generation = generation?;

        let extraction = extract::extract_site(&generation.text)?;
        let (html, fixes) = validate::validate_with_report(&extraction.site.html);
        let site = GeneratedSite { html, ..extraction.site };
        Ok((generation.provider, site, extraction.suggestions, fixes))
    }

    /// Plain question through the text chain; does not touch the site.
    pub async fn ask(&mut self, question: &str) -> Result<String, WaveError> {
        self.push(Sender::User, question.trim());
        match self.router.text.generate_with_retry(question, self.options.retry).await {
            Ok(g) => {
                self.push(Sender::Ai, g.text.clone());
                Ok(g.text)
            }
            Err(e) => {
                self.push(Sender::Ai, error_hint(&e.to_string(), &self.options.key_status));
                Err(e)
            }
        }
    }

    /// Walkthrough of the current site. Costs no credit and leaves the site
    /// as it is.
    pub async fn explain(&mut self) -> Result<String, WaveError> {
        let prompt_text = match self.site.as_ref().filter(|s| !s.is_empty()) {
            Some(site) => prompt::build_explain_prompt(site),
            None => {
                self.push(Sender::System, "Nothing to explain yet. Generate a website first.");
                return Err(WaveError::NoSite);
            }
        };
        self.push(Sender::User, "Explain the code of this website.");
        match self.router.generate_with_retry(&prompt_text, self.options.retry).await {
            Ok(g) if !g.text.trim().is_empty() => {
                self.push(Sender::Ai, g.text.clone());
                Ok(g.text)
            }
            Ok(g) => {
                self.push(Sender::Ai, "Failed to get explanation.");
                Ok(g.text)
            }
            Err(e) => {
                warn!(error = %e, "explanation failed");
                self.push(Sender::Ai, format!("Failed to get explanation.\n\n{e}"));
                Err(e)
            }
        }
    }

    /// Loads a `.txt` request file. The outcome is reported in the transcript;
    /// nothing is generated yet.
    pub fn load_prompt_file(&mut self, path: &Path) -> Result<String, WaveError> {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        match prompt::read_prompt_file(path) {
            Ok(text) => {
                self.push(Sender::System, format!("File \"{name}\" loaded ({} bytes).", text.len()));
                Ok(text)
            }
            Err(e) => {
                self.push(Sender::System, e.to_string());
                Err(e.into())
            }
        }
    }
}

/// Runs one turn, persists the credits, then exports a freshly generated
/// site. The credit file is written even when the export fails.
pub async fn submit_and_export(
    session: &mut ChatSession,
    store: &CreditStore,
    input: &str,
    out_dir: &Path,
) -> anyhow::Result<(Turn, Option<ExportSummary>)> {
    let turn = session.submit(input).await;
    store.save(session.credits())?;

    let summary = match (&turn, session.site()) {
        (Turn::Generated { .. }, Some(site)) => Some(
            export::export_site(out_dir, site)
                .with_context(|| format!("exporting to {}", out_dir.display()))?,
        ),
        _ => None,
    };
    Ok((turn, summary))
}

fn greeting_text() -> &'static str {
    "System test successful. WaveCodeGen is ready.\n\nTry:\n- \"Create a modern portfolio website\"\n- \"Build a luxury restaurant website\"\n- \"Make a professional business landing page\""
}

fn success_text(site: &GeneratedSite, provider: &str, edited: bool, fixes: &ValidationReport) -> String {
    let verb = if edited { "Updated your website" } else { "Your website is ready" };
    let mut s = format!(
        "{verb} (via {provider}).\n- index.html: {} bytes\n- styles.css: {} bytes\n- script.js: {} bytes",
        site.html.len(),
        site.css.len(),
        site.js.len()
    );
    if fixes.changed() {
        s.push_str(&format!("\n- fixes: {}", fixes.describe().join(", ")));
    }
    s
}

/// User-facing explanation chosen by matching the error text.
pub fn error_hint(message: &str, keys: &[(ProviderKind, bool)]) -> String {
    let mut out = String::from("Website generation failed.\n\n");
    let lower = message.to_lowercase();

    if message.contains("API key") {
        out.push_str("API key issue: one or more API keys are missing or invalid.\n\n");
        out.push_str("Set GOOGLE_API_KEY, OPENROUTER_API_KEY and GROQ_API_KEY in your environment.\n");
        if !keys.is_empty() {
            out.push_str("\nCurrent API key status:\n");
            for (kind, present) in keys {
                out.push_str(&format!("- {}: {}\n", kind, if *present { "present" } else { "missing" }));
            }
        }
    } else if lower.contains("network") || lower.contains("fetch") || message.contains("ENOTFOUND") {
        out.push_str("Network issue: cannot connect to the AI services.\n\n");
        out.push_str("- Check your internet connection\n- Try again in a few moments\n- Verify firewall/proxy settings");
    } else if lower.contains("quota") || lower.contains("limit") || message.contains("429") {
        out.push_str("API quota exceeded: a rate or usage limit was reached.\n\n");
        out.push_str("- Wait a few minutes and try again\n- Check your API usage limits\n- Try a different prompt");
    } else if message.contains("All code generation strategies failed") {
        out.push_str("All AI services failed: none of the providers could generate your website.\n\n");
        out.push_str("- Run with --debug for per-provider errors\n- Try a simpler prompt like \"Create a simple landing page\"");
    } else {
        out.push_str(&format!("Technical error: {message}\n\n"));
        out.push_str("- Run with --debug for detailed logs\n- Try a different prompt");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_are_string_matched() {
        let keys = vec![(ProviderKind::Gemini, false), (ProviderKind::Groq, true)];
        let h = error_hint("Gemini: Gemini API key is missing.", &keys);
        assert!(h.contains("API key issue"));
        assert!(h.contains("- Gemini: missing"));
        assert!(h.contains("- Groq: present"));

        assert!(error_hint("Groq: network error: dns", &[]).contains("Network issue"));
        assert!(error_hint("Groq (HTTP 429): slow down", &[]).contains("quota"));
        assert!(error_hint("All code generation strategies failed:\nno providers configured", &[])
            .contains("All AI services failed"));
        assert!(error_hint("extraction failed: the model returned an empty response", &[])
            .contains("Technical error"));
    }
}
