use thiserror::Error;

use crate::extract::ExtractionFailure;
use crate::prompt::PromptFileError;
use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum WaveError {
    #[error(transparent)] Provider(#[from] ProviderError),
    #[error("All code generation strategies failed:\n{}", join_failures(.0))] AllProvidersFailed(Vec<ProviderError>),
    #[error("extraction failed: {0}")] Extraction(#[from] ExtractionFailure),
    #[error("no prompt credits left for today")] CreditsExhausted,
    #[error("no website has been generated yet")] NoSite,
    #[error(transparent)] PromptFile(#[from] PromptFileError),
    #[error("config error: {0}")] Config(String),
    #[error("io error: {0}")] Io(#[from] std::io::Error),
}

fn join_failures(errors: &[ProviderError]) -> String {
    if errors.is_empty() {
        return "no providers configured".to_string();
    }
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_lists_every_provider() {
        let err = WaveError::AllProvidersFailed(vec![
            ProviderError::new("Gemini", Some(401), "bad key"),
            ProviderError::new("Groq", None, "timed out"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("All code generation strategies failed:"));
        assert!(msg.contains("Gemini"));
        assert!(msg.contains("bad key"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn empty_aggregate_is_explicit() {
        let err = WaveError::AllProvidersFailed(vec![]);
        assert!(err.to_string().contains("no providers configured"));
    }
}
