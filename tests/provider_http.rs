use serde_json::json;
use wave_codegen::cli::ProviderKind;
use wave_codegen::config::{Config, ProviderSettings};
use wave_codegen::errors::WaveError;
use wave_codegen::fallback::Orchestrator;
use wave_codegen::provider::gemini::Gemini;
use wave_codegen::provider::groq::Groq;
use wave_codegen::provider::openrouter::OpenRouter;
use wave_codegen::provider::{make_providers, TextGenerator};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(base_url: String, models: &[&str]) -> ProviderSettings {
    ProviderSettings {
        base_url,
        models: models.iter().map(|m| m.to_string()).collect(),
        timeout_secs: 5,
        key_env: vec![],
        api_key: Some("test-key".into()),
    }
}

fn chat_ok(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

fn gemini_ok(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

#[tokio::test]
async fn groq_posts_single_user_message_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama-test",
            "messages": [{ "role": "user", "content": "build a site" }],
            "max_tokens": 2048
        })))
        .respond_with(chat_ok("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let groq = Groq::new(settings(format!("{}/openai/v1", server.uri()), &["llama-test"]));
    let out = groq.generate("build a site").await.unwrap();
    assert_eq!(out, "<html></html>");
}

#[tokio::test]
async fn http_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached for model", "type": "tokens" }
        })))
        .mount(&server)
        .await;

    let groq = Groq::new(settings(server.uri(), &["llama-test"]));
    let err = groq.generate("p").await.unwrap_err();
    assert_eq!(err.provider, "Groq");
    assert_eq!(err.status, Some(429));
    assert_eq!(err.message, "Rate limit reached for model");
}

#[tokio::test]
async fn missing_key_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(chat_ok("never"))
        .expect(0)
        .mount(&server)
        .await;

    let mut s = settings(server.uri(), &["m"]);
    s.api_key = None;
    s.key_env = vec!["WAVE_CODEGEN_TEST_NO_SUCH_VAR".into()];
    let err = Groq::new(s).generate("p").await.unwrap_err();
    assert!(err.message.contains("API key is missing"));
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn openrouter_walks_its_model_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "first/model" })))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("x-title", "WaveCodeGen"))
        .and(body_partial_json(json!({ "model": "second/model" })))
        .respond_with(chat_ok("from second"))
        .expect(1)
        .mount(&server)
        .await;

    let or = OpenRouter::new(settings(format!("{}/api/v1", server.uri()), &["first/model", "second/model"]));
    assert_eq!(or.generate("p").await.unwrap(), "from second");
}

#[tokio::test]
async fn openrouter_reports_last_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "No auth credentials found" } })))
        .expect(2)
        .mount(&server)
        .await;

    let or = OpenRouter::new(settings(server.uri(), &["a", "b"]));
    let err = or.generate("p").await.unwrap_err();
    assert_eq!(err.status, Some(401));
    assert!(err.message.contains("All OpenRouter models failed"));
    assert!(err.message.contains("No auth credentials found"));
}

#[tokio::test]
async fn gemini_joins_candidate_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({ "generationConfig": { "maxOutputTokens": 8192, "topK": 40 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "<!DOCTYPE html>" }, { "text": "<html></html>" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let g = Gemini::new(settings(server.uri(), &["gemini-test"]));
    assert_eq!(g.generate("p").await.unwrap(), "<!DOCTYPE html><html></html>");
}

#[tokio::test]
async fn gemini_invalid_key_is_rewritten() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{ "reason": "API_KEY_INVALID" }]
            }
        })))
        .mount(&server)
        .await;

    let err = Gemini::new(settings(server.uri(), &["gemini-test"])).generate("p").await.unwrap_err();
    assert_eq!(err.status, Some(400));
    assert!(err.message.starts_with("Invalid Google API key"));
}

#[tokio::test]
async fn chain_falls_back_across_real_clients() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/openrouter/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/groq/chat/completions"))
        .respond_with(chat_ok("```html\n<html></html>\n```"))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = Config::default();
    cfg.gemini = settings(format!("{}/gemini", server.uri()), &["gemini-test"]);
    cfg.openrouter = settings(format!("{}/openrouter", server.uri()), &["only/model"]);
    cfg.groq = settings(format!("{}/groq", server.uri()), &["llama-test"]);

    let orch = Orchestrator::new(make_providers(
        &[ProviderKind::Gemini, ProviderKind::OpenRouter, ProviderKind::Groq],
        &cfg,
    ));
    let g = orch.generate("build a website").await.unwrap();
    assert_eq!(g.provider, "Groq");
    assert!(g.text.contains("<html></html>"));
}

#[tokio::test]
async fn chain_aggregates_every_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": { "message": "upstream exploded" } })))
        .mount(&server)
        .await;

    let mut cfg = Config::default();
    cfg.gemini = settings(server.uri(), &["gemini-test"]);
    cfg.openrouter = settings(server.uri(), &["only/model"]);
    cfg.groq = settings(server.uri(), &["llama-test"]);

    let orch = Orchestrator::new(make_providers(&cfg.provider_order, &cfg));
    let err = orch.generate("p").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("All code generation strategies failed:"));
    assert!(msg.contains("Gemini (HTTP 500)"));
    assert!(msg.contains("OpenRouter (HTTP 500)"));
    assert!(msg.contains("Groq (HTTP 500)"));
    assert!(matches!(err, WaveError::AllProvidersFailed(ref v) if v.len() == 3));
}

#[tokio::test]
async fn gemini_blocked_prompt_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = Gemini::new(settings(server.uri(), &["m"])).generate("p").await.unwrap_err();
    assert_eq!(err.status, None);
    assert!(err.message.contains("safety filters"));
}

#[tokio::test]
async fn text_chain_starts_with_groq() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groq/chat/completions"))
        .respond_with(chat_ok("Sure, a landing page needs a hero."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gemini/v1beta/models/gemini-test:generateContent"))
        .respond_with(gemini_ok("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = Config::default();
    cfg.gemini = settings(format!("{}/gemini", server.uri()), &["gemini-test"]);
    cfg.openrouter = settings(format!("{}/openrouter", server.uri()), &["only/model"]);
    cfg.groq = settings(format!("{}/groq", server.uri()), &["llama-test"]);

    let orch = Orchestrator::new(make_providers(&cfg.text_provider_order, &cfg));
    let g = orch.generate("what makes a good landing page?").await.unwrap();
    assert_eq!(g.provider, "Groq");
}
