//! Tests for haven-llm: types, provider trait and stream folding

use futures::stream;
use haven_llm::*;

// ===========================================================================
// LlmRequest / LlmMessage
// ===========================================================================

#[test]
fn llm_request_default() {
    let req = LlmRequest::default();
    assert_eq!(req.model, "gpt-4o");
    assert!(req.messages.is_empty());
    assert_eq!(req.max_tokens, Some(400));
    assert!(req.temperature.is_none());
    assert!(req.system.is_none());
}

#[test]
fn llm_request_skips_empty_optionals() {
    let req = LlmRequest {
        max_tokens: None,
        ..LlmRequest::default()
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(!json.contains("max_tokens"));
    assert!(!json.contains("temperature"));
    assert!(!json.contains("system"));
}

#[test]
fn llm_message_constructors() {
    assert_eq!(LlmMessage::user("hi").role, "user");
    assert_eq!(LlmMessage::assistant("yo").role, "assistant");
    let json = serde_json::to_value(LlmMessage::user("hi")).unwrap();
    assert_eq!(json, serde_json::json!({ "role": "user", "content": "hi" }));
}

#[test]
fn usage_tolerates_partial_payload() {
    let u: Usage = serde_json::from_str(r#"{"output_tokens": 12}"#).unwrap();
    assert_eq!(u.input_tokens, 0);
    assert_eq!(u.output_tokens, 12);
}

// ===========================================================================
// LlmError
// ===========================================================================

#[test]
fn llm_error_display() {
    assert_eq!(
        LlmError::RequestFailed("500".into()).to_string(),
        "request failed: 500"
    );
    assert_eq!(
        LlmError::RateLimited { retry_after_ms: 60000 }.to_string(),
        "rate limited: retry after 60000ms"
    );
}

// ===========================================================================
// collect_text
// ===========================================================================

fn boxed(items: Vec<LlmResult<StreamDelta>>) -> LlmStream {
    Box::pin(stream::iter(items))
}

#[tokio::test]
async fn collect_text_concatenates_deltas() {
    let s = boxed(vec![
        Ok(StreamDelta::Text("Hello".into())),
        Ok(StreamDelta::Text(", friend".into())),
        Ok(StreamDelta::Done { stop_reason: Some("end_turn".into()), usage: None }),
    ]);
    assert_eq!(collect_text(s).await.unwrap(), "Hello, friend");
}

#[tokio::test]
async fn collect_text_stops_at_done() {
    let s = boxed(vec![
        Ok(StreamDelta::Text("a".into())),
        Ok(StreamDelta::Done { stop_reason: None, usage: None }),
        Ok(StreamDelta::Text("ignored".into())),
    ]);
    assert_eq!(collect_text(s).await.unwrap(), "a");
}

#[tokio::test]
async fn collect_text_without_done_returns_what_arrived() {
    let s = boxed(vec![Ok(StreamDelta::Text("partial".into()))]);
    assert_eq!(collect_text(s).await.unwrap(), "partial");
}

#[tokio::test]
async fn collect_text_propagates_stream_error() {
    let s = boxed(vec![
        Ok(StreamDelta::Text("a".into())),
        Err(LlmError::StreamError("connection reset".into())),
    ]);
    let err = collect_text(s).await.unwrap_err();
    assert!(matches!(err, LlmError::StreamError(m) if m == "connection reset"));
}

#[tokio::test]
async fn collect_text_inband_error() {
    let s = boxed(vec![Ok(StreamDelta::Error("overloaded".into()))]);
    assert!(collect_text(s).await.is_err());
}

// ===========================================================================
// Provider trait
// ===========================================================================

struct Fixed;

#[async_trait::async_trait]
impl LlmProvider for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    fn models(&self) -> &[&str] {
        &["fixed-1"]
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(boxed(vec![
            Ok(StreamDelta::Text(format!("echo: {}", last))),
            Ok(StreamDelta::Done { stop_reason: None, usage: None }),
        ]))
    }
}

#[test]
fn supports_model_prefix() {
    let p = Fixed;
    assert!(p.supports_model("fixed-1"));
    assert!(p.supports_model("fixed-1-2025"));
    assert!(!p.supports_model("other"));
}

#[tokio::test]
async fn provider_stream_collects() {
    let p = Fixed;
    let req = LlmRequest {
        model: "fixed-1".into(),
        messages: vec![LlmMessage::user("ping")],
        ..LlmRequest::default()
    };
    let text = collect_text(p.complete_stream(req).await.unwrap()).await.unwrap();
    assert_eq!(text, "echo: ping");
}

#[test]
fn real_providers_report_names() {
    assert_eq!(AnthropicProvider::new("k").name(), "anthropic");
    assert_eq!(OpenAiProvider::new("k").name(), "openai");
}
