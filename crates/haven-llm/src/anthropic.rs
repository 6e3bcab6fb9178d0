//! Anthropic Claude API provider with SSE streaming

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::sse::{self, SseFrame};
use crate::types::{LlmRequest, StreamDelta, Usage};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("HTTP client with {:?} timeout unavailable, using defaults: {}", timeout, e);
                Client::new()
            });
        self
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str { "anthropic" }

    fn models(&self) -> &[&str] {
        &["claude-"]
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let body = AnthropicRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(|m| AnthropicMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            }).collect(),
            max_tokens: request.max_tokens.unwrap_or(1024),
            temperature: request.temperature,
            stream: true,
            system: request.system.clone(),
        };

        debug!("Anthropic request: model={} messages={}", body.model, body.messages.len());

        let response = self.client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Anthropic error {}: {}", status, error_text);

            if status.as_u16() == 401 {
                return Err(LlmError::AuthFailed(error_text));
            } else if status.as_u16() == 429 {
                return Err(LlmError::RateLimited { retry_after_ms: 60000 });
            } else {
                return Err(LlmError::RequestFailed(format!("{}: {}", status, error_text)));
            }
        }

        let stream = parse_sse_stream(response.bytes_stream());
        Ok(Box::pin(stream))
    }
}

fn parse_sse_stream(
    bytes_stream: impl futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> impl futures::Stream<Item = LlmResult<StreamDelta>> + Send {
    async_stream::stream! {
        let frames = sse::frames(bytes_stream);
        tokio::pin!(frames);
        let mut stop_reason: Option<String> = None;
        let mut usage: Option<Usage> = None;

        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(f) => f,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            match parse_event(&frame) {
                Some(AnthropicEvent::Text(text)) => yield Ok(StreamDelta::Text(text)),
                Some(AnthropicEvent::MessageDelta { stop_reason: sr, usage: u }) => {
                    if let Some(sr) = sr {
                        debug!("Message complete: stop_reason={}", sr);
                        stop_reason = Some(sr);
                    }
                    usage = u.or(usage.take());
                }
                Some(AnthropicEvent::Stop) => {
                    yield Ok(StreamDelta::Done {
                        stop_reason: stop_reason.take(),
                        usage: usage.take(),
                    });
                    return;
                }
                Some(AnthropicEvent::Error(message)) => {
                    yield Err(LlmError::StreamError(message));
                    return;
                }
                None => {}
            }
        }
    }
}

/// Events of interest in the Anthropic stream; everything else is ignored.
#[derive(Debug, PartialEq)]
pub(crate) enum AnthropicEvent {
    Text(String),
    MessageDelta { stop_reason: Option<String>, usage: Option<Usage> },
    Stop,
    Error(String),
}

pub(crate) fn parse_event(frame: &SseFrame) -> Option<AnthropicEvent> {
    match frame.event.as_deref()? {
        "content_block_delta" => {
            let data = serde_json::from_str::<ContentBlockDelta>(&frame.data).ok()?;
            match data.delta {
                DeltaType::TextDelta { text } => Some(AnthropicEvent::Text(text)),
                DeltaType::Other => None,
            }
        }
        "message_delta" => {
            let data = serde_json::from_str::<MessageDelta>(&frame.data).ok()?;
            Some(AnthropicEvent::MessageDelta {
                stop_reason: data.delta.stop_reason,
                usage: data.usage,
            })
        }
        "message_stop" => Some(AnthropicEvent::Stop),
        "error" => {
            let message = serde_json::from_str::<ErrorEvent>(&frame.data)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| frame.data.clone());
            Some(AnthropicEvent::Error(message))
        }
        _ => None,
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ContentBlockDelta {
    #[allow(dead_code)]
    index: u32,
    delta: DeltaType,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum DeltaType {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct MessageDelta {
    delta: MessageDeltaContent,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct MessageDeltaContent {
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEvent {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[allow(dead_code)]
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
