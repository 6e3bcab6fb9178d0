//! OpenAI-compatible chat completions provider with SSE streaming

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::sse::{self, SseFrame};
use crate::types::{LlmRequest, StreamDelta};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_API_URL.to_string(),
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
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str { "openai" }

    fn models(&self) -> &[&str] {
        &["gpt-", "o1", "o3", "o4"]
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(OpenAiMessage { role: "system".into(), content: system.clone() });
        }
        messages.extend(request.messages.iter().map(|m| OpenAiMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        }));

        let body = OpenAiRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: true,
        };

        debug!("OpenAI request: model={} messages={}", body.model, body.messages.len());

        let response = self.client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI error {}: {}", status, error_text);

            return Err(match status.as_u16() {
                401 => LlmError::AuthFailed(error_text),
                429 => LlmError::RateLimited { retry_after_ms: 60000 },
                _ => LlmError::RequestFailed(format!("{}: {}", status, error_text)),
            });
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
        let mut finish_reason: Option<String> = None;

        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(f) => f,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            match parse_chunk(&frame) {
                Some(ChunkEvent::Text { text, finish }) => {
                    if finish.is_some() {
                        finish_reason = finish;
                    }
                    if !text.is_empty() {
                        yield Ok(StreamDelta::Text(text));
                    }
                }
                Some(ChunkEvent::Done) => {
                    yield Ok(StreamDelta::Done { stop_reason: finish_reason.take(), usage: None });
                    return;
                }
                Some(ChunkEvent::Error(message)) => {
                    yield Err(LlmError::StreamError(message));
                    return;
                }
                None => {}
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum ChunkEvent {
    Text { text: String, finish: Option<String> },
    Done,
    Error(String),
}

pub(crate) fn parse_chunk(frame: &SseFrame) -> Option<ChunkEvent> {
    if frame.data.trim() == "[DONE]" {
        return Some(ChunkEvent::Done);
    }
    let chunk = serde_json::from_str::<StreamChunk>(&frame.data).ok()?;
    if let Some(err) = chunk.error {
        return Some(ChunkEvent::Error(err.message));
    }
    let choice = chunk.choices.into_iter().next()?;
    Some(ChunkEvent::Text {
        text: choice.delta.content.unwrap_or_default(),
        finish: choice.finish_reason,
    })
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}
