//! Transports carrying one chat exchange to the server

use crate::error::{ClientError, ClientResult};
use haven_core::{ChatRequest, ChatResponse, ErrorBody};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn exchange(&self, request: &ChatRequest) -> ClientResult<ChatResponse>;
}

/// JSON over HTTP: `POST {base_url}/chat`.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat", base_url.as_ref().trim_end_matches('/')),
        }
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

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn exchange(&self, request: &ChatRequest) -> ClientResult<ChatResponse> {
        debug!("POST {} ({} history)", self.endpoint, request.history.len());
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ChatResponse>().await?)
    }
}
