//! Session sync protocol: one stateless JSON exchange per turn
//!
//! Wire format:
//!
//! Client → Server (`POST /chat`):
//!   { "text": "switch to romantic mode",
//!     "session_state": { "mode": "friend", ... },
//!     "history": [ { "role": "user", "content": "hi" }, ... ] }
//!
//! Server → Client (200):
//!   { "reply": "...", "session_state": { "mode": "friend", "pending_consent": "romance", ... } }
//!
//! Server → Client (non-200):
//!   { "error": "reply generation failed: openai - 500: ..." }
//!
//! The returned `session_state` always supersedes whatever the client sent.

use crate::session::SessionState;
use crate::types::Message;
use serde::{Deserialize, Serialize};

/// One turn proposed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub text: String,
    #[serde(default)]
    pub session_state: SessionState,
    #[serde(default)]
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn new(text: impl Into<String>, session_state: SessionState, history: Vec<Message>) -> Self {
        Self {
            text: text.into(),
            session_state,
            history,
        }
    }
}

/// Authoritative outcome of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_state: SessionState,
}

/// Body of every non-success response. Clients must not branch on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health probe payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}
