//! Client-side session reconciler
//!
//! Holds the last authoritative state from the server and, while a mode
//! request is in flight, a speculative copy with the requested mode applied.
//! A response replaces the authoritative state wholesale and drops the
//! speculative one; a failed exchange only drops the speculative one.

use crate::error::{ClientError, ClientResult};
use crate::transport::ChatTransport;
use haven_core::{ChatRequest, ChatResponse, ConsentKind, Message, Mode, SessionState};
use tracing::{debug, info, warn};

/// A history entry as shown to the user. Synthetic entries are produced
/// locally (error notices) and are never sent to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayedMessage {
    pub message: Message,
    pub synthetic: bool,
}

impl DisplayedMessage {
    fn real(message: Message) -> Self {
        Self {
            message,
            synthetic: false,
        }
    }

    fn synthetic(content: String) -> Self {
        Self {
            message: Message::assistant(content),
            synthetic: true,
        }
    }
}

pub struct Reconciler<T: ChatTransport> {
    transport: T,
    authoritative: SessionState,
    speculative: Option<SessionState>,
    history: Vec<DisplayedMessage>,
}

impl<T: ChatTransport> Reconciler<T> {
    pub fn new(transport: T) -> Self {
        Self::with_state(transport, SessionState::new())
    }

    /// Resume from a previously stored authoritative state.
    pub fn with_state(transport: T, state: SessionState) -> Self {
        Self {
            transport,
            authoritative: state,
            speculative: None,
            history: Vec::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn authoritative_state(&self) -> &SessionState {
        &self.authoritative
    }

    pub fn speculative_state(&self) -> Option<&SessionState> {
        self.speculative.as_ref()
    }

    /// What the UI should show: the speculative state while one exists.
    pub fn displayed_state(&self) -> &SessionState {
        self.speculative.as_ref().unwrap_or(&self.authoritative)
    }

    pub fn pending_consent(&self) -> Option<ConsentKind> {
        self.authoritative.pending_consent
    }

    pub fn history(&self) -> &[DisplayedMessage] {
        &self.history
    }

    /// History as sent to the server: synthetic entries left out.
    pub fn wire_history(&self) -> Vec<Message> {
        self.history
            .iter()
            .filter(|m| !m.synthetic)
            .map(|m| m.message.clone())
            .collect()
    }

    /// Change the model used for future replies. Takes effect on the next
    /// exchange; the server carries it through untouched.
    pub fn set_model(&mut self, model: Option<String>) {
        self.authoritative.model = model;
    }

    pub fn set_companion(&mut self, companion: Option<String>) {
        self.authoritative.companion = companion;
    }

    /// Ask the server for a mode change, showing it optimistically until the
    /// server answers. Refused locally while a consent question is open.
    pub async fn request_mode(&mut self, mode: Mode) -> ClientResult<String> {
        let request = self.begin_mode_request(mode)?;
        let result = self.transport.exchange(&request).await;
        self.complete(result)
    }

    /// Send an ordinary message. Also the path for free-text consent answers.
    pub async fn send(&mut self, text: &str) -> ClientResult<String> {
        let request = self.begin_send(text)?;
        let result = self.transport.exchange(&request).await;
        self.complete(result)
    }

    pub async fn answer_consent(&mut self, accept: bool) -> ClientResult<String> {
        let request = self.begin_answer(accept)?;
        let result = self.transport.exchange(&request).await;
        self.complete(result)
    }

    /// First half of a mode request: apply the mode speculatively and build
    /// the request to send. Until [`complete`](Self::complete) is called,
    /// `displayed_state` shows the requested mode.
    pub fn begin_mode_request(&mut self, mode: Mode) -> ClientResult<ChatRequest> {
        if let Some(kind) = self.authoritative.pending_consent {
            return Err(ClientError::ConsentPending(kind));
        }

        let mut speculative = self.authoritative.clone();
        speculative.mode = mode;
        self.speculative = Some(speculative);
        debug!("Speculative mode {}", mode);

        Ok(self.begin(mode.request_hint()))
    }

    pub fn begin_send(&mut self, text: &str) -> ClientResult<ChatRequest> {
        if text.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        Ok(self.begin(text.to_string()))
    }

    pub fn begin_answer(&mut self, accept: bool) -> ClientResult<ChatRequest> {
        if self.authoritative.pending_consent.is_none() {
            return Err(ClientError::NoPendingConsent);
        }
        Ok(self.begin(if accept { "yes" } else { "no" }.to_string()))
    }

    fn begin(&mut self, text: String) -> ChatRequest {
        // the state sent is always the authoritative one
        let request = ChatRequest::new(
            text.clone(),
            self.authoritative.clone(),
            self.wire_history(),
        );
        self.history
            .push(DisplayedMessage::real(Message::user(text)));
        request
    }

    /// Second half of an exchange: a response replaces the authoritative
    /// state wholesale; a failure leaves it alone and appends a notice. The
    /// speculative state is dropped either way.
    pub fn complete(&mut self, result: ClientResult<ChatResponse>) -> ClientResult<String> {
        self.speculative = None;
        match result {
            Ok(response) => {
                if response.session_state != self.authoritative {
                    info!(
                        "Session state updated: mode={} pending={:?}",
                        response.session_state.mode, response.session_state.pending_consent
                    );
                }
                self.authoritative = response.session_state;
                self.history
                    .push(DisplayedMessage::real(Message::assistant(response.reply.clone())));
                Ok(response.reply)
            }
            Err(e) => {
                warn!("Exchange failed: {}", e);
                self.history
                    .push(DisplayedMessage::synthetic(format!("Error: {}", e)));
                Err(e)
            }
        }
    }
}
