//! Reply generation: the opaque capability the authority delegates
//! ordinary conversation to

use crate::prompt;
use haven_core::{ConversationConfig, Error, LlmConfig, Message, Result, Role, SessionState};
use haven_llm::{collect_text, LlmMessage, LlmProvider, LlmRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// Substituted when a provider completes with no text.
pub const FALLBACK_REPLY: &str = "I'm here. What would you like to talk about?";

/// Produce assistant text for a state and a conversation whose last entry is
/// the user's current message.
#[async_trait::async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, state: &SessionState, history: &[Message]) -> Result<String>;
}

/// Generator backed by one or more streaming LLM providers, chosen per turn
/// by the session's `model`.
pub struct LlmReplyGenerator {
    providers: Vec<Arc<dyn LlmProvider>>,
    llm: LlmConfig,
    conversation: ConversationConfig,
}

impl LlmReplyGenerator {
    pub fn new(llm: LlmConfig, conversation: ConversationConfig) -> Self {
        Self {
            providers: Vec::new(),
            llm,
            conversation,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Model for a state: its own when set, else the configured default.
    pub fn model_for<'a>(&'a self, state: &'a SessionState) -> &'a str {
        state
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.llm.default_model)
    }

    pub fn provider_for(&self, model: &str) -> Option<&Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.supports_model(model))
    }

    /// Build the provider request: system prompt, the current message plus
    /// the `history_window` messages before it, trimmed further when over the
    /// character budget.
    pub fn build_request(&self, state: &SessionState, history: &[Message]) -> LlmRequest {
        let system = prompt::build_system_prompt(state);

        let turns: Vec<&Message> = history.iter().filter(|m| m.role != Role::System).collect();
        let start = turns
            .len()
            .saturating_sub(self.conversation.history_window + 1);
        let mut messages: Vec<LlmMessage> = turns[start..]
            .iter()
            .map(|m| LlmMessage::new(m.role.as_str(), m.content.clone()))
            .collect();

        let total_chars: usize =
            system.len() + messages.iter().map(|m| m.content.len()).sum::<usize>();
        if total_chars > self.conversation.max_context_chars && messages.len() > 3 {
            debug!("Context over budget ({} chars), keeping newest 3 messages", total_chars);
            messages.drain(..messages.len() - 3);
        }

        // providers expect the conversation to open with a user turn
        while messages
            .first()
            .is_some_and(|m| m.role == Role::Assistant.as_str())
        {
            messages.remove(0);
        }

        LlmRequest {
            model: self.model_for(state).to_string(),
            messages,
            max_tokens: Some(self.llm.max_tokens),
            temperature: Some(self.llm.temperature),
            system: Some(system),
        }
    }
}

#[async_trait::async_trait]
impl ReplyGenerator for LlmReplyGenerator {
    async fn generate(&self, state: &SessionState, history: &[Message]) -> Result<String> {
        let request = self.build_request(state, history);
        let provider = self
            .provider_for(&request.model)
            .ok_or_else(|| Error::UnsupportedModel(request.model.clone()))?;

        debug!(
            "Reply via {}: model={} messages={}",
            provider.name(),
            request.model,
            request.messages.len()
        );

        let stream = provider
            .complete_stream(request)
            .await
            .map_err(|e| Error::generation(provider.name(), e.to_string()))?;
        let text = collect_text(stream)
            .await
            .map_err(|e| Error::generation(provider.name(), e.to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            warn!("{} returned an empty completion", provider.name());
            return Ok(FALLBACK_REPLY.to_string());
        }
        Ok(text.to_string())
    }
}

/// Offline generator that echoes the user's last message. Lets the server run
/// without provider credentials.
#[derive(Debug, Default, Clone)]
pub struct EchoGenerator;

#[async_trait::async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(&self, state: &SessionState, history: &[Message]) -> Result<String> {
        let last = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("[{}] {}", state.mode, last))
    }
}
