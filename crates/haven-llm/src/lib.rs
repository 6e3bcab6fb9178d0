//! Haven LLM - Streaming provider adapters for reply generation

pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use provider::{collect_text, LlmError, LlmProvider, LlmResult, LlmStream};
pub use types::*;
