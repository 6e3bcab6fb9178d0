//! Haven Authority - the server-side transition authority for session state
//!
//! The authority is the only writer of `SessionState`. Given the state a
//! client sent and the user's text it either settles the turn itself (consent
//! questions, mode switches) or hands the unchanged state to a
//! `ReplyGenerator` for ordinary conversation.

pub mod authority;
pub mod generator;
pub mod intent;
pub mod prompt;
pub mod replies;

pub use authority::{Decision, Step, Transition, TransitionAuthority};
pub use generator::{EchoGenerator, LlmReplyGenerator, ReplyGenerator};
pub use intent::{ConsentAnswer, ConsentVocabulary};
