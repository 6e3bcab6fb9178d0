//! Client error types

use haven_core::ConsentKind;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("answer the pending {0} question first")]
    ConsentPending(ConsentKind),

    #[error("no consent question is pending")]
    NoPendingConsent,

    #[error("message is empty")]
    EmptyMessage,

    #[error("could not reach server: {0}")]
    Transport(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Failures of the exchange itself, as opposed to requests refused
    /// locally before anything was sent. All of them are recovered the same
    /// way.
    pub fn is_exchange_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::InvalidResponse(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
