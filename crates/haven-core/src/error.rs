//! Error types for Haven

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("reply generation failed: {provider} - {message}")]
    Generation { provider: String, message: String },

    #[error("no provider supports model: {0}")]
    UnsupportedModel(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    pub fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for failures of the reply-generation capability (surfaced as 502).
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::UnsupportedModel(_))
    }
}
