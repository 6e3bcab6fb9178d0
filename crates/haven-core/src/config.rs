//! Haven configuration: serde structs for haven.toml
//!
//! Every section and field has a default, so a partial file (or none at all)
//! yields a working config. Secrets are never read from the file; provider
//! keys come from the environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HavenConfig {
    pub gateway: GatewayConfig,
    pub llm: LlmConfig,
    pub conversation: ConversationConfig,
    pub consent: ConsentConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    pub bind: BindMode,
    /// Allowed CORS origins; `["*"]` allows any.
    pub cors_allow_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 18790,
            bind: BindMode::default(),
            cors_allow_origins: vec!["*".to_string()],
        }
    }
}

/// Bind mode for the gateway
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    Loopback,
    #[default]
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "loopback" | "localhost" | "127.0.0.1" => BindMode::Loopback,
            _ => BindMode::Lan,
        }
    }
}

/// Reply-generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Used when a session carries no `model`.
    pub default_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub anthropic_base_url: Option<String>,
    pub openai_base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o".to_string(),
            max_tokens: 400,
            temperature: 0.8,
            request_timeout_secs: 60,
            anthropic_base_url: None,
            openai_base_url: None,
        }
    }
}

/// How much history reaches the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Most recent messages kept from the client-supplied history.
    pub history_window: usize,
    /// Above this many characters only the system prompt and the newest
    /// three messages are sent.
    pub max_context_chars: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            max_context_chars: 20_000,
        }
    }
}

/// Consent answer vocabularies. Matching is whole-utterance, case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    pub affirmative: Vec<String>,
    pub negative: Vec<String>,
    /// Raise a consent question when romance or explicit content cues appear
    /// without an explicit mode request.
    pub implicit_escalation: bool,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        let words = |list: &[&str]| -> Vec<String> { list.iter().map(|w| w.to_string()).collect() };
        Self {
            affirmative: words(&[
                "yes",
                "y",
                "yeah",
                "yep",
                "sure",
                "i do",
                "i consent",
                "i agree",
                "i confirm",
                "i am 18+",
                "i'm 18+",
                "i am over 18",
                "i'm over 18",
            ]),
            negative: words(&["no", "n", "nope", "nah", "i don't", "do not", "not now"]),
            implicit_escalation: true,
        }
    }
}

impl HavenConfig {
    /// Load from a TOML file, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load from a TOML file, reporting unreadable or malformed files.
    pub fn try_load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Apply `HAVEN_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("HAVEN_MODEL") {
            if !model.trim().is_empty() {
                self.llm.default_model = model.trim().to_string();
            }
        }
        self
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
