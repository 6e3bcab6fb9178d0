//! Gateway server: router, handlers and startup

use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use haven_authority::{EchoGenerator, LlmReplyGenerator, ReplyGenerator, TransitionAuthority};
use haven_core::{ChatRequest, ChatResponse, Error, HavenConfig, HealthStatus};
use haven_llm::{AnthropicProvider, OpenAiProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Default)]
pub struct ExtendedConfig {
    pub haven: HavenConfig,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Answer conversation turns with the echo generator instead of a provider.
    pub offline: bool,
}

impl ExtendedConfig {
    /// Fill missing provider keys from `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`.
    pub fn with_env_keys(mut self) -> Self {
        let from_env = |name: &str| std::env::var(name).ok().filter(|k| !k.trim().is_empty());
        self.anthropic_api_key = self.anthropic_api_key.or_else(|| from_env("ANTHROPIC_API_KEY"));
        self.openai_api_key = self.openai_api_key.or_else(|| from_env("OPENAI_API_KEY"));
        self
    }
}

pub struct AppState {
    pub authority: TransitionAuthority,
}

impl AppState {
    pub fn new(generator: Arc<dyn ReplyGenerator>, config: &HavenConfig) -> Self {
        Self {
            authority: TransitionAuthority::with_consent_config(generator, &config.consent),
        }
    }
}

/// Reply generator for a config: the echo generator offline, otherwise one
/// provider per API key present.
pub fn build_generator(config: &ExtendedConfig) -> anyhow::Result<Arc<dyn ReplyGenerator>> {
    if config.offline {
        info!("Offline mode: conversation turns are echoed");
        return Ok(Arc::new(EchoGenerator));
    }

    let llm = &config.haven.llm;
    let timeout = Duration::from_secs(llm.request_timeout_secs);
    let mut generator = LlmReplyGenerator::new(llm.clone(), config.haven.conversation.clone());

    if let Some(key) = &config.openai_api_key {
        let mut provider = OpenAiProvider::new(key).with_timeout(timeout);
        if let Some(url) = &llm.openai_base_url {
            info!("Using custom OpenAI URL: {}", url);
            provider = provider.with_base_url(url);
        }
        generator = generator.with_provider(Arc::new(provider));
    }
    if let Some(key) = &config.anthropic_api_key {
        let mut provider = AnthropicProvider::new(key).with_timeout(timeout);
        if let Some(url) = &llm.anthropic_base_url {
            info!("Using custom Anthropic URL: {}", url);
            provider = provider.with_base_url(url);
        }
        generator = generator.with_provider(Arc::new(provider));
    }

    if generator.provider_names().is_empty() {
        anyhow::bail!("no provider key set: export OPENAI_API_KEY or ANTHROPIC_API_KEY, or run with --offline");
    }
    info!("Reply providers: {:?}", generator.provider_names());
    Ok(Arc::new(generator))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let list: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(list))
}

/// Routes with CORS and request tracing applied.
pub fn router(state: Arc<AppState>, config: &HavenConfig) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer(&config.gateway.cors_allow_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_gateway(config: ExtendedConfig) -> anyhow::Result<()> {
    let generator = build_generator(&config)?;
    let state = Arc::new(AppState::new(generator, &config.haven));
    let app = router(state, &config.haven);

    let gateway = &config.haven.gateway;
    let bind_addr: SocketAddr = format!("{}:{}", gateway.bind.to_addr(), gateway.port).parse()?;

    info!("Haven Gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Chat:   POST http://{}/chat", bind_addr);
    info!("  Health: GET  http://{}/health", bind_addr);
    info!("  Default model: {}", config.haven.llm.default_model);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    serve(listener, app).await
}

/// Serve a router on an already bound listener until the process exits.
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    if request.text.trim().is_empty() {
        return Err(Error::invalid_request("text is empty").into());
    }
    debug!(
        "Chat: mode={} pending={:?} history={}",
        request.session_state.mode,
        request.session_state.pending_consent,
        request.history.len()
    );

    let (session_state, reply) = state
        .authority
        .decide(&request.session_state, &request.text, &request.history)
        .await?
        .into_parts();

    Ok(Json(ChatResponse {
        reply,
        session_state,
    }))
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
