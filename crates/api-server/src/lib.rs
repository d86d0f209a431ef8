//! HTTP API for the artisan marketplace.

pub mod ai_routes;
pub mod auth;
pub mod auth_routes;
pub mod brute_force;
pub mod config;
pub mod extract;
pub mod product_routes;
pub mod request_id;
pub mod security_headers;
pub mod story_routes;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ai_assistant::providers::openai::{OpenAIConfig, OpenAIProvider};
use ai_assistant::ArtisanAssistant;
use artisan_core::MarketplaceError;
use marketplace_store::{
    MarketplaceDb, ProductCatalog, SessionStore, StoryArchive, UserDirectory,
};

use crate::auth::AuthError;
use crate::brute_force::BruteForceGuard;
use crate::config::{LlmSettings, ServerConfig};


/// Uploads go through multipart forms; cap the body at 10 MiB.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AppState {
    pub db: MarketplaceDb,
    /// `None` when no LLM key is configured
    pub assistant: Option<ArtisanAssistant>,
    pub brute_force_guard: Arc<BruteForceGuard>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: MarketplaceDb, assistant: Option<ArtisanAssistant>, config: ServerConfig) -> Self {
        let guard = BruteForceGuard::new(
            config.brute_force.max_failures,
            config.brute_force.window,
            config.brute_force.lockout,
        );

        Self {
            db,
            assistant,
            brute_force_guard: Arc::new(guard),
            config: Arc::new(config),
        }
    }

    pub fn users(&self) -> UserDirectory {
        UserDirectory::new(self.db.clone())
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.db.clone(), self.config.session_ttl)
    }

    pub fn products(&self) -> ProductCatalog {
        ProductCatalog::new(self.db.clone())
    }

    pub fn stories(&self) -> StoryArchive {
        StoryArchive::new(self.db.clone())
    }
}

/// Handler error. The status comes from an explicit override, or from the
/// wrapped domain error.
#[derive(Debug)]
pub struct AppError {
    status: Option<StatusCode>,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self {
            status: Some(status),
            error,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        if let Some(status) = self.status {
            return status;
        }

        if let Some(err) = self.error.downcast_ref::<MarketplaceError>() {
            return match err {
                MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
                MarketplaceError::Conflict(_) | MarketplaceError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                MarketplaceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                MarketplaceError::Forbidden(_) => StatusCode::FORBIDDEN,
            };
        }

        if let Some(err) = self.error.downcast_ref::<AuthError>() {
            return err.status();
        }

        if let Some(rejection) = self.error.downcast_ref::<JsonRejection>() {
            return rejection.status();
        }
        if let Some(rejection) = self.error.downcast_ref::<QueryRejection>() {
            return rejection.status();
        }
        if let Some(rejection) = self.error.downcast_ref::<MultipartRejection>() {
            return rejection.status();
        }

        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: None,
            error: err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {:#}", status, self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.error);
        }

        (status, Json(json!({ "detail": self.error.to_string() }))).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let enable_hsts = state.config.enable_hsts;

    Router::new()
        .route("/health", get(health))
        .route("/api", get(root))
        .route("/api/", get(root))
        .route("/api/test-ai", get(test_ai))
        .merge(auth_routes::auth_routes())
        .merge(product_routes::product_routes())
        .merge(story_routes::story_routes())
        .merge(ai_routes::ai_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            enable_hsts,
            security_headers::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_id::request_span))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "AI-Powered Marketplace Assistant API",
        "status": "active",
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Connectivity check. Always 200; failures are reported in the body.
async fn test_ai(State(state): State<AppState>) -> Json<serde_json::Value> {
    let Some(assistant) = state.assistant.as_ref() else {
        return Json(json!({
            "error": ai_assistant::LLMError::NotConfigured.to_string(),
            "status": "failed",
        }));
    };

    match assistant.test_connection().await {
        Ok(text) => Json(json!({ "ai_response": text, "status": "success" })),
        Err(e) => {
            tracing::warn!("AI connectivity check failed: {}", e);
            Json(json!({ "error": e.to_string(), "status": "failed" }))
        }
    }
}

pub fn build_assistant(settings: &LlmSettings) -> anyhow::Result<ArtisanAssistant> {
    let provider = OpenAIProvider::with_config(
        OpenAIConfig::new(settings.api_key.clone())
            .with_api_base(settings.api_base.clone())
            .with_timeout(settings.timeout_secs),
    )?;

    Ok(ArtisanAssistant::new(Arc::new(provider), settings.model.clone()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Starting Artisant API server");

    let db = MarketplaceDb::new(&config.database_url).await?;
    tracing::info!("Database ready at {}", config.database_url);

    let assistant = match config.llm.as_ref() {
        Some(settings) => {
            let assistant = build_assistant(settings)?;
            tracing::info!(
                "LLM provider: {} (model {})",
                assistant.provider_name(),
                assistant.model()
            );
            Some(assistant)
        }
        None => {
            tracing::warn!("No LLM API key configured; AI endpoints will return 503");
            None
        }
    };

    let bind_addr = config.bind_addr();
    let state = AppState::new(db, assistant, config);

    let housekeeping = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            housekeeping.brute_force_guard.cleanup();
            match housekeeping.sessions().prune_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Pruned {} expired sessions", n),
                Err(e) => tracing::warn!("Session pruning failed: {:#}", e),
            }
        }
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
