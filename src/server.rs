//! HTTP surface: the lookup API plus static files
//!
//! `GET /api/lookup/?sym=A,B` returns a JSON array of quotes. Everything outside
//! `/api` is served from disk.

use std::path::{Path, PathBuf};

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::lookup::{LookupError, LookupService};
use crate::pipeline::FetchError;

/// Favicon file name inside the static directory
const FAVICON_FILE: &str = "coffee.ico";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub lookup: LookupService,
}

/// Directories served next to the API
#[derive(Debug, Clone)]
pub struct StaticFiles {
    /// Served under `/static/` and holds the favicon
    pub static_dir: PathBuf,
    /// Served for every path not matched otherwise
    pub web_root: PathBuf,
}

/// Errors surfaced to HTTP clients
#[derive(Debug)]
pub enum ApiError {
    /// `sym` was missing or empty
    MissingSymbols,
    /// An upstream provider failed
    Upstream(FetchError),
    /// The response could not be encoded
    Serialization(serde_json::Error),
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::MissingSymbols => ApiError::MissingSymbols,
            LookupError::Fetch(e) => ApiError::Upstream(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingSymbols => (StatusCode::UNAUTHORIZED, "sym required").into_response(),
            ApiError::Upstream(e) => {
                tracing::error!("{}: server error ({})", e.operation, e.source);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error.").into_response()
            }
            ApiError::Serialization(e) => {
                tracing::error!("lookup_handler: server error ({})", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error.").into_response()
            }
        }
    }
}

/// Query parameters of the lookup endpoint
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    sym: Option<String>,
}

/// Handles `GET /api/lookup/`
async fn lookup_handler(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Response, ApiError> {
    let query = params.sym.unwrap_or_default();
    let quotes = state.lookup.lookup_query(&query).await?;

    let body = serde_json::to_string_pretty(&quotes).map_err(ApiError::Serialization)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Router with only the API routes
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/lookup", get(lookup_handler))
        .route("/api/lookup/", get(lookup_handler))
        .with_state(state)
}

/// Full application router: API, favicon, static files and web root
pub fn router(state: AppState, files: &StaticFiles) -> Router {
    api_router(state)
        .route_service(
            "/favicon.ico",
            ServeFile::new(files.static_dir.join(FAVICON_FILE)),
        )
        .nest_service("/static", ServeDir::new(&files.static_dir))
        .fallback_service(ServeDir::new(&files.web_root))
        .layer(TraceLayer::new_for_http())
}

/// Serves `app` on `listener` until Ctrl-C
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

impl StaticFiles {
    pub fn new(static_dir: impl AsRef<Path>, web_root: impl AsRef<Path>) -> Self {
        Self {
            static_dir: static_dir.as_ref().to_path_buf(),
            web_root: web_root.as_ref().to_path_buf(),
        }
    }
}
