//! zemer-dl library - Zemereshet song-archive downloader service
//!
//! Fetches a song page from zemereshet.co.il, extracts its recordings and
//! streams them back as one zip archive, with optional SSE progress.

pub mod api;
pub mod archive;
pub mod extract;
pub mod fetch;
pub mod sse;

use crate::fetch::Fetcher;
use crate::sse::ProgressHub;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use zemer_common::config::Config;
use zemer_common::session::SessionStore;
use zemer_common::Result;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Credential check + session table (the auth gate's backing store)
    pub sessions: Arc<SessionStore>,
    pub fetcher: Arc<Fetcher>,
    /// Correlation-keyed progress broadcast
    pub hub: ProgressHub,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let sessions = Arc::new(SessionStore::new(&config.auth));
        let fetcher = Arc::new(Fetcher::new(&config.fetch)?);
        Ok(Self {
            config: Arc::new(config),
            sessions,
            fetcher,
            hub: ProgressHub::new(),
        })
    }
}

/// Build application router
///
/// The download API and the static UI sit behind the auth gate. Health is
/// public, as is the SSE stream (EventSource cannot send headers; the
/// stream only ever reports progress for ids the client itself chose).
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/download", post(api::handlers::download))
        .fallback_service(ServeDir::new(&state.config.server.static_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_auth,
        ));

    let public = Router::new()
        .route("/health", get(api::handlers::health))
        .route("/api/events/:correlation_id", get(api::sse::event_stream));

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
