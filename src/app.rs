//! Application wiring
//!
//! Shared request state and the axum router.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::api;
use crate::inference::{LocalProcessRunner, ModelRunner};
use crate::types::Config;

/// State shared by every request
///
/// Both fields are read-only; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<dyn ModelRunner>,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<dyn ModelRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    /// State backed by the real llama.cpp subprocess
    pub fn local(config: Config) -> Self {
        let runner = Arc::new(LocalProcessRunner::new(config.timeout));
        tracing::info!(
            "Model runner ready: {} (timeout: {:?})",
            config.resolve(&config.bin).display(),
            config.timeout
        );
        Self::new(config, runner)
    }
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.static_dir);
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(api::index))
        .route("/run", post(api::run))
        .nest_service("/static", assets)
        .layer(trace)
        .with_state(state)
}
