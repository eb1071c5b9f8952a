//! Moonsec Deobfuscator REST API
//!
//! HTTP front end for the external Moonsec deobfuscation tool. Requests carry
//! Lua source or bytecode as text; the service hands it to the tool through
//! scratch files and returns the transformed text.
//!
//! ## Endpoints
//!
//! - `GET /` - Service descriptor
//! - `GET /health` - Build prerequisite and tool directory status
//! - `GET /test` - Sample payload for smoke tests
//! - `POST /deobfuscate` - Deobfuscate Lua code

pub mod config;
pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use moonsec_deobfuscator::{Deobfuscator, Toolchain};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub deobfuscator: Deobfuscator,

    /// Request body cap in bytes, unlimited when `None`
    pub max_body_bytes: Option<usize>,
}

impl AppState {
    /// Create new application state
    pub fn new(toolchain: Arc<Toolchain>) -> Self {
        Self {
            deobfuscator: Deobfuscator::new(toolchain),
            max_body_bytes: None,
        }
    }

    pub fn with_body_limit(mut self, max_body_bytes: Option<usize>) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn toolchain(&self) -> &Arc<Toolchain> {
        self.deobfuscator.toolchain()
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    // Bytecode uploads routinely exceed axum's 2 MB default.
    let body_limit = match state.max_body_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/test", get(handlers::test_handler))
        .route("/deobfuscate", post(handlers::deobfuscate_handler))
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
