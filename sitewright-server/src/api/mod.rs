//! API Module
//!
//! HTTP API layer of the build server.
//! Each submodule handles endpoints for a specific concern.

pub mod build_log;
pub mod error;
pub mod health;
pub mod jobs;
pub mod site;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Build submission and status
        .route("/generate-site", post(site::generate_site))
        .route("/build-log/{slug}", get(build_log::get_build_log))
        // Run registry
        .route("/jobs", get(jobs::list_jobs))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
