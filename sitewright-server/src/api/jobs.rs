//! Run registry handler

use axum::{Json, extract::State};
use sitewright_core::domain::job::RunSummary;

use crate::state::AppState;

/// GET /jobs
/// Runs known to this process, most recently accepted first
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<RunSummary>> {
    tracing::debug!("Listing runs");
    Json(state.orchestrator.registry().list())
}
