//! Build-log status handler

use axum::{
    Json,
    extract::{Path, Query, State},
};
use sitewright_core::domain::job::JobId;
use sitewright_core::dto::site::{BuildLogQuery, BuildLogResponse};

use crate::api::error::ApiResult;
use crate::state::AppState;

/// GET /build-log/{slug}
/// Current status, statistics and log text of a build
///
/// Query parameters:
/// - `lines` (optional): only return the last N lines of the log; `<= 0` returns all of it
pub async fn get_build_log(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<BuildLogQuery>,
) -> ApiResult<Json<BuildLogResponse>> {
    let job_id = JobId::parse(&slug)?;
    tracing::debug!("Reading build log for {}", job_id);

    let snapshot = state.logs.status(&job_id, query.tail_lines()).await?;

    Ok(Json(snapshot.into()))
}
