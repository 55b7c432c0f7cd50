//! Public job listing

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::core::error::Result;
use crate::core::AppState;

/// GET /job/all-jobs
pub async fn all_jobs(State(state): State<AppState>) -> Result<Json<Value>> {
    info!("GET /job/all-jobs");

    let jobs = state.store.list_visible_jobs().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Jobs fetched successfully",
        "jobData": jobs,
    })))
}
