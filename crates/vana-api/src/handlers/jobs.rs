//! Job listing and deletion handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vana_models::{JobId, JobStatus, JobView};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<String>,
}

fn default_limit() -> i64 {
    100
}

/// `GET /v1/jobs` - paginated job listing, optionally filtered by status.
///
/// List entries carry counters but never the report body; clients fetch
/// that through the status endpoint.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<Vec<JobView>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<JobStatus>()
                .map_err(|e| ApiError::bad_request(e.to_string()))
        })
        .transpose()?;

    let jobs = state
        .service
        .list(query.skip.max(0), query.limit.clamp(0, 1000), status)
        .await?;

    Ok(Json(jobs.iter().map(JobView::summary).collect()))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// `DELETE /v1/jobs/{job_id}` - remove a job row and its artifacts.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = JobId::from_string(job_id);
    if !state.service.remove(&id).await? {
        return Err(ApiError::not_found("Job not found"));
    }

    Ok(Json(DeleteResponse {
        message: format!("Job {id} deleted successfully"),
    }))
}
