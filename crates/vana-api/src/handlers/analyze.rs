//! Upload and status handlers.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use vana_models::{JobId, JobView};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Extensions accepted when the content type is not conclusive.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

#[derive(Serialize)]
pub struct AnalyzeResponse {
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[serde(rename = "statusUrl")]
    pub status_url: String,
    pub filename: Option<String>,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
}

/// `POST /v1/analyze` - accept a video upload and create an analysis job.
///
/// Returns as soon as the job row exists; the pipeline runs in the
/// background and the client polls the status URL.
pub async fn start_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalyzeResponse>> {
    let mut upload: Option<(Option<String>, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;

        upload = Some((filename, content_type, data.to_vec()));
        break;
    }

    let Some((filename, content_type, data)) = upload else {
        return Err(ApiError::bad_request("No file provided"));
    };

    if !is_video(content_type.as_deref(), filename.as_deref()) {
        return Err(ApiError::bad_request(format!(
            "Only video files are allowed. Got content-type: {}, extension: {}",
            content_type.as_deref().unwrap_or("<none>"),
            extension_of(filename.as_deref()).unwrap_or("<none>"),
        )));
    }

    if data.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let file_size = data.len() as i64;
    let job = state.service.submit(data, filename).await?;

    info!(job_id = %job.id, size = file_size, "analysis job created");

    Ok(Json(AnalyzeResponse {
        job_id: job.id.to_string(),
        status_url: format!("/v1/analyze/status/{}", job.id),
        filename: job.video_filename,
        file_size,
    }))
}

/// `GET /v1/analyze/status/{job_id}` - poll one job's state.
///
/// The report appears once the job is `COMPLETE`, the error once `FAILED`.
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobView>> {
    let job = state
        .service
        .query(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(JobView::detailed(&job)))
}

/// A file counts as video if either the content type or the extension says so.
fn is_video(content_type: Option<&str>, filename: Option<&str>) -> bool {
    let by_content = content_type.is_some_and(|ct| ct.starts_with("video/"));
    let by_extension = extension_of(filename)
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
    by_content || by_extension
}

fn extension_of(filename: Option<&str>) -> Option<&str> {
    std::path::Path::new(filename?)
        .extension()
        .and_then(|e| e.to_str())
}
