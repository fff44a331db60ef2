//! API integration tests.
//!
//! The router is wired against an in-memory store and stubbed segmentation
//! and analysis, so these exercise the HTTP contract end to end without
//! FFmpeg or network access.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vana_analysis::{AnalysisResult, RetryPolicy};
use vana_api::{create_router, ApiConfig, AppState};
use vana_models::{JobId, Segment};
use vana_pipeline::{Analyzer, JobService, PipelineConfig, PipelineContext, PipelineError,
    PipelineResult, Splitter};
use vana_store::JobStore;

struct StubSplitter {
    chunks_dir: std::path::PathBuf,
    count: u32,
    fail: bool,
}

#[async_trait]
impl Splitter for StubSplitter {
    async fn split(&self, _source: &Path, job_id: &JobId) -> PipelineResult<Vec<Segment>> {
        if self.fail {
            return Err(PipelineError::Segmentation("Failed to chunk video".into()));
        }
        let dir = self.chunks_dir.join(job_id.as_str());
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let mut segments = Vec::new();
        for i in 0..self.count {
            let path = dir.join(format!("chunk_{i:03}.mp4"));
            tokio::fs::write(&path, b"chunk").await.unwrap();
            segments.push(Segment {
                index: i + 1,
                path,
                start_min: f64::from(i) * 5.0,
                end_min: f64::from(i + 1) * 5.0,
            });
        }
        Ok(segments)
    }
}

struct StubAnalyzer;

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, segment_path: &Path) -> AnalysisResult<String> {
        let name = segment_path.file_name().unwrap().to_string_lossy();
        Ok(format!("summary of {name}"))
    }
}

struct TestApp {
    router: axum::Router,
    store: JobStore,
    _dir: TempDir,
}

async fn test_app(chunk_count: u32, fail_split: bool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let pipeline_config = Arc::new(PipelineConfig {
        upload_dir: dir.path().join("uploads"),
        chunks_dir: dir.path().join("chunks"),
        reports_dir: dir.path().join("reports"),
        segment_seconds: 300,
        max_concurrent_jobs: 2,
        retry: RetryPolicy {
            base_delay: Duration::from_millis(1),
            default_retry_after: Duration::from_millis(1),
            ..Default::default()
        },
    });
    pipeline_config.ensure_dirs().await.unwrap();

    let store = JobStore::in_memory().await.unwrap();
    store.init().await.unwrap();

    let ctx = PipelineContext {
        store: store.clone(),
        splitter: Arc::new(StubSplitter {
            chunks_dir: pipeline_config.chunks_dir.clone(),
            count: chunk_count,
            fail: fail_split,
        }),
        analyzer: Arc::new(StubAnalyzer),
        config: pipeline_config,
    };

    let state = AppState {
        config: ApiConfig::default(),
        service: JobService::new(ctx),
    };

    TestApp {
        router: create_router(state),
        store,
        _dir: dir,
    }
}

fn multipart_request(uri: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-4a7e21";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(router: &axum::Router, uri: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn wait_for_status(app: &TestApp, job_id: &str, wanted: &str) -> Value {
    for _ in 0..200 {
        let response = get(&app.router, &format!("/v1/analyze/status/{job_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        if body["status"] == wanted {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached status {wanted}");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(1, false).await;
    let response = get(&app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "video-analysis-api");
}

#[tokio::test]
async fn test_upload_and_poll_to_completion() {
    let app = test_app(2, false).await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/v1/analyze",
            "evidence.mp4",
            "video/mp4",
            b"fake video bytes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert_eq!(body["statusUrl"], format!("/v1/analyze/status/{job_id}"));
    assert_eq!(body["filename"], "evidence.mp4");
    assert_eq!(body["fileSize"], 16);

    let done = wait_for_status(&app, &job_id, "COMPLETE").await;
    assert_eq!(done["chunks_processed"], 2);
    assert_eq!(done["total_chunks"], 2);
    let report = done["report"].as_str().unwrap();
    assert!(report.contains("VIDEO ANALYSIS REPORT"));
    assert!(report.contains("Total Segments Analyzed: 2"));
    assert!(done.get("error").is_none());
}

#[tokio::test]
async fn test_upload_accepted_by_extension_alone() {
    let app = test_app(1, false).await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/v1/analyze",
            "dashcam.MOV",
            "application/octet-stream",
            b"bytes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_non_video() {
    let app = test_app(1, false).await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/v1/analyze",
            "notes.txt",
            "text/plain",
            b"not a video",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Only video files are allowed"));
}

#[tokio::test]
async fn test_upload_rejects_empty_file() {
    let app = test_app(1, false).await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/v1/analyze", "clip.mp4", "video/mp4", b""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = test_app(1, false).await;

    let boundary = "test-boundary-4a7e21";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
         hello\r\n--{boundary}--\r\n"
    );
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/analyze")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["detail"], "No file provided");
}

#[tokio::test]
async fn test_status_unknown_job() {
    let app = test_app(1, false).await;
    let response = get(&app.router, "/v1/analyze/status/no-such-job").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["detail"], "Job not found");
}

#[tokio::test]
async fn test_failed_job_reports_error() {
    let app = test_app(0, true).await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/v1/analyze",
            "broken.mp4",
            "video/mp4",
            b"bytes",
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let failed = wait_for_status(&app, &job_id, "FAILED").await;
    assert!(failed["error"]
        .as_str()
        .unwrap()
        .contains("Failed to chunk video"));
    assert!(failed.get("report").is_none());
}

#[tokio::test]
async fn test_list_jobs_filter_and_shape() {
    let app = test_app(1, false).await;

    let mut job_ids = Vec::new();
    for i in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(multipart_request(
                "/v1/analyze",
                &format!("clip{i}.mp4"),
                "video/mp4",
                b"bytes",
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        job_ids.push(body["jobId"].as_str().unwrap().to_string());
    }
    for id in &job_ids {
        wait_for_status(&app, id, "COMPLETE").await;
    }

    let response = get(&app.router, "/v1/jobs?status=COMPLETE").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 3);
    for job in jobs {
        assert_eq!(job["status"], "COMPLETE");
        // Listing never carries the report payload
        assert!(job.get("report").is_none());
        assert!(job["jobId"].is_string());
    }

    let response = get(&app.router, "/v1/jobs?limit=2").await;
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = get(&app.router, "/v1/jobs?status=PENDING").await;
    let body = json_body(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_jobs_invalid_status() {
    let app = test_app(1, false).await;
    let response = get(&app.router, "/v1/jobs?status=DONE").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_job() {
    let app = test_app(1, false).await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/v1/analyze",
            "clip.mp4",
            "video/mp4",
            b"bytes",
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();
    wait_for_status(&app, &job_id, "COMPLETE").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/jobs/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], format!("Job {job_id} deleted successfully"));

    // The row is gone from both the API and the store
    let response = get(&app.router, &format!("/v1/analyze/status/{job_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app
        .store
        .get(&JobId::from_string(job_id.clone()))
        .await
        .unwrap()
        .is_none());

    // Deleting again is a 404
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/jobs/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
