//! Gemini API client for per-segment video analysis.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Fixed analysis prompt sent with every segment.
pub const DEFAULT_PROMPT: &str = "You are a helpful police assistant. Summarize the key events \
in this video clip for an incident report. Be objective and concise. List the events \
chronologically.";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Analysis client configuration, constructed once at startup.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// API key for the analysis service
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Service base URL (overridable for tests)
    pub base_url: String,
    /// Prompt sent with every segment
    pub prompt: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl AnalysisConfig {
    /// Build from environment variables. `GEMINI_API_KEY` is required.
    pub fn from_env() -> AnalysisResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AnalysisError::config("GEMINI_API_KEY environment variable not set"))?;

        Ok(Self {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            prompt: std::env::var("ANALYSIS_PROMPT").unwrap_or_else(|_| DEFAULT_PROMPT.to_string()),
            request_timeout: Duration::from_secs(
                std::env::var("ANALYSIS_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        })
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Gemini API client.
///
/// Each call builds a fresh request through the shared connection pool, so a
/// failed segment leaves no broken state behind for the next one.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: AnalysisConfig,
    client: Client,
}

impl GeminiClient {
    /// Create a new client. Fails if the config has no API key or the HTTP
    /// client cannot be built.
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        if config.api_key.is_empty() {
            return Err(AnalysisError::config("analysis API key is empty"));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AnalysisError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Analyze one video segment, returning the summary text.
    ///
    /// This is a single attempt; callers apply [`crate::retry::with_retry`]
    /// for the bounded retry policy.
    pub async fn analyze(&self, segment_path: &Path) -> AnalysisResult<String> {
        let video_bytes = tokio::fs::read(segment_path).await.map_err(|e| {
            AnalysisError::fatal(format!(
                "failed to read segment {}: {e}",
                segment_path.display()
            ))
        })?;

        debug!(
            segment = %segment_path.display(),
            bytes = video_bytes.len(),
            "sending segment for analysis"
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(self.config.prompt.clone()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "video/mp4".to_string(),
                            data: BASE64.encode(&video_bytes),
                        }),
                    },
                ],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::transient(format!("analysis request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, retry_after, &body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::transient(format!("failed to parse analysis response: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| AnalysisError::fatal("no content in analysis response"))?;

        Ok(text.trim().to_string())
    }
}

/// Read a Retry-After header expressed in seconds, if present.
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Map an HTTP failure to the analysis error taxonomy.
fn classify_http_failure(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> AnalysisError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AnalysisError::RateLimited { retry_after };
    }
    if status.is_server_error() {
        return AnalysisError::transient(format!("analysis service returned {status}: {body}"));
    }
    AnalysisError::fatal(format!("analysis service returned {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> AnalysisConfig {
        AnalysisConfig {
            api_key: "test-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url,
            prompt: DEFAULT_PROMPT.to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }

    fn segment_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("chunk_000.mp4");
        std::fs::write(&path, b"not really mp4 but good enough").unwrap();
        path
    }

    async fn mock_server_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!(
                "/v1beta/models/{DEFAULT_MODEL}:generateContent"
            )))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_classify_http_failure() {
        assert!(matches!(
            classify_http_failure(StatusCode::TOO_MANY_REQUESTS, None, ""),
            AnalysisError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            classify_http_failure(StatusCode::BAD_GATEWAY, None, "upstream"),
            AnalysisError::Transient(_)
        ));
        assert!(matches!(
            classify_http_failure(StatusCode::BAD_REQUEST, None, "bad payload"),
            AnalysisError::Fatal(_)
        ));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let mut config = test_config("http://localhost".into());
        config.api_key = String::new();
        assert!(matches!(
            GeminiClient::new(config),
            Err(AnalysisError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_success_trims_text() {
        let server = mock_server_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  The subject enters the frame.\n" }] }
            }]
        })))
        .await;

        let dir = tempfile::TempDir::new().unwrap();
        let client = GeminiClient::new(test_config(server.uri())).unwrap();
        let summary = client.analyze(&segment_file(&dir)).await.unwrap();
        assert_eq!(summary, "The subject enters the frame.");
    }

    #[tokio::test]
    async fn test_analyze_rate_limited_with_hint() {
        let server = mock_server_with(
            ResponseTemplate::new(429).insert_header("retry-after", "7"),
        )
        .await;

        let dir = tempfile::TempDir::new().unwrap();
        let client = GeminiClient::new(test_config(server.uri())).unwrap();
        let err = client.analyze(&segment_file(&dir)).await.unwrap_err();
        match err {
            AnalysisError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analyze_server_error_is_transient() {
        let server = mock_server_with(ResponseTemplate::new(503)).await;

        let dir = tempfile::TempDir::new().unwrap();
        let client = GeminiClient::new(test_config(server.uri())).unwrap();
        let err = client.analyze(&segment_file(&dir)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Transient(_)));
    }

    #[tokio::test]
    async fn test_analyze_client_error_is_fatal() {
        let server = mock_server_with(ResponseTemplate::new(400).set_body_string("bad video"))
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let client = GeminiClient::new(test_config(server.uri())).unwrap();
        let err = client.analyze(&segment_file(&dir)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Fatal(_)));
    }

    #[tokio::test]
    async fn test_analyze_missing_segment_is_fatal() {
        let client = GeminiClient::new(test_config("http://localhost:1".into())).unwrap();
        let err = client
            .analyze(Path::new("/nonexistent/chunk_000.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Fatal(_)));
    }

    #[tokio::test]
    async fn test_analyze_empty_candidates_is_fatal() {
        let server = mock_server_with(
            ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })),
        )
        .await;

        let dir = tempfile::TempDir::new().unwrap();
        let client = GeminiClient::new(test_config(server.uri())).unwrap();
        let err = client.analyze(&segment_file(&dir)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Fatal(_)));
    }
}
