//! Generic HTTP CDN handler
//!
//! Sends `POST {endpoint}/refresh` and `POST {endpoint}/preload` with a JSON
//! body `{"object_type": "file" | "directory", "paths": [...]}`.

use super::{CacheHandler, ObjectPaths};
use crate::config::HttpHandlerConfig;
use crate::error::ApiError;
use crate::store::PathEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Refresh,
    Preload,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Refresh => "refresh",
            Action::Preload => "preload",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ObjectRequest<'a> {
    pub object_type: ObjectType,
    pub paths: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct TaskResponse {
    #[serde(default)]
    task_id: Option<String>,
}

pub struct HttpHandler {
    client: reqwest::Client,
    config: HttpHandlerConfig,
}

impl HttpHandler {
    pub fn new(config: HttpHandlerConfig) -> Result<Self, ApiError> {
        if config.endpoint.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "http handler requires an endpoint".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::ProviderError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn url(&self, action: Action) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            action.as_str()
        )
    }

    fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.config.total_timeout_secs)
    }

    /// Run one handler call under the total timeout and the cancellation
    /// token; either one ending the call counts as a handled failure.
    async fn bounded<F>(&self, task: &str, cancel: &CancellationToken, call: F) -> bool
    where
        F: std::future::Future<Output = bool>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(task, "Request cancelled");
                false
            }
            result = timeout(self.total_timeout(), call) => match result {
                Ok(ok) => ok,
                Err(_) => {
                    error!(task, timeout_secs = self.config.total_timeout_secs, "Request timed out");
                    false
                }
            }
        }
    }

    /// POST one object list, retrying transport errors, 5xx and 429
    async fn send(&self, action: Action, object_type: ObjectType, paths: &[String]) -> bool {
        let url = self.url(action);
        let body = ObjectRequest { object_type, paths };
        let mut attempt: u32 = 0;

        loop {
            let mut request = self.client.post(&url).json(&body);
            if !self.config.api_token.is_empty() {
                request = request.bearer_auth(&self.config.api_token);
            }

            let retryable = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    let task = response.json::<TaskResponse>().await.unwrap_or_default();
                    info!(
                        action = action.as_str(),
                        ?object_type,
                        count = paths.len(),
                        task_id = task.task_id.as_deref().unwrap_or("unknown"),
                        "Request accepted"
                    );
                    return true;
                }
                Ok(response) => {
                    let status = response.status();
                    let retryable =
                        status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS;
                    warn!(action = action.as_str(), status = %status, attempt, "Request rejected");
                    retryable
                }
                Err(e) => {
                    warn!(action = action.as_str(), error = %e, attempt, "Request failed");
                    e.is_timeout() || e.is_connect() || e.is_request()
                }
            };

            if !retryable || attempt >= self.config.max_retry {
                error!(
                    action = action.as_str(),
                    ?object_type,
                    attempts = attempt + 1,
                    "Request failed permanently"
                );
                return false;
            }
            attempt += 1;
            sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt))).await;
        }
    }
}

#[async_trait]
impl CacheHandler for HttpHandler {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn refresh(
        &self,
        entries: &[PathEntry],
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        let paths = ObjectPaths::for_refresh(entries, &self.config.prefix);
        if paths.is_empty() {
            debug!("Nothing to refresh");
            return Ok(true);
        }

        let ok = self
            .bounded("refresh", cancel, async {
                if !paths.files.is_empty()
                    && !self.send(Action::Refresh, ObjectType::File, &paths.files).await
                {
                    // directories are skipped once the file request failed
                    return false;
                }
                paths.directories.is_empty()
                    || self
                        .send(Action::Refresh, ObjectType::Directory, &paths.directories)
                        .await
            })
            .await;
        Ok(ok)
    }

    async fn preload(
        &self,
        entries: &[PathEntry],
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        let paths = ObjectPaths::for_preload(entries, &self.config.prefix);
        if paths.is_empty() {
            debug!("Nothing to preload");
            return Ok(true);
        }

        let ok = self
            .bounded("preload", cancel, async {
                self.send(Action::Preload, ObjectType::File, &paths.files)
                    .await
            })
            .await;
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Request line path and `object_type` of every request received
    type Seen = Arc<Mutex<Vec<(String, String)>>>;

    /// Local server answering each request with the next canned status;
    /// the last status repeats once the list runs out
    async fn canned_server(statuses: Vec<u16>) -> (String, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Seen = Arc::default();
        let record = Arc::clone(&seen);

        tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let status = statuses[served.min(statuses.len() - 1)];
                served += 1;
                answer(stream, status, &record).await;
            }
        });
        (format!("http://{}/api", addr), seen)
    }

    async fn answer(mut stream: TcpStream, status: u16, seen: &Seen) {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            raw.extend_from_slice(&chunk[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while raw.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);
        }

        let path = head
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or_default()
            .to_string();
        let body: serde_json::Value =
            serde_json::from_slice(&raw[header_end..]).unwrap_or_default();
        let object_type = body["object_type"].as_str().unwrap_or_default().to_string();
        seen.lock().push((path, object_type));

        let payload = if status == 200 { r#"{"task_id":"t-1"}"# } else { "" };
        let response = format!(
            "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            payload.len(),
            payload
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
    }

    fn retrying(endpoint: &str, max_retry: u32) -> HttpHandler {
        HttpHandler::new(HttpHandlerConfig {
            endpoint: endpoint.to_string(),
            max_retry,
            total_timeout_secs: 20,
            ..HttpHandlerConfig::default()
        })
        .unwrap()
    }

    fn file(path: &str) -> PathEntry {
        PathEntry::new(path, Some(String::new()), false)
    }

    fn config(endpoint: &str) -> HttpHandlerConfig {
        HttpHandlerConfig {
            endpoint: endpoint.to_string(),
            max_retry: 0,
            total_timeout_secs: 5,
            ..HttpHandlerConfig::default()
        }
    }

    #[test]
    fn test_request_body_shape() {
        let paths = vec!["/img/".to_string()];
        let body = serde_json::to_value(ObjectRequest {
            object_type: ObjectType::Directory,
            paths: &paths,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "object_type": "directory", "paths": ["/img/"] })
        );
    }

    #[test]
    fn test_url_joins_action() {
        let handler = HttpHandler::new(config("https://cdn.example.com/api/")).unwrap();
        assert_eq!(handler.url(Action::Refresh), "https://cdn.example.com/api/refresh");
        assert_eq!(handler.url(Action::Preload), "https://cdn.example.com/api/preload");
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        assert!(matches!(
            HttpHandler::new(config("  ")),
            Err(ApiError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let handler = HttpHandler::new(config("http://127.0.0.1:9")).unwrap();
        let cancel = CancellationToken::new();
        assert!(handler.refresh(&[PathEntry::root()], &cancel).await.unwrap());
        assert!(handler.preload(&[], &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_call_is_a_handled_failure() {
        let handler = HttpHandler::new(config("http://127.0.0.1:9")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let entries = vec![PathEntry::new("/a.txt", Some(String::new()), false)];
        assert!(!handler.preload(&entries, &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_handled_failure() {
        let handler = HttpHandler::new(config("http://127.0.0.1:9")).unwrap();
        let entries = vec![PathEntry::new("/a.txt", Some(String::new()), false)];
        let ok = handler
            .refresh(&entries, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_success() {
        let (endpoint, seen) = canned_server(vec![503, 502, 200]).await;
        let handler = retrying(&endpoint, 2);
        let ok = handler
            .preload(&[file("/a.txt")], &CancellationToken::new())
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(seen.lock().len(), 3);
        assert!(seen.lock().iter().all(|(path, _)| path == "/api/preload"));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_retried() {
        let (endpoint, seen) = canned_server(vec![429, 200]).await;
        let ok = retrying(&endpoint, 1)
            .preload(&[file("/a.txt")], &CancellationToken::new())
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_retries_stop_at_max_retry() {
        let (endpoint, seen) = canned_server(vec![500]).await;
        let ok = retrying(&endpoint, 1)
            .preload(&[file("/a.txt")], &CancellationToken::new())
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (endpoint, seen) = canned_server(vec![404]).await;
        let ok = retrying(&endpoint, 3)
            .preload(&[file("/a.txt")], &CancellationToken::new())
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_file_refresh_skips_directories() {
        let (endpoint, seen) = canned_server(vec![400]).await;
        let entries = vec![
            file("/a.txt"),
            PathEntry::ancestor("/img", "").with_force_update(true),
        ];
        let ok = retrying(&endpoint, 0)
            .refresh(&entries, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(
            seen.lock().clone(),
            vec![("/api/refresh".to_string(), "file".to_string())]
        );
    }

    #[tokio::test]
    async fn test_refresh_sends_files_then_directories() {
        let (endpoint, seen) = canned_server(vec![200]).await;
        let entries = vec![
            file("/a.txt"),
            PathEntry::ancestor("/img", "").with_force_update(true),
        ];
        let ok = retrying(&endpoint, 0)
            .refresh(&entries, &CancellationToken::new())
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(
            seen.lock().clone(),
            vec![
                ("/api/refresh".to_string(), "file".to_string()),
                ("/api/refresh".to_string(), "directory".to_string()),
            ]
        );
    }
}
