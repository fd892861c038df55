//! HTTP transport for the knowledge-base runtime API.
//!
//! Sends JSON over HTTPS with a per-attempt timeout. Connect failures,
//! timeouts, 429 and 5xx responses are retried with exponential backoff;
//! everything else fails on the first attempt.

use crate::client::{RetrievalMode, RetrievalTransport};
use crate::wire;
use reqwest::StatusCode;
use std::time::Duration;
use tenrag_core::{AppError, AppResult, TransportConfig};
use tenrag_retrieval::RetrievalRequest;

/// Upper bound on a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// One failed attempt and whether it is worth repeating.
#[derive(Debug)]
struct AttemptFailure {
    retryable: bool,
    message: String,
}

/// HTTP knowledge-base client.
pub struct HttpTransport {
    /// Base URL for the runtime API (no trailing slash)
    base_url: String,

    /// Knowledge base queried by every request
    knowledge_base_id: String,

    /// Optional bearer token
    api_key: Option<String>,

    /// Retries after the first attempt
    max_retries: u32,

    /// Base delay for exponential backoff
    backoff: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    /// Returns `AppError::Config` when no endpoint is configured.
    pub fn new(config: &TransportConfig) -> AppResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(AppError::Config(
                "Transport endpoint must be set for the http provider".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            knowledge_base_id: config.knowledge_base_id.clone(),
            api_key: config.resolve_api_key(),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
            client,
        })
    }

    fn url_for(&self, mode: &RetrievalMode) -> String {
        format!(
            "{}{}",
            self.base_url,
            wire::request_path(&self.knowledge_base_id, mode)
        )
    }

    /// Delay before retry number `retry` (0-based).
    fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    async fn post_once(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AttemptFailure> {
        let mut builder = self.client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| AttemptFailure {
            retryable: e.is_timeout() || e.is_connect(),
            message: format!("Failed to send request to {}: {}", url, e),
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AttemptFailure {
                retryable: is_retryable_status(status),
                message: format!("Backend error ({}): {}", status, error_text),
            });
        }

        response.json().await.map_err(|e| AttemptFailure {
            retryable: e.is_timeout(),
            message: format!("Failed to read response body: {}", e),
        })
    }
}

/// Throttling and server errors are transient; other statuses are not.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait::async_trait]
impl RetrievalTransport for HttpTransport {
    fn provider_name(&self) -> &str {
        "http"
    }

    async fn send(
        &self,
        request: &RetrievalRequest,
        mode: &RetrievalMode,
    ) -> AppResult<serde_json::Value> {
        let url = self.url_for(mode);
        let body = wire::request_body(request, &self.knowledge_base_id, mode)?;

        tracing::info!(
            url = %url,
            tenant = %request.tenant_id(),
            generate = mode.is_generate(),
            "Sending retrieval request"
        );

        let mut retry = 0;
        loop {
            match self.post_once(&url, &body).await {
                Ok(value) => {
                    tracing::debug!(attempts = retry + 1, "Received retrieval response");
                    return Ok(value);
                }
                Err(failure) if failure.retryable && retry < self.max_retries => {
                    let delay = self.backoff_delay(retry);
                    tracing::warn!(
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying retrieval request: {}",
                        failure.message
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(failure) => {
                    tracing::error!(attempts = retry + 1, "Retrieval request failed");
                    return Err(AppError::Transport(failure.message));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tenrag_retrieval::RequestBuilder;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Serve `responses` in order on a local port, repeating the last one.
    /// Returns the base URL and the number of requests answered so far.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                read_request(&mut socket).await;
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];
                let reply = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), attempts)
    }

    /// Read one request: headers, then `Content-Length` bytes of body.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() - (end + 4) >= length {
                return;
            }
        }
    }

    fn config(endpoint: &str) -> TransportConfig {
        TransportConfig {
            endpoint: endpoint.to_string(),
            knowledge_base_id: "KB1".to_string(),
            max_retries: 1,
            retry_backoff_ms: 1,
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new(&config("https://kb.example.com/")).unwrap();
        assert_eq!(transport.provider_name(), "http");
        assert_eq!(transport.base_url, "https://kb.example.com");
        assert!(transport.api_key.is_none());
    }

    #[test]
    fn test_url_for_modes() {
        let transport = HttpTransport::new(&config("https://kb.example.com")).unwrap();

        assert_eq!(
            transport.url_for(&RetrievalMode::Retrieve),
            "https://kb.example.com/knowledgebases/KB1/retrieve"
        );
        assert_eq!(
            transport.url_for(&RetrievalMode::RetrieveAndGenerate {
                model_arn: "m".to_string()
            }),
            "https://kb.example.com/retrieveAndGenerate"
        );
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let transport = HttpTransport::new(&TransportConfig {
            retry_backoff_ms: 200,
            ..config("https://kb.example.com")
        })
        .unwrap();

        assert_eq!(transport.backoff_delay(0), Duration::from_millis(200));
        assert_eq!(transport.backoff_delay(1), Duration::from_millis(400));
        assert_eq!(transport.backoff_delay(3), Duration::from_millis(1600));
        assert_eq!(transport.backoff_delay(30), MAX_BACKOFF);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Nothing listens on port 1
        let transport = HttpTransport::new(&config("http://127.0.0.1:1")).unwrap();
        let request = RequestBuilder::default().build("acme", "q", None, None).unwrap();

        let result = transport.send(&request, &RetrievalMode::Retrieve).await;
        assert!(matches!(result, Err(AppError::Transport(_))));
    }

    #[test]
    fn test_blank_endpoint_is_config_error() {
        let result = HttpTransport::new(&config("  "));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_success() {
        let (url, attempts) = serve(vec![
            (503, r#"{"message":"busy"}"#),
            (200, r#"{"retrievalResults":[]}"#),
        ])
        .await;
        let transport = HttpTransport::new(&config(&url)).unwrap();
        let request = RequestBuilder::default().build("acme", "q", None, None).unwrap();

        let body = transport.send(&request, &RetrievalMode::Retrieve).await.unwrap();

        assert_eq!(body["retrievalResults"], serde_json::json!([]));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, attempts) = serve(vec![(400, r#"{"message":"bad filter"}"#)]).await;
        let transport = HttpTransport::new(&TransportConfig {
            max_retries: 3,
            ..config(&url)
        })
        .unwrap();
        let request = RequestBuilder::default().build("acme", "q", None, None).unwrap();

        let result = transport.send(&request, &RetrievalMode::Retrieve).await;

        match result {
            Err(AppError::Transport(msg)) => assert!(msg.contains("bad filter")),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persistent_server_error_stops_after_max_retries() {
        let (url, attempts) = serve(vec![(500, r#"{"message":"down"}"#)]).await;
        let transport = HttpTransport::new(&TransportConfig {
            max_retries: 2,
            ..config(&url)
        })
        .unwrap();
        let request = RequestBuilder::default().build("acme", "q", None, None).unwrap();

        let result = transport.send(&request, &RetrievalMode::Retrieve).await;

        assert!(matches!(result, Err(AppError::Transport(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
