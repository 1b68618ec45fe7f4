//! Cuttly adapter. Implements ShortenerPort against the Cuttly REST API.
//!
//! Every outcome, including transport errors and odd bodies, is mapped to a
//! `ShortResult`; nothing is propagated as an error.

use crate::domain::{Alias, ErrorKind, ShortResult};
use crate::ports::ShortenerPort;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Cuttly `url.status` codes.
const STATUS_ALREADY_SHORTENED: u8 = 1;
const STATUS_INVALID_URL: u8 = 2;
const STATUS_INVALID_ALIAS: u8 = 3;
const STATUS_ALIAS_TAKEN: u8 = 4;
const STATUS_INVALID_KEY: u8 = 5;
const STATUS_RATE_LIMITED: u8 = 6;
const STATUS_OK: u8 = 7;
const STATUS_BLOCKED: u8 = 8;

/// Cuttly API adapter.
///
/// Requires an API key from https://cutt.ly/edit. `timeout` bounds each HTTP call.
pub struct CuttlyAdapter {
    client: Client,
    api_url: String,
    api_key: String,
}

impl CuttlyAdapter {
    /// Create a new Cuttly adapter.
    ///
    /// # Arguments
    /// * `api_url` - API endpoint (e.g., "https://cutt.ly/api/api.php")
    /// * `api_key` - Cuttly API key
    /// * `timeout` - Per-request timeout
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build tuned HTTP client, using defaults");
                Client::new()
            });
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

/// Cuttly response envelope.
#[derive(Deserialize)]
struct CuttlyResponse {
    url: CuttlyUrl,
}

#[derive(Deserialize)]
struct CuttlyUrl {
    status: u8,
    #[serde(rename = "shortLink")]
    short_link: Option<String>,
}

/// Map a Cuttly status code to an error kind. `None` means success.
fn classify_status(status: u8) -> Option<ErrorKind> {
    match status {
        STATUS_OK | STATUS_ALREADY_SHORTENED => None,
        STATUS_ALIAS_TAKEN => Some(ErrorKind::AliasTaken),
        STATUS_INVALID_URL => Some(ErrorKind::InvalidUrl),
        STATUS_RATE_LIMITED => Some(ErrorKind::UpstreamUnavailable),
        STATUS_INVALID_ALIAS | STATUS_INVALID_KEY | STATUS_BLOCKED => {
            Some(ErrorKind::UpstreamRejected)
        }
        _ => Some(ErrorKind::UpstreamRejected),
    }
}

/// Map a non-success HTTP status to an error kind.
fn classify_http_status(status: StatusCode) -> ErrorKind {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ErrorKind::UpstreamUnavailable
    } else {
        ErrorKind::UpstreamRejected
    }
}

/// Path of the short link, used as the click tracking id (`https://cutt.ly/<id>/stats`).
fn tracking_id(short_link: &str) -> String {
    url::Url::parse(short_link)
        .map(|u| u.path().trim_matches('/').to_string())
        .unwrap_or_else(|_| {
            short_link
                .rsplit('/')
                .next()
                .unwrap_or(short_link)
                .to_string()
        })
}

/// Turn an HTTP status and raw body into a result for `original_url`.
fn parse_response(status: StatusCode, body: &str, original_url: &str) -> ShortResult {
    if !status.is_success() {
        return ShortResult::failure(classify_http_status(status), original_url);
    }
    let parsed: CuttlyResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, body = %body.chars().take(200).collect::<String>(), "malformed Cuttly response");
            return ShortResult::failure(ErrorKind::UpstreamUnavailable, original_url);
        }
    };
    if let Some(kind) = classify_status(parsed.url.status) {
        debug!(status = parsed.url.status, ?kind, "Cuttly refused URL");
        return ShortResult::failure(kind, original_url);
    }
    match parsed.url.short_link {
        Some(short_url) if !short_url.is_empty() => ShortResult::Success {
            original_url: original_url.to_string(),
            click_tracking_id: tracking_id(&short_url),
            short_url,
        },
        _ => {
            warn!("Cuttly reported success without a shortLink");
            ShortResult::failure(ErrorKind::UpstreamUnavailable, original_url)
        }
    }
}

#[async_trait::async_trait]
impl ShortenerPort for CuttlyAdapter {
    async fn shorten(&self, url: &str, alias: Option<&Alias>) -> ShortResult {
        let mut query = vec![("key", self.api_key.as_str()), ("short", url)];
        if let Some(alias) = alias {
            query.push(("name", alias.as_str()));
        }

        let response = match self.client.get(&self.api_url).query(&query).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(url, "Cuttly request timed out");
                return ShortResult::failure(ErrorKind::UpstreamTimeout, url);
            }
            Err(e) => {
                warn!(url, error = %e, "Cuttly request failed");
                return ShortResult::failure(ErrorKind::UpstreamUnavailable, url);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) if e.is_timeout() => return ShortResult::failure(ErrorKind::UpstreamTimeout, url),
            Err(e) => {
                warn!(url, error = %e, "failed to read Cuttly response");
                return ShortResult::failure(ErrorKind::UpstreamUnavailable, url);
            }
        };

        let result = parse_response(status, &body, url);
        debug!(url, success = result.is_success(), "Cuttly call finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const URL: &str = "https://example.com/long";

    #[test]
    fn test_parse_created() {
        let body = r#"{"url":{"status":7,"fullLink":"https://example.com/long","date":"2024-01-01","shortLink":"https://cutt.ly/abc123","title":"Example"}}"#;
        let result = parse_response(StatusCode::OK, body, URL);
        assert_eq!(
            result,
            ShortResult::Success {
                original_url: URL.to_string(),
                short_url: "https://cutt.ly/abc123".to_string(),
                click_tracking_id: "abc123".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_already_shortened_is_success() {
        let body = r#"{"url":{"status":1,"shortLink":"https://cutt.ly/old"}}"#;
        assert!(parse_response(StatusCode::OK, body, URL).is_success());
    }

    #[test]
    fn test_parse_status_codes() {
        let cases = [
            (2, ErrorKind::InvalidUrl),
            (3, ErrorKind::UpstreamRejected),
            (4, ErrorKind::AliasTaken),
            (5, ErrorKind::UpstreamRejected),
            (6, ErrorKind::UpstreamUnavailable),
            (8, ErrorKind::UpstreamRejected),
            (42, ErrorKind::UpstreamRejected),
        ];
        for (status, expected) in cases {
            let body = format!(r#"{{"url":{{"status":{}}}}}"#, status);
            let result = parse_response(StatusCode::OK, &body, URL);
            assert_eq!(result.reason(), Some(expected), "status {}", status);
            assert_eq!(result.original_url(), URL);
        }
    }

    #[test]
    fn test_parse_http_errors() {
        let unavailable = parse_response(StatusCode::SERVICE_UNAVAILABLE, "", URL);
        let throttled = parse_response(StatusCode::TOO_MANY_REQUESTS, "", URL);
        let forbidden = parse_response(StatusCode::FORBIDDEN, "", URL);
        assert_eq!(unavailable.reason(), Some(ErrorKind::UpstreamUnavailable));
        assert_eq!(throttled.reason(), Some(ErrorKind::UpstreamUnavailable));
        assert_eq!(forbidden.reason(), Some(ErrorKind::UpstreamRejected));
    }

    #[test]
    fn test_parse_malformed_body() {
        let html = parse_response(StatusCode::OK, "<html>502 Bad Gateway</html>", URL);
        let missing_link = parse_response(StatusCode::OK, r#"{"url":{"status":7}}"#, URL);
        assert_eq!(html.reason(), Some(ErrorKind::UpstreamUnavailable));
        assert_eq!(missing_link.reason(), Some(ErrorKind::UpstreamUnavailable));
    }

    #[test]
    fn test_tracking_id_from_custom_alias() {
        assert_eq!(tracking_id("https://cutt.ly/mysite"), "mysite");
    }

    /// Serves one canned HTTP response and returns the request line it received.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });
        (format!("http://{}/api/api.php", addr), handle)
    }

    #[tokio::test]
    async fn test_shorten_sends_key_url_and_alias() {
        let body = r#"{"url":{"status":7,"shortLink":"https://cutt.ly/promo-1"}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (api_url, server) = serve_once(response).await;
        let adapter = CuttlyAdapter::new(api_url, "secret".into(), Duration::from_secs(5));
        let alias = Alias::parse("promo-1").unwrap();

        let result = adapter.shorten(URL, Some(&alias)).await;
        let request_line = server.await.unwrap();

        assert!(request_line.starts_with("GET /api/api.php?"), "{}", request_line);
        assert!(request_line.contains("key=secret"));
        assert!(request_line.contains("short=https%3A%2F%2Fexample.com%2Flong"));
        assert!(request_line.contains("name=promo-1"));
        assert_eq!(
            result,
            ShortResult::Success {
                original_url: URL.to_string(),
                short_url: "https://cutt.ly/promo-1".to_string(),
                click_tracking_id: "promo-1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_shorten_without_alias_omits_name() {
        let body = r#"{"url":{"status":4}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (api_url, server) = serve_once(response).await;
        let adapter = CuttlyAdapter::new(api_url, "secret".into(), Duration::from_secs(5));

        let result = adapter.shorten(URL, None).await;

        assert!(!server.await.unwrap().contains("name="));
        assert_eq!(result.reason(), Some(ErrorKind::AliasTaken));
    }

    #[tokio::test]
    async fn test_shorten_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });
        let adapter = CuttlyAdapter::new(
            format!("http://{}/api/api.php", addr),
            "secret".into(),
            Duration::from_millis(50),
        );

        let result = adapter.shorten(URL, None).await;

        assert_eq!(result, ShortResult::failure(ErrorKind::UpstreamTimeout, URL));
        server.abort();
    }

    #[tokio::test]
    async fn test_shorten_connection_refused_is_unavailable() {
        // Bind then drop to get a port with nothing listening.
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let adapter = CuttlyAdapter::new(
            format!("http://{}/api/api.php", addr),
            "secret".into(),
            Duration::from_secs(5),
        );

        let result = adapter.shorten(URL, None).await;

        assert_eq!(result, ShortResult::failure(ErrorKind::UpstreamUnavailable, URL));
    }
}
