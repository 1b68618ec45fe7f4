//! Shortening client. Validates input and bounds one outbound call with a timeout.
//!
//! Never fails: every outcome is a `ShortResult`. No retries here; the bulk
//! processor owns retry policy so the admission gate covers retries too.

use crate::domain::{ErrorKind, ShortResult, ShortenRequest, validate_url};
use crate::ports::ShortenerPort;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ShorteningClient {
    shortener: Arc<dyn ShortenerPort>,
    timeout: Duration,
}

impl ShorteningClient {
    pub fn new(shortener: Arc<dyn ShortenerPort>, timeout: Duration) -> Self {
        Self { shortener, timeout }
    }

    /// Shorten one URL. Malformed URLs fail with `InvalidUrl` before any outbound call.
    pub async fn shorten(&self, request: &ShortenRequest) -> ShortResult {
        let url = request.original_url.as_str();
        if let Err(kind) = validate_url(url) {
            debug!(url, "rejected before outbound call");
            return ShortResult::failure(kind, url);
        }

        match tokio::time::timeout(self.timeout, self.shortener.shorten(url, request.alias.as_ref()))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    url,
                    user_id = %request.requester_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "shortening call timed out"
                );
                ShortResult::failure(ErrorKind::UpstreamTimeout, url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::shortener::{MockOutcome, MockShortener};
    use crate::domain::{Alias, UserId};

    fn client(mock: &Arc<MockShortener>, timeout: Duration) -> ShorteningClient {
        ShorteningClient::new(Arc::clone(mock) as Arc<dyn ShortenerPort>, timeout)
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_outbound_call() {
        let mock = Arc::new(MockShortener::new());
        let c = client(&mock, Duration::from_secs(1));

        let result = c.shorten(&ShortenRequest::new("not a url", UserId(1))).await;

        assert_eq!(result, ShortResult::failure(ErrorKind::InvalidUrl, "not a url"));
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_timeout_becomes_upstream_timeout() {
        let mock = Arc::new(
            MockShortener::new().script("https://slow.com", [MockOutcome::Stall(Duration::from_secs(5))]),
        );
        let c = client(&mock, Duration::from_millis(20));

        let result = c.shorten(&ShortenRequest::new("https://slow.com", UserId(1))).await;

        assert_eq!(
            result,
            ShortResult::failure(ErrorKind::UpstreamTimeout, "https://slow.com")
        );
    }

    #[tokio::test]
    async fn test_alias_is_forwarded() {
        let mock = Arc::new(MockShortener::new());
        let c = client(&mock, Duration::from_secs(1));
        let req = ShortenRequest::new("https://a.com", UserId(1))
            .with_alias(Alias::parse("promo-1").unwrap());

        let result = c.shorten(&req).await;

        assert!(matches!(result, ShortResult::Success { ref click_tracking_id, .. } if click_tracking_id == "promo-1"));
    }
}
