//! Bulk processor: validate batch size -> fan out through the admission gate
//! -> retry transient failures once -> record successes.
//!
//! - Output order always matches input order (results land in slots indexed by position)
//! - One failing URL never aborts its siblings
//! - Usage store is touched only after every item resolved

use crate::domain::{BatchResult, ErrorKind, ShortResult, ShortenRequest, UserId};
use crate::ports::UsageStorePort;
use crate::usecases::shortening_client::ShorteningClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Limits applied by the bulk processor.
#[derive(Debug, Clone, Copy)]
pub struct BulkPolicy {
    /// Outbound calls allowed in flight at once.
    pub max_concurrency: usize,
    /// Larger batches are rejected with `BatchTooLarge` before any call.
    pub max_batch_size: usize,
    /// Pause before the single retry of a transient failure.
    pub retry_backoff: Duration,
}

/// Bulk processor. Shares one admission gate across all batches.
pub struct BulkProcessor {
    client: Arc<ShorteningClient>,
    store: Arc<dyn UsageStorePort>,
    gate: Arc<Semaphore>,
    policy: BulkPolicy,
}

impl BulkProcessor {
    pub fn new(
        client: Arc<ShorteningClient>,
        store: Arc<dyn UsageStorePort>,
        policy: BulkPolicy,
    ) -> Self {
        Self {
            client,
            store,
            gate: Arc::new(Semaphore::new(policy.max_concurrency.max(1))),
            policy,
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.policy.max_batch_size
    }

    /// Shorten every URL in `urls` for `requester_id`.
    ///
    /// Returns one result per input URL, in input order, duplicates included.
    /// Errors only with `BatchTooLarge`, before any outbound call.
    pub async fn process(
        &self,
        urls: &[String],
        requester_id: UserId,
    ) -> Result<BatchResult, ErrorKind> {
        if urls.len() > self.policy.max_batch_size {
            warn!(
                user_id = %requester_id,
                count = urls.len(),
                max = self.policy.max_batch_size,
                "batch rejected: too large"
            );
            return Err(ErrorKind::BatchTooLarge);
        }
        let requests = urls
            .iter()
            .map(|u| ShortenRequest::new(u.clone(), requester_id))
            .collect();
        Ok(self.run(requests, requester_id).await)
    }

    /// Shorten a single request (optionally with alias) through the same gate, retry and accounting.
    pub async fn shorten_one(&self, request: ShortenRequest) -> ShortResult {
        let requester_id = request.requester_id;
        let url = request.original_url.clone();
        self.run(vec![request], requester_id)
            .await
            .into_inner()
            .into_iter()
            .next()
            .unwrap_or_else(|| ShortResult::failure(ErrorKind::UpstreamUnavailable, url))
    }

    async fn run(&self, requests: Vec<ShortenRequest>, requester_id: UserId) -> BatchResult {
        // Pre-sized slots; a task that dies without reporting leaves its placeholder failure.
        let mut slots: Vec<ShortResult> = requests
            .iter()
            .map(|r| ShortResult::failure(ErrorKind::UpstreamUnavailable, r.original_url.clone()))
            .collect();

        // Dropping this future detaches in-flight tasks; their results never reach the store.
        let mut handles = Vec::with_capacity(requests.len());
        for (idx, request) in requests.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            let gate = Arc::clone(&self.gate);
            let backoff = self.policy.retry_backoff;
            handles.push((
                idx,
                tokio::spawn(async move {
                    attempt_with_retry(&client, &gate, &request, backoff).await
                }),
            ));
        }

        for (idx, handle) in handles {
            match handle.await {
                Ok(result) => slots[idx] = result,
                Err(e) => error!(user_id = %requester_id, idx, error = %e, "shortening task failed"),
            }
        }

        let batch = BatchResult::new(slots);
        info!(
            user_id = %requester_id,
            total = batch.len(),
            succeeded = batch.success_count(),
            failed = batch.failure_count(),
            "batch complete"
        );

        if batch.success_count() > 0 {
            if let Err(e) = self.store.record(requester_id, batch.as_slice()).await {
                warn!(user_id = %requester_id, error = %e, "failed to record usage");
            }
        }
        batch
    }
}

/// One attempt, holding a gate permit only while the call is in flight.
async fn attempt(client: &ShorteningClient, gate: &Semaphore, request: &ShortenRequest) -> ShortResult {
    let _permit = match gate.acquire().await {
        Ok(p) => p,
        Err(_) => {
            return ShortResult::failure(ErrorKind::UpstreamUnavailable, request.original_url.clone());
        }
    };
    client.shorten(request).await
}

/// Transient failures get exactly one more attempt after `backoff`.
async fn attempt_with_retry(
    client: &ShorteningClient,
    gate: &Semaphore,
    request: &ShortenRequest,
    backoff: Duration,
) -> ShortResult {
    let first = attempt(client, gate, request).await;
    match first.reason() {
        Some(kind) if kind.is_transient() => {
            debug!(url = %request.original_url, ?kind, backoff_ms = backoff.as_millis() as u64, "retrying once");
            tokio::time::sleep(backoff).await;
            attempt(client, gate, request).await
        }
        _ => first,
    }
}
