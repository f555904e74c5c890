//! Request-log read path and the long-running queue consumer.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::pagination::{OffsetPage, OffsetRequest};
use crate::application::queue::{LogSource, QueueError};
use crate::application::repos::{RepoError, RequestLogsRepo, RequestLogsWriteRepo};
use crate::domain::entities::RequestLogRecord;
use crate::infra::telemetry::{
    REQUEST_LOG_CONSUMED, REQUEST_LOG_DROPPED, REQUEST_LOG_INSERT_FAILED,
};

const SOURCE: &str = "motorpool::application::request_logs";

#[derive(Clone)]
pub struct RequestLogService {
    repo: Arc<dyn RequestLogsRepo>,
}

impl RequestLogService {
    pub fn new(repo: Arc<dyn RequestLogsRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<RequestLogRecord>, RepoError> {
        self.repo.list_recent(page).await
    }
}

/// Exponential retry delay for transient pull failures.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}

/// Per-run tallies, mirrored by the `motorpool_request_log_*` counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub consumed: u64,
    pub dropped: u64,
    pub failed: u64,
}

/// Moves records from the queue into the document store until cancelled.
///
/// Malformed payloads are dropped and failed inserts are not retried; either
/// way the message counts as consumed so the loop never stalls.
pub struct RequestLogConsumer {
    source: Box<dyn LogSource>,
    sink: Arc<dyn RequestLogsWriteRepo>,
    backoff: Backoff,
    stats: ConsumerStats,
}

impl RequestLogConsumer {
    pub fn new(source: Box<dyn LogSource>, sink: Arc<dyn RequestLogsWriteRepo>) -> Self {
        Self {
            source,
            sink,
            backoff: Backoff::default(),
            stats: ConsumerStats::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn run(mut self, shutdown: CancellationToken) -> ConsumerStats {
        info!(target = SOURCE, "request-log consumer started");

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.source.next_payload() => next,
            };

            match next {
                Ok(payload) => {
                    self.backoff.reset();
                    self.handle(&payload).await;
                }
                Err(QueueError::Closed) => {
                    info!(target = SOURCE, "request-log source closed");
                    break;
                }
                Err(err) => {
                    let delay = self.backoff.next_delay();
                    warn!(
                        target = SOURCE,
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "failed to pull request log"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(
            target = SOURCE,
            consumed = self.stats.consumed,
            dropped = self.stats.dropped,
            failed = self.stats.failed,
            "request-log consumer stopped"
        );
        self.stats
    }

    async fn handle(&mut self, payload: &[u8]) {
        let record: RequestLogRecord = match serde_json::from_slice(payload) {
            Ok(record) => record,
            Err(err) => {
                self.stats.dropped += 1;
                counter!(REQUEST_LOG_DROPPED).increment(1);
                warn!(
                    target = SOURCE,
                    error = %err,
                    bytes = payload.len(),
                    "dropping malformed request log"
                );
                return;
            }
        };

        match self.sink.append(&record).await {
            Ok(()) => {
                self.stats.consumed += 1;
                counter!(REQUEST_LOG_CONSUMED).increment(1);
                debug!(
                    target = SOURCE,
                    method = %record.method,
                    path = %record.path,
                    status = record.status_code,
                    "request log stored"
                );
            }
            Err(err) => {
                self.stats.failed += 1;
                counter!(REQUEST_LOG_INSERT_FAILED).increment(1);
                warn!(target = SOURCE, error = %err, "failed to store request log");
            }
        }
    }
}
