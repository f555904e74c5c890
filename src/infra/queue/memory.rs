//! In-process topic for development and tests.

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::application::queue::{LogPublisher, LogSource, QueueError, encode_record};
use crate::domain::entities::RequestLogRecord;
use crate::infra::telemetry::REQUEST_LOG_PUBLISHED;

/// Bounded channel standing in for a broker topic with a single consumer.
pub fn memory_topic(capacity: NonZeroUsize) -> (MemoryLogPublisher, MemoryLogSource) {
    let (tx, rx) = mpsc::channel(capacity.get());
    (MemoryLogPublisher { tx }, MemoryLogSource { rx })
}

#[derive(Clone)]
pub struct MemoryLogPublisher {
    tx: mpsc::Sender<Vec<u8>>,
}

impl MemoryLogPublisher {
    /// Enqueue bytes as-is, bypassing record encoding.
    pub fn publish_raw(&self, payload: Vec<u8>) -> Result<(), QueueError> {
        self.tx.try_send(payload).map_err(|err| match err {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

impl LogPublisher for MemoryLogPublisher {
    fn publish(&self, record: &RequestLogRecord) -> Result<(), QueueError> {
        self.publish_raw(encode_record(record)?)?;
        counter!(REQUEST_LOG_PUBLISHED).increment(1);
        Ok(())
    }

    fn close(&self, _timeout: Duration) -> Result<(), QueueError> {
        Ok(())
    }
}

pub struct MemoryLogSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl LogSource for MemoryLogSource {
    async fn next_payload(&mut self) -> Result<Vec<u8>, QueueError> {
        self.rx.recv().await.ok_or(QueueError::Closed)
    }
}
