//! Queue contracts for the request-log pipeline.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::RequestLogRecord;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to encode request log: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("queue transport error: {0}")]
    Transport(String),
    #[error("queue buffer is full")]
    Full,
    #[error("queue is closed")]
    Closed,
}

impl QueueError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Fire-and-forget producer side.
///
/// `publish` only enqueues into an internal buffer and never waits for the broker.
pub trait LogPublisher: Send + Sync {
    fn publish(&self, record: &RequestLogRecord) -> Result<(), QueueError>;

    /// Flush whatever is still buffered, waiting at most `timeout`.
    fn close(&self, timeout: Duration) -> Result<(), QueueError>;
}

/// Consumer side: yields raw payloads in topic order.
#[async_trait]
pub trait LogSource: Send {
    /// [`QueueError::Closed`] means no further payloads will ever arrive.
    async fn next_payload(&mut self) -> Result<Vec<u8>, QueueError>;
}

pub fn encode_record(record: &RequestLogRecord) -> Result<Vec<u8>, QueueError> {
    Ok(serde_json::to_vec(record)?)
}
