//! Cache storage contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Encode a value for storage. Entries are JSON text.
pub fn encode_entry<T: Serialize>(value: &T) -> Result<String, CacheError> {
    Ok(serde_json::to_string(value)?)
}

pub fn decode_entry<T: DeserializeOwned>(payload: &str) -> Result<T, CacheError> {
    Ok(serde_json::from_str(payload)?)
}

/// String key/value store with per-entry expiry.
///
/// A miss is `Ok(None)`, never an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration)
    -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every key matching a glob with `*` wildcards and returns how many went.
    /// Not atomic against concurrent writers.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError>;
}
