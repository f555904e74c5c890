//! In-process cache store for development and tests.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::keys::glob_match;
use super::store::{CacheError, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// DashMap-backed store. Expired entries are evicted lazily on read.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.expires_at > now).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.entries
                    .remove_if(key, |_, entry| entry.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let matches = glob_match(pattern, key);
            if matches {
                removed += 1;
            }
            !matches
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn miss_is_not_an_error() {
        let store = MemoryStore::new();
        assert_eq!(store.get("vehicles:missing").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("vehicles:1", "{}".to_string(), TTL)
            .await
            .expect("set");
        assert_eq!(
            store.get("vehicles:1").await.expect("get").as_deref(),
            Some("{}")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("vehicles:1", "{}".to_string(), Duration::from_secs(5))
            .await
            .expect("set");

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.get("vehicles:1").await.expect("get").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("vehicles:1").await.expect("get").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn pattern_delete_spares_other_keys() {
        let store = MemoryStore::new();
        for key in ["vehicles:list:0:10", "vehicles:list:10:10", "vehicles:abc"] {
            store
                .set_with_ttl(key, "[]".to_string(), TTL)
                .await
                .expect("set");
        }

        let removed = store
            .delete_pattern("vehicles:list:*")
            .await
            .expect("delete pattern");

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("vehicles:abc").await.expect("get").is_some());
    }

    #[tokio::test]
    async fn delete_removes_a_single_key() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("vehicles:1", "{}".to_string(), TTL)
            .await
            .expect("set");
        store.delete("vehicles:1").await.expect("delete");
        store.delete("vehicles:1").await.expect("delete twice");
        assert!(store.is_empty());
    }
}
