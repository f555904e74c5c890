//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, ConnectionInfo, Pool, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::infra::error::InfraError;

use super::store::{CacheError, CacheStore};

const SCAN_BATCH: usize = 100;

#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build the pool and verify the server answers before accepting traffic.
    pub async fn connect(connection: ConnectionInfo) -> Result<Self, InfraError> {
        let pool = Config::from_connection_info(connection)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| InfraError::cache(format!("failed to create redis pool: {err}")))?;

        let store = Self { pool };
        store
            .ping()
            .await
            .map_err(|err| InfraError::cache(format!("redis did not answer PING: {err}")))?;

        info!(target = "motorpool::cache::redis", "connected to redis");
        Ok(store)
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::backend)?;
        Ok(())
    }

    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool.get().await.map_err(CacheError::backend)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(CacheError::backend)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await.map_err(CacheError::backend)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(CacheError::backend)?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await.map_err(CacheError::backend)?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(
            target = "motorpool::cache::redis",
            pattern,
            removed,
            "pattern delete finished"
        );
        Ok(removed)
    }
}
