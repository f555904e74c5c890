//! Cache configuration.

use std::time::Duration;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Lifetime of every entry written by the vehicle service.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self { ttl: settings.ttl }
    }
}
