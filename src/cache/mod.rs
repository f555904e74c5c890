//! Vehicle cache
//!
//! A derived, disposable view over the relational store. Reads populate it
//! (cache-aside), writes only invalidate:
//!
//! - `vehicles:<id>` holds one serialized vehicle
//! - `vehicles:list:<offset>:<limit>` holds one serialized listing page
//!
//! Every entry carries the same TTL, configured via `[cache]`:
//!
//! ```toml
//! [cache]
//! backend = "redis"   # or "memory"
//! ttl_seconds = 300
//! ```

mod config;
mod keys;
mod memory;
mod redis_store;
mod store;

pub use config::CacheConfig;
pub use keys::{VEHICLE_LIST_PATTERN, glob_match, vehicle_key, vehicle_list_key};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{CacheError, CacheStore, decode_entry, encode_entry};
