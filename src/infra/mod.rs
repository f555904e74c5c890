//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod documents;
pub mod error;
pub mod http;
pub mod queue;
pub mod telemetry;
