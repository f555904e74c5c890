//! Application services orchestrating domain logic.

pub mod auth;
pub mod error;
pub mod pagination;
pub mod queue;
pub mod repos;
pub mod request_logs;
pub mod vehicles;
