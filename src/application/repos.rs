//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{OffsetPage, OffsetRequest};
use crate::domain::entities::{RequestLogRecord, VehicleRecord};
use crate::domain::vehicles::NewVehicle;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Relational store for vehicles. Soft-deleted rows are invisible to every read.
#[async_trait]
pub trait VehiclesRepo: Send + Sync {
    async fn create_vehicle(&self, vehicle: NewVehicle) -> Result<VehicleRecord, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VehicleRecord>, RepoError>;

    /// Newest first.
    async fn list_vehicles(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<VehicleRecord>, RepoError>;

    /// Persists every mutable field of `vehicle` and refreshes `updated_at`.
    /// Returns [`RepoError::NotFound`] when the row is absent or soft-deleted.
    async fn update_vehicle(&self, vehicle: &VehicleRecord) -> Result<VehicleRecord, RepoError>;

    /// Idempotent: an absent or already deleted row is left alone and is not an error.
    async fn soft_delete_vehicle(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait RequestLogsRepo: Send + Sync {
    /// Newest first by request timestamp.
    async fn list_recent(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<RequestLogRecord>, RepoError>;
}

#[async_trait]
pub trait RequestLogsWriteRepo: Send + Sync {
    async fn append(&self, record: &RequestLogRecord) -> Result<(), RepoError>;
}
