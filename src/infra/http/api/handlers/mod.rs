//! API handlers grouped by resource.
//!
//! Error conversion helpers shared by the resources live here.

mod auth;
mod health;
mod logs;
mod vehicles;

pub use auth::*;
pub use health::*;
pub use logs::*;
pub use vehicles::*;

use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::application::vehicles::VehicleServiceError;

use super::error::ApiError;

pub(crate) fn vehicle_to_api(err: VehicleServiceError, failure: &'static str) -> ApiError {
    match err {
        VehicleServiceError::NotFound => ApiError::not_found("car not found"),
        VehicleServiceError::Repo(ref repo) => repo_to_api(repo, failure).with_error(&err),
        VehicleServiceError::Cache(_) => ApiError::internal(failure).with_error(&err),
    }
}

pub(crate) fn repo_to_api(err: &RepoError, failure: &'static str) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { .. } | RepoError::Duplicate { .. } => {
            ApiError::validation("invalid input").with_error(err)
        }
        RepoError::Persistence(_) | RepoError::Timeout => {
            ApiError::internal(failure).with_error(err)
        }
    }
}

pub(crate) fn body_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("invalid request body").with_error(&rejection)
}

pub(crate) fn vehicle_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request("invalid car id").with_error(&rejection))
}
