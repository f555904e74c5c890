//! Vehicle CRUD handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::pagination::DEFAULT_VEHICLE_LIMIT;
use crate::domain::vehicles::NewVehicle;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    CreateVehicleRequest, DataEnvelope, OffsetQuery, PageEnvelope, UpdateVehicleRequest,
};
use crate::infra::http::api::state::ApiState;

use super::{body_rejection, vehicle_id, vehicle_to_api};

pub async fn create_vehicle(
    State(state): State<ApiState>,
    payload: Result<Json<CreateVehicleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(body_rejection)?;

    let input = NewVehicle::new(
        request.brand,
        request.model,
        request.year,
        request.color,
        request.price,
    )
    .map_err(|err| ApiError::validation("brand, model, and year are required").with_error(&err))?;

    let record = state
        .vehicles
        .create(input)
        .await
        .map_err(|err| vehicle_to_api(err, "failed to create car"))?;

    Ok((StatusCode::CREATED, Json(DataEnvelope::new(record))))
}

pub async fn list_vehicles(
    State(state): State<ApiState>,
    query: Result<Query<OffsetQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query
        .map(|Query(query)| query)
        .unwrap_or_default()
        .into_request(DEFAULT_VEHICLE_LIMIT);

    let listing = state
        .vehicles
        .list(page)
        .await
        .map_err(|err| vehicle_to_api(err, "failed to list cars"))?;

    Ok(Json(PageEnvelope::new(listing, page)))
}

pub async fn get_vehicle(
    State(state): State<ApiState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = vehicle_id(path)?;

    let record = state
        .vehicles
        .get_by_id(id)
        .await
        .map_err(|err| vehicle_to_api(err, "failed to get car"))?;

    Ok(Json(DataEnvelope::new(record)))
}

pub async fn update_vehicle(
    State(state): State<ApiState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateVehicleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = vehicle_id(path)?;
    let Json(request) = payload.map_err(body_rejection)?;

    let record = state
        .vehicles
        .update(id, request.into())
        .await
        .map_err(|err| vehicle_to_api(err, "failed to update car"))?;

    Ok(Json(DataEnvelope::new(record)))
}

pub async fn delete_vehicle(
    State(state): State<ApiState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = vehicle_id(path)?;

    state
        .vehicles
        .delete(id)
        .await
        .map_err(|err| vehicle_to_api(err, "failed to delete car"))?;

    Ok(StatusCode::NO_CONTENT)
}
