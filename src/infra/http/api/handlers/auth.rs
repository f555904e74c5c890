//! API-key to bearer-token exchange.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;

use crate::application::auth::AuthError;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{DataEnvelope, TokenRequest, TokenResponse};
use crate::infra::http::api::state::ApiState;

use super::body_rejection;

pub async fn exchange_api_key(
    State(state): State<ApiState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(body_rejection)?;

    let token = state
        .auth
        .exchange(&request.api_key)
        .map_err(|err| match err {
            AuthError::MissingKey => ApiError::validation("api_key is required"),
            AuthError::InvalidKey => ApiError::unauthorized("invalid api key"),
            AuthError::InvalidToken(_) | AuthError::Signing(_) => {
                ApiError::internal("failed to generate token").with_error(&err)
            }
        })?;

    Ok(Json(DataEnvelope::new(TokenResponse { token })))
}
