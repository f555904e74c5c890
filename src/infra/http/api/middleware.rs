use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::error::ApiError;
use super::state::ApiState;

/// Requires a valid bearer token and stores its claims in request extensions.
pub async fn jwt_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match request.headers().get(AUTHORIZATION) {
        None => return ApiError::unauthorized("missing authorization header").into_response(),
        Some(header) => match extract_bearer(header) {
            Some(token) => token,
            None => {
                return ApiError::unauthorized("invalid authorization format").into_response();
            }
        },
    };

    let claims = match state.auth.validate(&token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!(
                target = "motorpool::http::auth",
                error = %err,
                "bearer token rejected"
            );
            return ApiError::unauthorized("invalid or expired token")
                .with_error(&err)
                .into_response();
        }
    };

    request.extensions_mut().insert(claims);
    next.run(request).await
}

fn extract_bearer(header: &HeaderValue) -> Option<String> {
    let raw = header.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
