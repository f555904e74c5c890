use axum::Json;
use axum::response::IntoResponse;

use crate::infra::http::api::models::HealthResponse;

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
