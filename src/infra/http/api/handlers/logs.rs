use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::application::pagination::DEFAULT_REQUEST_LOG_LIMIT;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{OffsetQuery, PageEnvelope};
use crate::infra::http::api::state::ApiState;

use super::repo_to_api;

pub async fn list_request_logs(
    State(state): State<ApiState>,
    query: Result<Query<OffsetQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query
        .map(|Query(query)| query)
        .unwrap_or_default()
        .into_request(DEFAULT_REQUEST_LOG_LIMIT);

    let logs = state
        .request_logs
        .list(page)
        .await
        .map_err(|err| repo_to_api(&err, "failed to list logs"))?;

    Ok(Json(PageEnvelope::new(logs, page)))
}
