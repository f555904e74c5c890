pub mod api;
mod middleware;

pub use api::ApiState;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use axum::http::{Method, header};
use axum::{Router, middleware as axum_middleware};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::application::queue::LogPublisher;

const CORS_MAX_AGE: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct RouterState {
    pub api: ApiState,
    pub publisher: Arc<dyn LogPublisher>,
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

impl FromRef<RouterState> for Arc<dyn LogPublisher> {
    fn from_ref(state: &RouterState) -> Self {
        state.publisher.clone()
    }
}

/// Assemble the full application router.
///
/// Layers, outermost first: request id, request-log publishing, response
/// diagnostics, panic recovery, CORS, then the request timeout.
pub fn build_router(state: RouterState, request_timeout: Duration) -> Router {
    let publisher = state.publisher.clone();

    api::build_public_router()
        .merge(api::build_api_router(state.clone()))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            request_timeout,
            middleware::enforce_timeout,
        ))
        .layer(cors_layer())
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn_with_state(
            publisher,
            middleware::publish_request_log,
        ))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}
