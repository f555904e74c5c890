pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::RouterState;

/// Unauthenticated routes: liveness and the API-key exchange.
pub fn build_public_router() -> Router<RouterState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/validate", post(handlers::exchange_api_key))
}

pub fn build_api_router(state: RouterState) -> Router<RouterState> {
    Router::new()
        .route(
            "/api/v1/cars",
            get(handlers::list_vehicles).post(handlers::create_vehicle),
        )
        .route(
            "/api/v1/cars/{id}",
            get(handlers::get_vehicle)
                .put(handlers::update_vehicle)
                .delete(handlers::delete_vehicle),
        )
        .route("/api/v1/logs", get(handlers::list_request_logs))
        .route_layer(axum_middleware::from_fn_with_state(
            state.api,
            middleware::jwt_auth,
        ))
}
