use std::borrow::Cow;
use std::error::Error as StdError;

use crate::application::error::ErrorReport;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: &'static str,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation_failed";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const TIMEOUT: &str = "timeout";
    pub const INTERNAL: &str = "internal_error";
}

/// Public error response. `detail` feeds the attached `ErrorReport` and never
/// reaches the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: Cow<'static, str>,
    detail: Vec<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            detail: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message)
    }

    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::VALIDATION, message)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    pub fn timeout() -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            codes::TIMEOUT,
            "request timed out",
        )
    }

    pub fn internal(message: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL, message)
    }

    /// Records the error chain for the response log.
    pub fn with_error(mut self, error: &dyn StdError) -> Self {
        self.detail = ErrorReport::from_error("infra::http::api", self.status, error).messages;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = if self.detail.is_empty() {
            ErrorReport::from_message(
                "infra::http::api",
                self.status,
                format!("{}: {}", self.code, self.message),
            )
        } else {
            ErrorReport {
                source: "infra::http::api",
                status: self.status,
                messages: self.detail,
            }
        };

        let body = ApiErrorBody {
            error: self.message.into_owned(),
            code: self.code,
        };
        let mut response = (self.status, Json(body)).into_response();
        // Shared logging middleware reads this to emit the full chain.
        report.attach(&mut response);
        response
    }
}
