//! Request and response payloads for the JSON API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::pagination::{OffsetPage, OffsetRequest};
use crate::domain::vehicles::VehiclePatch;

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u32,
}

impl<T> PageEnvelope<T> {
    pub fn new(page: OffsetPage<T>, request: OffsetRequest) -> Self {
        Self {
            data: page.records,
            total: page.total,
            offset: request.offset(),
            limit: request.limit(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Missing required fields deserialize to their zero value so validation,
/// not the JSON decoder, reports them.
#[derive(Debug, Default, Deserialize)]
pub struct CreateVehicleRequest {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: i32,
    pub color: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateVehicleRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub price: Option<Decimal>,
}

impl From<UpdateVehicleRequest> for VehiclePatch {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            brand: request.brand,
            model: request.model,
            year: request.year,
            color: request.color,
            price: request.price,
        }
    }
}

/// Raw strings so non-numeric values fall back to defaults instead of failing.
#[derive(Debug, Default, Deserialize)]
pub struct OffsetQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl OffsetQuery {
    pub fn into_request(self, default_limit: u32) -> OffsetRequest {
        OffsetRequest::new(
            parse_lenient(self.offset.as_deref()),
            parse_lenient(self.limit.as_deref()),
            default_limit,
        )
    }
}

fn parse_lenient(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}
