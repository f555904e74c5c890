#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use motorpool::application::auth::AuthService;
use motorpool::application::pagination::{OffsetPage, OffsetRequest};
use motorpool::application::queue::{LogPublisher, QueueError};
use motorpool::application::repos::{
    RepoError, RequestLogsRepo, RequestLogsWriteRepo, VehiclesRepo,
};
use motorpool::application::request_logs::RequestLogService;
use motorpool::application::vehicles::VehicleService;
use motorpool::cache::{CacheConfig, CacheStore, MemoryStore};
use motorpool::domain::entities::{RequestLogRecord, VehicleRecord};
use motorpool::domain::vehicles::NewVehicle;
use motorpool::infra::http::{self, ApiState, RouterState};

pub const API_KEY: &str = "test-api-key";
pub const JWT_SECRET: &str = "test-jwt-secret";

#[derive(Default)]
pub struct InMemoryVehicles {
    records: Mutex<Vec<VehicleRecord>>,
    delay: Option<Duration>,
}

impl InMemoryVehicles {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl VehiclesRepo for InMemoryVehicles {
    async fn create_vehicle(&self, vehicle: NewVehicle) -> Result<VehicleRecord, RepoError> {
        self.pause().await;
        let now = OffsetDateTime::now_utc();
        let record = VehicleRecord {
            id: Uuid::new_v4(),
            brand: vehicle.brand,
            model: vehicle.model,
            year: vehicle.year,
            color: vehicle.color,
            price: vehicle.price,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.records.lock().expect("lock").push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VehicleRecord>, RepoError> {
        self.pause().await;
        Ok(self
            .records
            .lock()
            .expect("lock")
            .iter()
            .find(|record| record.id == id && !record.is_deleted())
            .cloned())
    }

    async fn list_vehicles(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<VehicleRecord>, RepoError> {
        self.pause().await;
        let mut live: Vec<_> = self
            .records
            .lock()
            .expect("lock")
            .iter()
            .filter(|record| !record.is_deleted())
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = live.len() as u64;
        let records = live
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(OffsetPage::new(records, total))
    }

    async fn update_vehicle(&self, vehicle: &VehicleRecord) -> Result<VehicleRecord, RepoError> {
        self.pause().await;
        let mut records = self.records.lock().expect("lock");
        let stored = records
            .iter_mut()
            .find(|record| record.id == vehicle.id && !record.is_deleted())
            .ok_or(RepoError::NotFound)?;

        *stored = VehicleRecord {
            updated_at: OffsetDateTime::now_utc(),
            created_at: stored.created_at,
            deleted_at: None,
            ..vehicle.clone()
        };
        Ok(stored.clone())
    }

    async fn soft_delete_vehicle(&self, id: Uuid) -> Result<(), RepoError> {
        self.pause().await;
        let mut records = self.records.lock().expect("lock");
        if let Some(stored) = records
            .iter_mut()
            .find(|record| record.id == id && !record.is_deleted())
        {
            stored.deleted_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRequestLogs {
    records: Mutex<Vec<RequestLogRecord>>,
}

impl InMemoryRequestLogs {
    pub fn len(&self) -> usize {
        self.records.lock().expect("lock").len()
    }
}

#[async_trait]
impl RequestLogsRepo for InMemoryRequestLogs {
    async fn list_recent(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<RequestLogRecord>, RepoError> {
        let mut records = self.records.lock().expect("lock").clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = records.len() as u64;
        let records = records
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(OffsetPage::new(records, total))
    }
}

#[async_trait]
impl RequestLogsWriteRepo for InMemoryRequestLogs {
    async fn append(&self, record: &RequestLogRecord) -> Result<(), RepoError> {
        self.records.lock().expect("lock").push(record.clone());
        Ok(())
    }
}

/// Keeps every published record in memory.
#[derive(Default)]
pub struct RecordingPublisher {
    records: Mutex<Vec<RequestLogRecord>>,
}

impl RecordingPublisher {
    pub fn records(&self) -> Vec<RequestLogRecord> {
        self.records.lock().expect("lock").clone()
    }
}

impl LogPublisher for RecordingPublisher {
    fn publish(&self, record: &RequestLogRecord) -> Result<(), QueueError> {
        self.records.lock().expect("lock").push(record.clone());
        Ok(())
    }

    fn close(&self, _timeout: Duration) -> Result<(), QueueError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub vehicles: Arc<InMemoryVehicles>,
    pub logs: Arc<InMemoryRequestLogs>,
    pub cache: Arc<MemoryStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub auth: Arc<AuthService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_parts(InMemoryVehicles::default(), Duration::from_secs(30))
    }

    pub fn with_parts(vehicles: InMemoryVehicles, request_timeout: Duration) -> Self {
        let vehicles = Arc::new(vehicles);
        let logs = Arc::new(InMemoryRequestLogs::default());
        let cache = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let auth = Arc::new(AuthService::new(
            API_KEY,
            JWT_SECRET,
            Duration::from_secs(24 * 60 * 60),
        ));

        let vehicles_repo: Arc<dyn VehiclesRepo> = vehicles.clone();
        let cache_store: Arc<dyn CacheStore> = cache.clone();
        let logs_repo: Arc<dyn RequestLogsRepo> = logs.clone();
        let log_publisher: Arc<dyn LogPublisher> = publisher.clone();

        let state = RouterState {
            api: ApiState {
                vehicles: Arc::new(VehicleService::new(
                    vehicles_repo,
                    cache_store,
                    CacheConfig::default(),
                )),
                request_logs: Arc::new(RequestLogService::new(logs_repo)),
                auth: auth.clone(),
            },
            publisher: log_publisher,
        };

        Self {
            router: http::build_router(state, request_timeout),
            vehicles,
            logs,
            cache,
            publisher,
            auth,
        }
    }

    pub fn token(&self) -> String {
        self.auth.exchange(API_KEY).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
