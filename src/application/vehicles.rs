//! Vehicle orchestration: cache-aside reads over the relational store,
//! invalidation on every write.

use std::sync::Arc;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::pagination::{OffsetPage, OffsetRequest};
use crate::application::repos::{RepoError, VehiclesRepo};
use crate::cache::{
    CacheConfig, CacheError, CacheStore, VEHICLE_LIST_PATTERN, decode_entry, encode_entry,
    vehicle_key, vehicle_list_key,
};
use crate::domain::entities::VehicleRecord;
use crate::domain::vehicles::{NewVehicle, VehiclePatch};
use crate::infra::telemetry::{CACHE_ERROR, CACHE_HIT, CACHE_MISS};

const SOURCE: &str = "motorpool::application::vehicles";

#[derive(Debug, Error)]
pub enum VehicleServiceError {
    #[error("vehicle not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
    #[error("vehicle cache read failed")]
    Cache(#[source] CacheError),
}

impl From<RepoError> for VehicleServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

#[derive(Clone)]
pub struct VehicleService {
    repo: Arc<dyn VehiclesRepo>,
    cache: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl VehicleService {
    pub fn new(
        repo: Arc<dyn VehiclesRepo>,
        cache: Arc<dyn CacheStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }

    /// Persist a new vehicle. The single-record cache is not pre-populated.
    pub async fn create(&self, input: NewVehicle) -> Result<VehicleRecord, VehicleServiceError> {
        let record = self.repo.create_vehicle(input).await?;
        self.invalidate_listings().await;

        info!(target = SOURCE, vehicle_id = %record.id, "vehicle created");
        Ok(record)
    }

    /// A cache backend failure other than a miss is returned to the caller;
    /// an undecodable entry is treated as a miss.
    pub async fn get_by_id(&self, id: Uuid) -> Result<VehicleRecord, VehicleServiceError> {
        let key = vehicle_key(id);

        match self.cache.get(&key).await {
            Ok(Some(payload)) => {
                if let Some(record) = decode_or_discard::<VehicleRecord>(&key, &payload) {
                    counter!(CACHE_HIT).increment(1);
                    return Ok(record);
                }
            }
            Ok(None) => {}
            Err(err) => {
                counter!(CACHE_ERROR).increment(1);
                warn!(target = SOURCE, key = %key, error = %err, "vehicle cache read failed");
                return Err(VehicleServiceError::Cache(err));
            }
        }

        counter!(CACHE_MISS).increment(1);
        let record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(VehicleServiceError::NotFound)?;

        self.populate(&key, &record).await;
        Ok(record)
    }

    /// Cache failures on listings degrade to a miss.
    pub async fn list(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<VehicleRecord>, VehicleServiceError> {
        let key = vehicle_list_key(&page);

        match self.cache.get(&key).await {
            Ok(Some(payload)) => {
                if let Some(listing) = decode_or_discard::<OffsetPage<VehicleRecord>>(&key, &payload)
                {
                    counter!(CACHE_HIT).increment(1);
                    return Ok(listing);
                }
            }
            Ok(None) => {}
            Err(err) => {
                counter!(CACHE_ERROR).increment(1);
                warn!(target = SOURCE, key = %key, error = %err, "listing cache read failed");
            }
        }

        counter!(CACHE_MISS).increment(1);
        let listing = self.repo.list_vehicles(page).await?;

        self.populate(&key, &listing).await;
        Ok(listing)
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: VehiclePatch,
    ) -> Result<VehicleRecord, VehicleServiceError> {
        let mut record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(VehicleServiceError::NotFound)?;
        if patch.is_empty() {
            debug!(target = SOURCE, vehicle_id = %id, "empty patch; nothing to write");
            return Ok(record);
        }
        patch.apply_to(&mut record);

        let updated = self.repo.update_vehicle(&record).await?;
        self.invalidate_vehicle(id).await;
        self.invalidate_listings().await;

        info!(target = SOURCE, vehicle_id = %id, "vehicle updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), VehicleServiceError> {
        self.repo.soft_delete_vehicle(id).await?;
        self.invalidate_vehicle(id).await;
        self.invalidate_listings().await;

        info!(target = SOURCE, vehicle_id = %id, "vehicle deleted");
        Ok(())
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match encode_entry(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target = SOURCE, key, error = %err, "failed to encode cache entry");
                return;
            }
        };

        if let Err(err) = self.cache.set_with_ttl(key, payload, self.config.ttl).await {
            counter!(CACHE_ERROR).increment(1);
            warn!(target = SOURCE, key, error = %err, "failed to populate cache");
        }
    }

    async fn invalidate_vehicle(&self, id: Uuid) {
        let key = vehicle_key(id);
        if let Err(err) = self.cache.delete(&key).await {
            counter!(CACHE_ERROR).increment(1);
            warn!(target = SOURCE, key = %key, error = %err, "failed to invalidate vehicle");
        }
    }

    async fn invalidate_listings(&self) {
        match self.cache.delete_pattern(VEHICLE_LIST_PATTERN).await {
            Ok(removed) => debug!(target = SOURCE, removed, "listing cache invalidated"),
            Err(err) => {
                counter!(CACHE_ERROR).increment(1);
                warn!(target = SOURCE, error = %err, "failed to invalidate listings");
            }
        }
    }
}

fn decode_or_discard<T: DeserializeOwned>(key: &str, payload: &str) -> Option<T> {
    match decode_entry(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(target = SOURCE, key, error = %err, "discarding undecodable cache entry");
            None
        }
    }
}
