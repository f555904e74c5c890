//! MongoDB-backed request-log store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{DateTime, doc, oid::ObjectId},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::application::pagination::{OffsetPage, OffsetRequest};
use crate::application::repos::{RepoError, RequestLogsRepo, RequestLogsWriteRepo};
use crate::config::DocumentSettings;
use crate::domain::entities::RequestLogRecord;

use super::error::InfraError;

/// Stored shape; `timestamp` is a native BSON date so it sorts and indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RequestLogDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    method: String,
    path: String,
    status_code: i32,
    duration_ms: i64,
    ip: String,
    user_agent: String,
    timestamp: DateTime,
}

impl From<&RequestLogRecord> for RequestLogDocument {
    fn from(record: &RequestLogRecord) -> Self {
        let millis = record.timestamp.unix_timestamp_nanos() / 1_000_000;
        Self {
            id: None,
            method: record.method.clone(),
            path: record.path.clone(),
            status_code: i32::from(record.status_code),
            duration_ms: i64::try_from(record.duration_ms).unwrap_or(i64::MAX),
            ip: record.ip.clone(),
            user_agent: record.user_agent.clone(),
            timestamp: DateTime::from_millis(i64::try_from(millis).unwrap_or(i64::MAX)),
        }
    }
}

impl TryFrom<RequestLogDocument> for RequestLogRecord {
    type Error = RepoError;

    fn try_from(document: RequestLogDocument) -> Result<Self, Self::Error> {
        let nanos = i128::from(document.timestamp.timestamp_millis()) * 1_000_000;
        let timestamp = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(RepoError::from_persistence)?;

        Ok(Self {
            method: document.method,
            path: document.path,
            status_code: u16::try_from(document.status_code).map_err(RepoError::from_persistence)?,
            duration_ms: u64::try_from(document.duration_ms).unwrap_or_default(),
            ip: document.ip,
            user_agent: document.user_agent,
            timestamp,
        })
    }
}

#[derive(Clone)]
pub struct MongoRequestLogs {
    client: Client,
    collection: Collection<RequestLogDocument>,
}

impl MongoRequestLogs {
    pub async fn connect(settings: &DocumentSettings) -> Result<Self, InfraError> {
        let client = Client::with_uri_str(&settings.uri)
            .await
            .map_err(|err| InfraError::documents(format!("failed to build mongo client: {err}")))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|err| InfraError::documents(format!("mongo did not answer ping: {err}")))?;

        let collection = client
            .database(&settings.database)
            .collection::<RequestLogDocument>(&settings.collection);

        collection
            .create_index(IndexModel::builder().keys(doc! { "timestamp": -1 }).build())
            .await
            .map_err(|err| InfraError::documents(format!("failed to create index: {err}")))?;

        info!(
            target = "motorpool::infra::documents",
            database = %settings.database,
            collection = %settings.collection,
            "connected to mongodb"
        );

        Ok(Self { client, collection })
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[async_trait]
impl RequestLogsRepo for MongoRequestLogs {
    async fn list_recent(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<RequestLogRecord>, RepoError> {
        let total = self
            .collection
            .count_documents(doc! {})
            .await
            .map_err(RepoError::from_persistence)?;

        let documents: Vec<RequestLogDocument> = self
            .collection
            .find(doc! {})
            .sort(doc! { "timestamp": -1 })
            .skip(page.offset())
            .limit(i64::from(page.limit()))
            .await
            .map_err(RepoError::from_persistence)?
            .try_collect()
            .await
            .map_err(RepoError::from_persistence)?;

        let records = documents
            .into_iter()
            .map(RequestLogRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OffsetPage::new(records, total))
    }
}

#[async_trait]
impl RequestLogsWriteRepo for MongoRequestLogs {
    async fn append(&self, record: &RequestLogRecord) -> Result<(), RepoError> {
        self.collection
            .insert_one(RequestLogDocument::from(record))
            .await
            .map(|_| ())
            .map_err(RepoError::from_persistence)
    }
}
