//! Kafka transport backed by librdkafka.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use rdkafka::{
    ClientConfig, Message,
    consumer::{Consumer, StreamConsumer},
    error::{KafkaError, RDKafkaErrorCode},
    producer::{BaseRecord, DefaultProducerContext, Producer, ThreadedProducer},
};
use tracing::info;

use crate::application::queue::{LogPublisher, LogSource, QueueError, encode_record};
use crate::config::QueueSettings;
use crate::domain::entities::RequestLogRecord;
use crate::infra::error::InfraError;
use crate::infra::telemetry::REQUEST_LOG_PUBLISHED;

const SOURCE: &str = "motorpool::infra::queue::kafka";
const MESSAGE_TIMEOUT_MS: &str = "5000";

/// Producer whose `send` only enqueues into librdkafka's buffer; a background
/// thread owned by the producer delivers to the brokers.
pub struct KafkaLogProducer {
    producer: ThreadedProducer<DefaultProducerContext>,
    topic: String,
}

impl KafkaLogProducer {
    pub fn new(settings: &QueueSettings) -> Result<Self, InfraError> {
        let producer: ThreadedProducer<DefaultProducerContext> = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("message.timeout.ms", MESSAGE_TIMEOUT_MS)
            .create()
            .map_err(|err| InfraError::queue(format!("failed to create kafka producer: {err}")))?;

        info!(
            target = SOURCE,
            brokers = %settings.brokers,
            topic = %settings.topic,
            "kafka producer ready"
        );

        Ok(Self {
            producer,
            topic: settings.topic.clone(),
        })
    }
}

impl LogPublisher for KafkaLogProducer {
    fn publish(&self, record: &RequestLogRecord) -> Result<(), QueueError> {
        let payload = encode_record(record)?;

        self.producer
            .send(BaseRecord::<(), [u8]>::to(&self.topic).payload(payload.as_slice()))
            .map_err(|(err, _)| match err {
                KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull) => QueueError::Full,
                other => QueueError::transport(other),
            })?;

        counter!(REQUEST_LOG_PUBLISHED).increment(1);
        Ok(())
    }

    fn close(&self, timeout: Duration) -> Result<(), QueueError> {
        self.producer.flush(timeout).map_err(QueueError::transport)
    }
}

pub struct KafkaLogSource {
    consumer: StreamConsumer,
}

impl KafkaLogSource {
    /// Joins the consumer group and subscribes to the request-log topic.
    /// Offsets auto-commit, so delivery is at-least-once.
    pub fn subscribe(settings: &QueueSettings) -> Result<Self, InfraError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("group.id", &settings.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|err| InfraError::queue(format!("failed to create kafka consumer: {err}")))?;

        consumer
            .subscribe(&[settings.topic.as_str()])
            .map_err(|err| InfraError::queue(format!("failed to subscribe: {err}")))?;

        info!(
            target = SOURCE,
            group_id = %settings.group_id,
            topic = %settings.topic,
            "kafka consumer subscribed"
        );

        Ok(Self { consumer })
    }
}

#[async_trait]
impl LogSource for KafkaLogSource {
    async fn next_payload(&mut self) -> Result<Vec<u8>, QueueError> {
        let message = self.consumer.recv().await.map_err(QueueError::transport)?;
        Ok(message.payload().map(<[u8]>::to_vec).unwrap_or_default())
    }
}
