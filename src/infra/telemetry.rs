use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

pub const CACHE_HIT: &str = "motorpool_cache_hit_total";
pub const CACHE_MISS: &str = "motorpool_cache_miss_total";
pub const CACHE_ERROR: &str = "motorpool_cache_error_total";
pub const REQUEST_LOG_PUBLISHED: &str = "motorpool_request_log_published_total";
pub const REQUEST_LOG_PUBLISH_FAILED: &str = "motorpool_request_log_publish_failed_total";
pub const REQUEST_LOG_CONSUMED: &str = "motorpool_request_log_consumed_total";
pub const REQUEST_LOG_DROPPED: &str = "motorpool_request_log_dropped_total";
pub const REQUEST_LOG_INSERT_FAILED: &str = "motorpool_request_log_insert_failed_total";

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(CACHE_HIT, Unit::Count, "Vehicle cache lookups served from the cache.");
        describe_counter!(
            CACHE_MISS,
            Unit::Count,
            "Vehicle cache lookups that fell through to Postgres."
        );
        describe_counter!(
            CACHE_ERROR,
            Unit::Count,
            "Cache backend failures, including failed invalidations."
        );
        describe_counter!(
            REQUEST_LOG_PUBLISHED,
            Unit::Count,
            "Request-log records handed to the queue producer."
        );
        describe_counter!(
            REQUEST_LOG_PUBLISH_FAILED,
            Unit::Count,
            "Request-log records the producer refused."
        );
        describe_counter!(
            REQUEST_LOG_CONSUMED,
            Unit::Count,
            "Request-log records written to the document store."
        );
        describe_counter!(
            REQUEST_LOG_DROPPED,
            Unit::Count,
            "Queue payloads discarded because they could not be decoded."
        );
        describe_counter!(
            REQUEST_LOG_INSERT_FAILED,
            Unit::Count,
            "Decoded request-log records the document store rejected."
        );
    });
}
