mod support;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use motorpool::application::queue::LogPublisher;
use motorpool::application::request_logs::RequestLogConsumer;
use motorpool::domain::entities::RequestLogRecord;
use motorpool::infra::queue::memory_topic;
use motorpool::infra::telemetry::{
    CACHE_HIT, CACHE_MISS, REQUEST_LOG_CONSUMED, REQUEST_LOG_DROPPED, REQUEST_LOG_PUBLISHED,
};

use support::{InMemoryRequestLogs, TestApp, empty_request};

#[tokio::test]
async fn cache_and_pipeline_paths_emit_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let app = TestApp::new();
    let token = app.token();
    for _ in 0..2 {
        app.send(empty_request("GET", "/api/v1/cars", Some(&token)))
            .await;
    }

    let (publisher, source) = memory_topic(NonZeroUsize::new(8).expect("non-zero"));
    publisher
        .publish(&RequestLogRecord {
            method: "GET".to_string(),
            path: "/health".to_string(),
            status_code: 200,
            duration_ms: 1,
            ip: "unknown".to_string(),
            user_agent: String::new(),
            timestamp: OffsetDateTime::now_utc(),
        })
        .expect("publish");
    publisher.publish_raw(b"garbage".to_vec()).expect("publish raw");
    drop(publisher);

    RequestLogConsumer::new(Box::new(source), Arc::new(InMemoryRequestLogs::default()))
        .run(CancellationToken::new())
        .await;

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((composite_key.key().name().to_string(), count)),
            _ => None,
        })
        .collect();

    assert_eq!(counters.get(CACHE_MISS), Some(&1));
    assert_eq!(counters.get(CACHE_HIT), Some(&1));
    assert_eq!(counters.get(REQUEST_LOG_PUBLISHED), Some(&1));
    assert_eq!(counters.get(REQUEST_LOG_CONSUMED), Some(&1));
    assert_eq!(counters.get(REQUEST_LOG_DROPPED), Some(&1));
}
