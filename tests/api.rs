mod support;

use std::time::Duration;

use axum::http::{StatusCode, header};
use serde_json::json;
use time::OffsetDateTime;

use motorpool::application::repos::RequestLogsWriteRepo;
use motorpool::cache::CacheStore;
use motorpool::domain::entities::RequestLogRecord;

use support::{API_KEY, InMemoryVehicles, TestApp, body_json, empty_request, json_request};

fn camry() -> serde_json::Value {
    json!({
        "brand": "Toyota",
        "model": "Camry",
        "year": 2024,
        "color": "Silver",
        "price": 35000.5
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();

    let response = app.send(empty_request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn api_key_exchange_issues_a_usable_token() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/auth/validate",
            None,
            json!({ "api_key": API_KEY }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().expect("token string");
    assert!(app.auth.validate(token).is_ok());

    let response = app
        .send(empty_request("GET", "/api/v1/cars", Some(token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_key_exchange_rejects_bad_input() {
    let app = TestApp::new();

    let response = app
        .send(json_request("POST", "/auth/validate", None, json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "api_key is required");

    let response = app
        .send(json_request(
            "POST",
            "/auth/validate",
            None,
            json!({ "api_key": "wrong" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid api key");

    let mut request = empty_request("POST", "/auth/validate", None);
    *request.body_mut() = axum::body::Body::from("{not json");
    request.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid request body");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = TestApp::new();

    let response = app.send(empty_request("GET", "/api/v1/cars", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing authorization header");
    assert_eq!(body["code"], "unauthorized");

    let mut request = empty_request("GET", "/api/v1/cars", None);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Token abc"),
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "invalid authorization format"
    );

    let response = app
        .send(empty_request("GET", "/api/v1/logs", Some("not-a-jwt")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid or expired token");
}

#[tokio::test]
async fn vehicle_lifecycle_over_http() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .send(json_request("POST", "/api/v1/cars", Some(&token), camry()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await["data"].clone();
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["brand"], "Toyota");
    assert_eq!(created["price"].as_f64(), Some(35000.5));
    assert!(created["created_at"].is_string());
    assert!(created.get("deleted_at").is_none());

    let response = app
        .send(empty_request("GET", &format!("/api/v1/cars/{id}"), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], created);

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/v1/cars/{id}"),
            Some(&token),
            json!({ "color": "Black" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["color"], "Black");
    assert_eq!(updated["model"], "Camry");
    assert_eq!(updated["year"], 2024);

    let response = app
        .send(empty_request("GET", &format!("/api/v1/cars/{id}"), Some(&token)))
        .await;
    assert_eq!(body_json(response).await["data"]["color"], "Black");

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/v1/cars/{id}"),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(empty_request("GET", &format!("/api/v1/cars/{id}"), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "car not found");

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/v1/cars/{id}"),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(empty_request("GET", "/api/v1/cars", Some(&token)))
        .await;
    let listing = body_json(response).await;
    assert_eq!(listing["total"], 0);
    assert_eq!(listing["data"], json!([]));
}

#[tokio::test]
async fn create_requires_brand_model_and_year() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/cars",
            Some(&token),
            json!({ "brand": "Toyota", "year": 2024 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "brand, model, and year are required");
    assert_eq!(body["code"], "validation_failed");
}

#[tokio::test]
async fn patch_fields_are_stored_as_sent() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .send(json_request("POST", "/api/v1/cars", Some(&token), camry()))
        .await;
    let id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/v1/cars/{id}"),
            Some(&token),
            json!({ "brand": "", "year": 0 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["brand"], "");
    assert_eq!(updated["year"], 0);
    assert_eq!(updated["model"], "Camry");
}

#[tokio::test]
async fn deleting_an_unknown_car_is_no_content() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/v1/cars/{}", uuid::Uuid::new_v4()),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let app = TestApp::new();
    let token = app.token();

    for method in ["GET", "DELETE"] {
        let response = app
            .send(empty_request(method, "/api/v1/cars/not-a-uuid", Some(&token)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid car id");
    }

    let response = app
        .send(empty_request(
            "GET",
            &format!("/api/v1/cars/{}", uuid::Uuid::new_v4()),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_pagination_is_clamped_and_lenient() {
    let app = TestApp::new();
    let token = app.token();

    for _ in 0..3 {
        let response = app
            .send(json_request("POST", "/api/v1/cars", Some(&token), camry()))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .send(empty_request(
            "GET",
            "/api/v1/cars?offset=0&limit=500",
            Some(&token),
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["limit"], 100);
    assert_eq!(body["total"], 3);

    let response = app
        .send(empty_request(
            "GET",
            "/api/v1/cars?offset=-4&limit=abc",
            Some(&token),
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["offset"], 0);
    assert_eq!(body["limit"], 10);

    let response = app
        .send(empty_request(
            "GET",
            "/api/v1/cars?offset=1&limit=1",
            Some(&token),
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn writes_invalidate_cached_listings() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .send(empty_request("GET", "/api/v1/cars", Some(&token)))
        .await;
    assert_eq!(body_json(response).await["total"], 0);
    assert!(
        app.cache
            .get("vehicles:list:0:10")
            .await
            .expect("cache read")
            .is_some()
    );

    app.send(json_request("POST", "/api/v1/cars", Some(&token), camry()))
        .await;
    assert!(
        app.cache
            .get("vehicles:list:0:10")
            .await
            .expect("cache read")
            .is_none()
    );

    let response = app
        .send(empty_request("GET", "/api/v1/cars", Some(&token)))
        .await;
    assert_eq!(body_json(response).await["total"], 1);
}

#[tokio::test]
async fn request_logs_are_listed_newest_first() {
    let app = TestApp::new();
    let token = app.token();
    let now = OffsetDateTime::now_utc();

    for (offset_secs, path) in [(30, "/older"), (10, "/newest"), (20, "/middle")] {
        app.logs
            .append(&RequestLogRecord {
                method: "GET".to_string(),
                path: path.to_string(),
                status_code: 200,
                duration_ms: 1,
                ip: "127.0.0.1".to_string(),
                user_agent: "test".to_string(),
                timestamp: now - time::Duration::seconds(offset_secs),
            })
            .await
            .expect("append");
    }

    let response = app
        .send(empty_request("GET", "/api/v1/logs", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["limit"], 20);
    let paths: Vec<_> = body["data"]
        .as_array()
        .expect("array")
        .iter()
        .map(|record| record["path"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(paths, vec!["/newest", "/middle", "/older"]);
}

#[tokio::test]
async fn every_request_is_published_with_its_final_status() {
    let app = TestApp::new();

    let mut request = empty_request("GET", "/api/v1/cars", None);
    request.headers_mut().insert(
        "x-forwarded-for",
        header::HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
    );
    request.headers_mut().insert(
        header::USER_AGENT,
        header::HeaderValue::from_static("integration-test"),
    );
    app.send(request).await;
    app.send(empty_request("GET", "/health", None)).await;

    let records = app.publisher.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].method, "GET");
    assert_eq!(records[0].path, "/api/v1/cars");
    assert_eq!(records[0].status_code, 401);
    assert_eq!(records[0].ip, "203.0.113.9");
    assert_eq!(records[0].user_agent, "integration-test");
    assert_eq!(records[1].path, "/health");
    assert_eq!(records[1].status_code, 200);
    assert_eq!(records[1].ip, "unknown");
}

#[tokio::test]
async fn request_id_is_echoed_or_minted() {
    let app = TestApp::new();

    let mut request = empty_request("GET", "/health", None);
    request.headers_mut().insert(
        "x-request-id",
        header::HeaderValue::from_static("req-123"),
    );
    let response = app.send(request).await;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("req-123")
    );

    let response = app.send(empty_request("GET", "/health", None)).await;
    let minted = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .expect("request id header");
    assert!(uuid::Uuid::parse_str(minted).is_ok());
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let app = TestApp::new();

    let mut request = empty_request("OPTIONS", "/api/v1/cars", None);
    let headers = request.headers_mut();
    headers.insert(
        header::ORIGIN,
        header::HeaderValue::from_static("https://example.com"),
    );
    headers.insert(
        header::ACCESS_CONTROL_REQUEST_METHOD,
        header::HeaderValue::from_static("POST"),
    );
    headers.insert(
        header::ACCESS_CONTROL_REQUEST_HEADERS,
        header::HeaderValue::from_static("authorization,content-type"),
    );

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_MAX_AGE)
            .and_then(|value| value.to_str().ok()),
        Some("300")
    );
}

#[tokio::test(start_paused = true)]
async fn slow_handlers_time_out() {
    let app = TestApp::with_parts(
        InMemoryVehicles::slow(Duration::from_secs(60)),
        Duration::from_secs(30),
    );
    let token = app.token();

    let response = app
        .send(empty_request("GET", "/api/v1/cars", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["code"], "timeout");
}
