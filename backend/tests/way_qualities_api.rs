use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::StatusCode;
use serde_json::{json, Value};
use skatemap_backend::{
    client::WAY_QUALITIES_PATH,
    config::DEFAULT_ALLOWED_ORIGINS,
    create_router,
    store::{MemoryStore, QualityStore},
    AppState,
};
use tower::ServiceExt;

fn test_app() -> (axum::Router, Arc<MemoryStore>) {
    let state = AppState::new(MemoryStore::new());
    let store = Arc::clone(&state.store);
    let origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect();
    (create_router(state, &origins), store)
}

fn json_request(method: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(WAY_QUALITIES_PATH)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn put_then_post_returns_stored_qualities() {
    let (app, _store) = test_app();

    let put = json_request(
        "PUT",
        json!([
            {"wayId": 12345, "quality": 1},
            {"wayId": 12346, "quality": 0},
            {"wayId": 12347, "quality": -1}
        ]),
    );
    let response = app.clone().oneshot(put).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(json_request("POST", json!([12345, 12346])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["wayId"], 12345);
    assert_eq!(entries[0]["quality"], 1);
    assert_eq!(entries[1]["wayId"], 12346);
    assert_eq!(entries[1]["quality"], 0);
    assert!(entries[0]["timestamp"].is_string());
}

#[tokio::test]
async fn coordinates_are_stored_and_returned() {
    let (app, _store) = test_app();

    let put = json_request(
        "PUT",
        json!([
            {"wayId": 112345, "quality": 1, "latitude": 55.67424385812128, "longitude": 13.073523260499705},
            {"wayId": 112346, "quality": 0, "latitude": 55.60276481037733, "longitude": 12.96742708750688}
        ]),
    );
    assert_eq!(
        app.clone().oneshot(put).await.unwrap().status(),
        StatusCode::NO_CONTENT
    );

    let body = body_json(
        app.oneshot(json_request("POST", json!([112345, 112346])))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body[0]["latitude"], 55.67424385812128);
    assert_eq!(body[0]["longitude"], 13.073523260499705);
    assert_eq!(body[1]["latitude"], 55.60276481037733);
}

#[tokio::test]
async fn missing_quality_resets_to_null() {
    let (app, _store) = test_app();

    for body in [
        json!([{"wayId": 212345, "quality": -1}]),
        json!([{"wayId": 212345}]),
    ] {
        let response = app.clone().oneshot(json_request("PUT", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let body = body_json(
        app.oneshot(json_request("POST", json!([212345])))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body[0]["wayId"], 212345);
    assert_eq!(body[0]["quality"], Value::Null);
}

#[tokio::test]
async fn empty_fetch_returns_empty_list() {
    let (app, _store) = test_app();
    let response = app.oneshot(json_request("POST", json!([]))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn unknown_quality_score_is_rejected() {
    let (app, store) = test_app();
    let response = app
        .oneshot(json_request("PUT", json!([{"wayId": 1, "quality": 2}])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.all_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_coordinates_reject_the_whole_batch() {
    let (app, store) = test_app();
    let response = app
        .oneshot(json_request(
            "PUT",
            json!([
                {"wayId": 1, "quality": 1},
                {"wayId": 2, "quality": 1, "latitude": 123.0, "longitude": 13.0}
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("way 2"));
    assert!(store.all_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn forwarded_ip_is_recorded() {
    let (app, store) = test_app();
    let mut request = json_request("PUT", json!([{"wayId": 5, "quality": 1}]));
    request
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let records = store.all_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ip.as_deref(), Some("198.51.100.4"));
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let (app, _store) = test_app();

    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri(WAY_QUALITIES_PATH)
            .header("origin", origin)
            .header("access-control-request-method", "PUT")
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .clone()
        .oneshot(preflight("http://localhost:5173"))
        .await
        .unwrap();
    assert_eq!(
        allowed
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );

    let denied = app.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}
