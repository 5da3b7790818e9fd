//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Ingestion answers 201 on create and 200 on update
//! - Scope queries, headers and summaries return the expected shapes
//! - Invalid input is rejected with 400 and unknown ids with 404

use std::net::SocketAddr;

use chrono::Duration;
use overview_hub::{
    actors::retention::{RetentionHandle, RetentionSettings},
    api::{ApiConfig, ApiState, spawn_api_server},
    clock::ManualClock,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{manual_clock, store_with_clock};

async fn spawn_test_api(clock: &ManualClock) -> SocketAddr {
    let store = store_with_clock(clock);
    let retention = RetentionHandle::spawn(store.clone(), RetentionSettings::default());

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..ApiConfig::default()
    };
    spawn_api_server(config, ApiState::new(store, retention))
        .await
        .unwrap()
}

async fn post(addr: SocketAddr, path: &str, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

async fn get(addr: SocketAddr, path: &str) -> (StatusCode, Value) {
    let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_ingest_create_then_update() {
    let clock = manual_clock();
    let addr = spawn_test_api(&clock).await;

    let (status, body) = post(
        addr,
        "/api/v1/components",
        json!({"systemName": "Prod", "projectName": "Web", "payload": {"Name": "web01", "Severity": "ok"}}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "created");
    assert_eq!(body["component"]["severity"], "ok");
    let id = body["component"]["id"].as_i64().unwrap();

    let (status, body) = post(
        addr,
        "/api/components",
        json!({"systemName": "Prod", "projectName": "Web", "payload": "{\"Name\":\"web01\",\"Severity\":\"error\"}"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["component"]["id"].as_i64(), Some(id));
    assert_eq!(body["component"]["severity"], "error");

    let (status, body) = get(addr, "/api/v1/components").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_ingest_validation_errors() {
    let clock = manual_clock();
    let addr = spawn_test_api(&clock).await;

    let (status, body) = post(
        addr,
        "/api/v1/components",
        json!({"projectName": "Web", "payload": {"Name": "web01"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/components"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scope_query_endpoints() {
    let clock = manual_clock();
    let addr = spawn_test_api(&clock).await;

    for (name, severity, ttl) in [("a", "ok", 600), ("b", "warning", 600), ("c", "ok", 5)] {
        post(
            addr,
            "/api/v1/components",
            json!({"systemName": "Prod", "projectName": "Web",
                   "payload": {"Name": name, "Severity": severity, "TTL": ttl}}),
        )
        .await;
        clock.advance(Duration::seconds(1));
    }
    clock.advance(Duration::seconds(10));

    let (status, body) = get(addr, "/api/v1/scopes/Prod/Web/components?page=1&pageSize=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["pageSize"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["payload"]["Name"], "c");

    let (_, body) = get(
        addr,
        "/api/v1/scopes/Prod/Web/components/window?startIndex=0&count=10&sortBy=Name&severity=offline",
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["payload"]["Name"], "c");

    let (status, _) = get(addr, "/api/v1/scopes/Prod/Web/components?severity=critical").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(addr, "/api/v1/scopes/Prod/Web/headers").await;
    assert_eq!(body["headers"], json!(["Severity", "Name", "TTL"]));

    let (_, body) = get(addr, "/api/v1/scopes/Prod/Web/summary").await;
    assert_eq!(body["counts"]["ok"], 1);
    assert_eq!(body["counts"]["warning"], 1);
    assert_eq!(body["counts"]["offline"], 1);
    assert_eq!(body["counts"]["total"], 3);

    let (_, body) = get(addr, "/api/v1/summary").await;
    assert_eq!(body["totals"]["total"], 3);
    assert_eq!(body["systems"][0]["systemName"], "Prod");

    let (_, body) = get(addr, "/api/v1/scopes").await;
    assert_eq!(body["systems"], json!([{"systemName": "Prod", "projects": ["Web"]}]));
}

#[tokio::test]
async fn test_delete_endpoints() {
    let clock = manual_clock();
    let addr = spawn_test_api(&clock).await;
    let client = reqwest::Client::new();

    let (_, body) = post(
        addr,
        "/api/v1/components",
        json!({"systemName": "Prod", "projectName": "Web", "payload": {"Name": "a"}}),
    )
    .await;
    let id = body["component"]["id"].as_i64().unwrap();
    post(
        addr,
        "/api/v1/components",
        json!({"systemName": "Prod", "projectName": "Web", "payload": {"Name": "b"}}),
    )
    .await;

    let response = client
        .delete(format!("http://{addr}/api/v1/components/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = get(addr, &format!("/api/v1/components/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = client
        .delete(format!("http://{addr}/api/v1/scopes/Prod/Web"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deleted"], 1);
}

#[tokio::test]
async fn test_health_and_stats() {
    let clock = manual_clock();
    let addr = spawn_test_api(&clock).await;

    let (status, body) = get(addr, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"]["healthy"], true);

    let (status, body) = get(addr, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scopes"], 0);
    assert_eq!(body["retention"]["enabled"], true);
}
