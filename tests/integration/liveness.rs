//! Integration tests for read-time liveness evaluation

use chrono::Duration;
use overview_hub::Liveness;
use serde_json::json;

use crate::helpers::{manual_clock, prod_web, report, store_with_clock};

#[tokio::test]
async fn test_ttl_expiry_marks_component_offline() {
    let clock = manual_clock();
    let store = store_with_clock(&clock);

    store
        .ingest(report(
            "Prod",
            "Web",
            json!({"Name": "hb1", "Severity": "ok", "TTL": 1}),
        ))
        .await
        .unwrap();

    clock.advance(Duration::seconds(2));

    let components = store.list_scope(&prod_web()).await.unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].severity, Liveness::Offline);
}

#[tokio::test]
async fn test_ttl_overrides_global_default() {
    let clock = manual_clock();
    let store = store_with_clock(&clock);

    let (_, short) = store
        .ingest(report("Prod", "Web", json!({"Name": "short", "Severity": "ok", "TTL": 30})))
        .await
        .unwrap();
    let (_, default) = store
        .ingest(report("Prod", "Web", json!({"Name": "default", "Severity": "ok"})))
        .await
        .unwrap();

    clock.advance(Duration::seconds(31));
    assert_eq!(store.get(short.id).await.unwrap().unwrap().severity, Liveness::Offline);
    assert_eq!(store.get(default.id).await.unwrap().unwrap().severity, Liveness::Ok);

    clock.advance(Duration::seconds(3600));
    assert_eq!(store.get(default.id).await.unwrap().unwrap().severity, Liveness::Offline);
}

#[tokio::test]
async fn test_stale_error_reports_offline() {
    let clock = manual_clock();
    let store = store_with_clock(&clock);

    let (_, view) = store
        .ingest(report("Prod", "Web", json!({"Name": "db", "Severity": "error", "TTL": 60})))
        .await
        .unwrap();
    assert_eq!(view.severity, Liveness::Error);

    clock.advance(Duration::seconds(60));
    assert_eq!(store.get(view.id).await.unwrap().unwrap().severity, Liveness::Offline);
}

#[tokio::test]
async fn test_new_report_revives_offline_component() {
    let clock = manual_clock();
    let store = store_with_clock(&clock);

    store
        .ingest(report("Prod", "Web", json!({"Id": "w1", "Severity": "warning", "TTL": 10})))
        .await
        .unwrap();
    clock.advance(Duration::seconds(20));

    let (_, view) = store
        .ingest(report("Prod", "Web", json!({"Id": "w1", "Severity": "warning", "TTL": 10})))
        .await
        .unwrap();
    assert_eq!(view.severity, Liveness::Warning);
}
