//! Integration tests for the retention actor

use std::time::Duration as StdDuration;

use chrono::Duration;
use overview_hub::actors::retention::{RetentionHandle, RetentionSettings};
use serde_json::json;

use crate::helpers::{manual_clock, prod_web, report, store_with_clock};

#[tokio::test]
async fn test_two_week_old_component_is_swept() {
    let clock = manual_clock();
    let store = store_with_clock(&clock);

    store
        .ingest(report("Prod", "Web", json!({"Name": "old"})))
        .await
        .unwrap();
    clock.advance(Duration::weeks(2));
    store
        .ingest(report("Prod", "Web", json!({"Name": "fresh"})))
        .await
        .unwrap();

    let retention = RetentionHandle::spawn(store.clone(), RetentionSettings::default());
    assert_eq!(retention.sweep_now().await.unwrap(), 1);

    let remaining = store.list_scope(&prod_web()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].payload["Name"], json!("fresh"));

    let stats = retention.get_stats().await.unwrap();
    assert!(stats.enabled);
    assert_eq!(stats.total_deleted, 1);

    retention.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_non_positive_threshold_never_deletes() {
    let clock = manual_clock();
    let store = store_with_clock(&clock);

    store
        .ingest(report("Prod", "Web", json!({"Name": "old"})))
        .await
        .unwrap();
    clock.advance(Duration::weeks(52));

    let retention = RetentionHandle::spawn(
        store.clone(),
        RetentionSettings {
            threshold_minutes: 0,
            interval: StdDuration::from_secs(60),
        },
    );
    assert_eq!(retention.sweep_now().await.unwrap(), 0);
    assert_eq!(store.list_all().await.unwrap().len(), 1);

    let stats = retention.get_stats().await.unwrap();
    assert!(!stats.enabled);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_sweep_runs_without_commands() {
    let clock = manual_clock();
    let store = store_with_clock(&clock);

    store
        .ingest(report("Prod", "Web", json!({"Name": "old"})))
        .await
        .unwrap();
    clock.advance(Duration::weeks(2));

    let retention = RetentionHandle::spawn(
        store.clone(),
        RetentionSettings {
            threshold_minutes: 10080,
            interval: StdDuration::from_secs(60),
        },
    );

    tokio::time::sleep(StdDuration::from_secs(61)).await;

    assert!(store.list_all().await.unwrap().is_empty());
    let stats = retention.get_stats().await.unwrap();
    assert_eq!(stats.sweep_count, 1);
}
