//! Integration tests for ingestion and identity resolution
//!
//! These tests verify that:
//! - Reports with the same Id or Name+Namespace update one component
//! - Reports without a natural key always create new components
//! - Invalid reports are rejected without touching the store

use assert_matches::assert_matches;
use overview_hub::{IngestOutcome, Liveness, StoreError, actors::messages::ChangeKind};
use serde_json::json;

use crate::helpers::{manual_clock, prod_web, report, store_with_clock};

#[tokio::test]
async fn test_create_then_update_by_name() {
    let store = store_with_clock(&manual_clock());

    let (outcome, created) = store
        .ingest(report("Prod", "Web", json!({"Name": "web01", "Severity": "ok"})))
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Created);
    assert_eq!(created.severity, Liveness::Ok);

    let (outcome, updated) = store
        .ingest(report("Prod", "Web", json!({"Name": "web01", "Severity": "error"})))
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Updated);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.severity, Liveness::Error);

    assert_eq!(store.list_scope(&prod_web()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_id_twice_keeps_second_attributes() {
    let store = store_with_clock(&manual_clock());

    store
        .ingest(report("Prod", "Web", json!({"Id": "X", "Version": "1"})))
        .await
        .unwrap();
    store
        .ingest(report("Prod", "Web", json!({"Id": "X", "Version": "2"})))
        .await
        .unwrap();

    let components = store.list_scope(&prod_web()).await.unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].payload["Version"], json!("2"));
}

#[tokio::test]
async fn test_namespace_disambiguates_names() {
    let store = store_with_clock(&manual_clock());

    for namespace in ["default", "kube-system", "default"] {
        store
            .ingest(report(
                "Prod",
                "Web",
                json!({"Name": "coredns", "Namespace": namespace}),
            ))
            .await
            .unwrap();
    }

    assert_eq!(store.list_scope(&prod_web()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_keyless_reports_never_merge() {
    let store = store_with_clock(&manual_clock());

    for _ in 0..3 {
        let (outcome, _) = store
            .ingest(report("Prod", "Web", json!({"Message": "disk almost full"})))
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Created);
    }

    assert_eq!(store.list_scope(&prod_web()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_malformed_string_payload_is_stored_opaque() {
    let store = store_with_clock(&manual_clock());

    let (_, view) = store
        .ingest(report("Prod", "Web", json!("{\"Name\": broken")))
        .await
        .unwrap();

    assert_eq!(view.payload, json!("{\"Name\": broken"));
    assert_eq!(view.severity, Liveness::Info);
}

#[tokio::test]
async fn test_invalid_reports_are_rejected() {
    let store = store_with_clock(&manual_clock());
    let mut events = store.subscribe();

    let mut missing_system = report("Prod", "Web", json!({"Name": "a"}));
    missing_system.system_name = None;
    assert_matches!(
        store.ingest(missing_system).await,
        Err(StoreError::Validation(_))
    );

    let mut missing_payload = report("Prod", "Web", json!({}));
    missing_payload.payload = None;
    assert_matches!(
        store.ingest(missing_payload).await,
        Err(StoreError::Validation(_))
    );

    assert_matches!(
        store.ingest(report("Prod", "Web", json!([1, 2, 3]))).await,
        Err(StoreError::Validation(_))
    );

    assert!(store.list_all().await.unwrap().is_empty());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_delete_publishes_change() {
    let store = store_with_clock(&manual_clock());
    let (_, view) = store
        .ingest(report("Prod", "Web", json!({"Name": "web01"})))
        .await
        .unwrap();

    let mut events = store.subscribe();
    assert!(store.delete(view.id).await.unwrap());
    assert!(!store.delete(view.id).await.unwrap());

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, ChangeKind::Deleted);
    assert_eq!(event.id, Some(view.id));
    assert!(events.try_recv().is_err());
}
