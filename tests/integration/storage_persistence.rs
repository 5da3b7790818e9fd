//! Integration tests for SQLite persistence
//!
//! These tests verify that:
//! - Components survive a backend restart
//! - Updates replace the payload in place
//! - Retention cleanup and scope deletion hit the database

use std::sync::Arc;

use chrono::{Duration, Utc};
use overview_hub::{
    ComponentStore, IngestOutcome, StoreSettings,
    component::Scope,
    storage::{StorageBackend, schema::NewComponent, sqlite::SqliteBackend},
};
use serde_json::json;
use tempfile::tempdir;

use crate::helpers::{prod_web, report};

#[tokio::test]
async fn test_components_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("components.db");

    let id = {
        let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        let store = ComponentStore::new(backend, StoreSettings::default());
        let (_, view) = store
            .ingest(report("Prod", "Web", json!({"Name": "web01", "Severity": "ok"})))
            .await
            .unwrap();
        store.close().await.unwrap();
        view.id
    };

    let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let store = ComponentStore::new(backend, StoreSettings::default());

    let (outcome, view) = store
        .ingest(report("Prod", "Web", json!({"Name": "web01", "Severity": "error"})))
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Updated);
    assert_eq!(view.id, id);

    let components = store.list_scope(&prod_web()).await.unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].payload["Severity"], json!("error"));
}

#[tokio::test]
async fn test_backend_round_trip_and_cleanup() {
    let dir = tempdir().unwrap();
    let backend = SqliteBackend::new(dir.path().join("test.db")).await.unwrap();
    let now = Utc::now();

    let old = backend
        .insert_component(NewComponent {
            scope: prod_web(),
            created_at: now - Duration::days(14),
            payload: r#"{"Name":"old"}"#.to_string(),
        })
        .await
        .unwrap();
    let fresh = backend
        .insert_component(NewComponent {
            scope: Scope::new("Prod", "Db"),
            created_at: now,
            payload: "opaque text".to_string(),
        })
        .await
        .unwrap();
    assert!(fresh.id > old.id);

    let fetched = backend.get_component(fresh.id).await.unwrap().unwrap();
    assert_eq!(fetched.payload, "opaque text");
    assert_eq!(fetched.scope(), Scope::new("Prod", "Db"));

    let deleted = backend
        .cleanup_old_components(now - Duration::days(7))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(backend.get_component(old.id).await.unwrap().is_none());

    assert_eq!(backend.list_scopes().await.unwrap(), vec![Scope::new("Prod", "Db")]);
    assert_eq!(backend.delete_scope(&Scope::new("Prod", "Db")).await.unwrap(), 1);
    assert!(backend.list_components().await.unwrap().is_empty());

    assert!(backend.health_check().await.unwrap().healthy);
}

#[tokio::test]
async fn test_update_missing_component_is_not_found() {
    let dir = tempdir().unwrap();
    let backend = SqliteBackend::new(dir.path().join("test.db")).await.unwrap();

    let result = backend
        .update_component(42, "{}".to_string(), Utc::now())
        .await;
    assert!(matches!(
        result,
        Err(overview_hub::storage::StorageError::NotFound(_))
    ));
}
