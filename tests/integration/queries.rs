//! Integration tests for scope queries, summaries and header inference

use chrono::Duration;
use overview_hub::{
    Liveness,
    component::Scope,
    query::{ComponentQuery, SortKey, SortSpec, Window},
};
use serde_json::json;

use crate::helpers::{manual_clock, prod_web, report, store_with_clock};

async fn seeded_store(clock: &overview_hub::clock::ManualClock) -> overview_hub::ComponentStore {
    let store = store_with_clock(clock);
    let fleet = [
        json!({"Name": "web01", "Severity": "ok", "CPU": 12}),
        json!({"Name": "web02", "Severity": "warning", "CPU": 88}),
        json!({"Name": "web03", "Severity": "error", "CPU": 97}),
        json!({"Name": "web04", "Severity": "ok", "CPU": 3, "TTL": 5}),
        json!({"Name": "web05", "Severity": "info"}),
    ];
    for payload in fleet {
        store.ingest(report("Prod", "Web", payload)).await.unwrap();
        clock.advance(Duration::seconds(1));
    }
    store
        .ingest(report("Prod", "Db", json!({"Name": "pg01", "Severity": "ok"})))
        .await
        .unwrap();
    store
        .ingest(report("Dev", "Web", json!({"Name": "dev01", "Severity": "warning"})))
        .await
        .unwrap();

    // web04 has gone stale
    clock.advance(Duration::seconds(10));
    store
}

fn names(items: &[overview_hub::ComponentView]) -> Vec<String> {
    items
        .iter()
        .map(|c| c.payload["Name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_default_query_is_newest_first() {
    let clock = manual_clock();
    let store = seeded_store(&clock).await;

    let page = store
        .query(&prod_web(), ComponentQuery::default())
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(
        names(&page.items),
        vec!["web05", "web04", "web03", "web02", "web01"]
    );
}

#[tokio::test]
async fn test_severity_filter_uses_effective_severity() {
    let clock = manual_clock();
    let store = seeded_store(&clock).await;

    let ok = store
        .query(
            &prod_web(),
            ComponentQuery {
                severity: Some(Liveness::Ok),
                ..ComponentQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(names(&ok.items), vec!["web01"]);

    let offline = store
        .query(
            &prod_web(),
            ComponentQuery {
                severity: Some(Liveness::Offline),
                ..ComponentQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(names(&offline.items), vec!["web04"]);
}

#[tokio::test]
async fn test_numeric_sort_with_missing_values() {
    let clock = manual_clock();
    let store = seeded_store(&clock).await;

    let page = store
        .query(
            &prod_web(),
            ComponentQuery {
                sort: Some(SortSpec {
                    key: SortKey::parse("CPU"),
                    descending: false,
                }),
                ..ComponentQuery::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        names(&page.items),
        vec!["web05", "web04", "web01", "web02", "web03"]
    );
}

#[tokio::test]
async fn test_search_and_window() {
    let clock = manual_clock();
    let store = seeded_store(&clock).await;

    let page = store
        .query(
            &prod_web(),
            ComponentQuery {
                search: Some("WEB0".to_string()),
                sort: Some(SortSpec {
                    key: SortKey::parse("Name"),
                    descending: false,
                }),
                window: Window::Range {
                    start_index: 1,
                    count: 2,
                },
                ..ComponentQuery::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(names(&page.items), vec!["web02", "web03"]);

    let beyond = store
        .query(
            &prod_web(),
            ComponentQuery {
                window: Window::Page {
                    page: 10,
                    page_size: 50,
                },
                ..ComponentQuery::default()
            },
        )
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);
}

#[tokio::test]
async fn test_summary_counts_match_scope_size() {
    let clock = manual_clock();
    let store = seeded_store(&clock).await;

    let counts = store.summary_scope(&prod_web()).await.unwrap();
    assert_eq!(counts.total, 5);
    assert_eq!(counts.ok, 1);
    assert_eq!(counts.warning, 1);
    assert_eq!(counts.error, 1);
    assert_eq!(counts.info, 1);
    assert_eq!(counts.offline, 1);

    let systems = store.summary_all().await.unwrap();
    let system_names: Vec<_> = systems.iter().map(|s| s.system_name.as_str()).collect();
    assert_eq!(system_names, vec!["Dev", "Prod"]);

    let prod = &systems[1];
    assert_eq!(prod.counts.total, 6);
    assert_eq!(prod.projects.len(), 2);
    assert_eq!(
        prod.projects.iter().map(|p| p.counts.total).sum::<usize>(),
        prod.counts.total
    );
}

#[tokio::test]
async fn test_headers_and_scopes() {
    let clock = manual_clock();
    let store = seeded_store(&clock).await;

    let headers = store.headers(&prod_web()).await.unwrap();
    assert_eq!(headers, vec!["Severity", "Name", "CPU", "TTL"]);

    assert!(store.headers(&Scope::new("Nope", "Nope")).await.unwrap().is_empty());

    let scopes = store.scopes().await.unwrap();
    assert_eq!(
        scopes,
        vec![
            Scope::new("Dev", "Web"),
            Scope::new("Prod", "Db"),
            Scope::new("Prod", "Web"),
        ]
    );
}

#[tokio::test]
async fn test_delete_scope_leaves_other_scopes() {
    let clock = manual_clock();
    let store = seeded_store(&clock).await;

    assert_eq!(store.delete_scope(&prod_web()).await.unwrap(), 5);
    assert_eq!(store.delete_scope(&prod_web()).await.unwrap(), 0);
    assert_eq!(store.list_all().await.unwrap().len(), 2);
}
