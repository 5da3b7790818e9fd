//! Helper functions for integration tests

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use overview_hub::{
    ComponentStore, IngestRequest, StoreSettings,
    clock::ManualClock,
    component::Scope,
    storage::MemoryBackend,
};
use serde_json::Value;

pub fn manual_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap())
}

/// In-memory store driven by the given clock
pub fn store_with_clock(clock: &ManualClock) -> ComponentStore {
    ComponentStore::with_clock(
        Arc::new(MemoryBackend::new()),
        Arc::new(clock.clone()),
        StoreSettings::default(),
    )
}

pub fn report(system: &str, project: &str, payload: Value) -> IngestRequest {
    IngestRequest {
        system_name: Some(system.to_string()),
        project_name: Some(project.to_string()),
        payload: Some(payload),
    }
}

pub fn prod_web() -> Scope {
    Scope::new("Prod", "Web")
}
