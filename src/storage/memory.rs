//! In-memory storage backend (no persistence)
//!
//! Components live in an ordered map behind an async `RwLock`.
//! It's useful for:
//! - Testing without database dependencies
//! - Throwaway hubs where losing state on restart is acceptable
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart
//! - **Single process**: The map is not shared across hub instances

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{ComponentRow, NewComponent};
use crate::component::Scope;

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<i64, ComponentRow>,
    next_id: i64,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

impl MemoryBackend {
    /// Create a new, empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn insert_component(&self, component: NewComponent) -> StorageResult<ComponentRow> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;

        let row = ComponentRow {
            id: inner.next_id,
            system_name: component.scope.system_name,
            project_name: component.scope.project_name,
            created_at: component.created_at,
            payload: component.payload,
        };

        trace!("in-memory insert of component {} in {}", row.id, row.scope());
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_component(
        &self,
        id: i64,
        payload: String,
        created_at: DateTime<Utc>,
    ) -> StorageResult<ComponentRow> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or(StorageError::NotFound(id))?;

        row.payload = payload;
        row.created_at = created_at;

        Ok(row.clone())
    }

    async fn get_component(&self, id: i64) -> StorageResult<Option<ComponentRow>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn list_components(&self) -> StorageResult<Vec<ComponentRow>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn list_scope(&self, scope: &Scope) -> StorageResult<Vec<ComponentRow>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .filter(|row| row.in_scope(scope))
            .cloned()
            .collect())
    }

    async fn sample_scope(&self, scope: &Scope, limit: usize) -> StorageResult<Vec<ComponentRow>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .filter(|row| row.in_scope(scope))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_scopes(&self) -> StorageResult<Vec<Scope>> {
        let inner = self.inner.read().await;
        let scopes: BTreeSet<Scope> = inner.rows.values().map(ComponentRow::scope).collect();
        Ok(scopes.into_iter().collect())
    }

    async fn delete_component(&self, id: i64) -> StorageResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }

    async fn delete_scope(&self, scope: &Scope) -> StorageResult<usize> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|_, row| !row.in_scope(scope));
        Ok(before - inner.rows.len())
    }

    async fn cleanup_old_components(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let mut inner = self.inner.write().await;
        let count = inner.rows.len();
        inner.rows.retain(|_, row| row.created_at >= before);
        let deleted = count - inner.rows.len();

        debug!("in-memory cleanup removed {} components older than {}", deleted, before);
        Ok(deleted)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let total = self.inner.read().await.rows.len();
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("total_components".to_string(), total.to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let inner = self.inner.read().await;
        let scopes: BTreeSet<Scope> = inner.rows.values().map(ComponentRow::scope).collect();
        Ok(format!(
            "In-Memory: {} components across {} scopes",
            inner.rows.len(),
            scopes.len()
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
