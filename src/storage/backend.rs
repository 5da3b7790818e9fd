//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that all
//! storage implementations must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::StorageResult;
use super::schema::{ComponentRow, NewComponent};
use crate::component::Scope;

/// Health status of the storage backend
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Trait for component storage backends
///
/// The backend is a dumb record store: it knows about scopes and timestamps
/// but never looks inside the attribute payload. Identity resolution,
/// liveness and query logic live in [`crate::store::ComponentStore`].
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between
/// request handlers and the retention actor.
///
/// ## Atomicity
///
/// Every mutating method must either fully apply or leave the store
/// untouched; a failed update must not leave a row half-modified.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Insert a new component and return it with its assigned id
    async fn insert_component(&self, component: NewComponent) -> StorageResult<ComponentRow>;

    /// Replace the payload and refresh the timestamp of an existing component
    ///
    /// Returns `StorageError::NotFound` if the id does not exist.
    async fn update_component(
        &self,
        id: i64,
        payload: String,
        created_at: DateTime<Utc>,
    ) -> StorageResult<ComponentRow>;

    /// Fetch a single component
    async fn get_component(&self, id: i64) -> StorageResult<Option<ComponentRow>>;

    /// All components, ordered by id
    async fn list_components(&self) -> StorageResult<Vec<ComponentRow>>;

    /// All components of one scope, ordered by id
    async fn list_scope(&self, scope: &Scope) -> StorageResult<Vec<ComponentRow>>;

    /// At most `limit` components of one scope, ordered by id
    ///
    /// Used for schema inference, which only needs a bounded sample.
    async fn sample_scope(&self, scope: &Scope, limit: usize) -> StorageResult<Vec<ComponentRow>>;

    /// Distinct scopes that currently hold at least one component
    async fn list_scopes(&self) -> StorageResult<Vec<Scope>>;

    /// Delete one component, returning whether it existed
    async fn delete_component(&self, id: i64) -> StorageResult<bool>;

    /// Delete every component in a scope, returning the number deleted
    async fn delete_scope(&self, scope: &Scope) -> StorageResult<usize>;

    /// Delete components whose timestamp is older than `before`
    ///
    /// Used for retention enforcement. Returns the number deleted.
    async fn cleanup_old_components(&self, before: DateTime<Utc>) -> StorageResult<usize>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database, check file access).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get backend-specific statistics
    ///
    /// Returns human-readable stats about the backend
    /// (e.g., "SQLite: 1200 rows, 4.50 MB on disk").
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
