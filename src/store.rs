//! Component store service
//!
//! [`ComponentStore`] is the one entry point shared by the API and the
//! retention actor. It validates and normalizes incoming reports, resolves
//! them against existing components, writes through the storage backend and
//! announces every committed change on a broadcast channel.
//!
//! ## Write serialization
//!
//! Identity resolution is a read (scan the scope) followed by a write
//! (insert or update). Every ingest holds an async mutex keyed by scope
//! across that sequence, so two concurrent reports of the same natural key
//! always end up as one component. Reports for different scopes never wait
//! on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{OwnedMutexGuard, broadcast};
use tracing::{debug, info, instrument, trace};

use crate::actors::messages::{ChangeEvent, ChangeKind};
use crate::clock::{Clock, SystemClock};
use crate::component::{Attributes, ComponentView, Scope};
use crate::headers;
use crate::liveness::{self, LivenessSettings};
use crate::query::{self, ComponentQuery, QueryPage, Window};
use crate::resolver::{self, NaturalKey};
use crate::storage::{ComponentRow, HealthStatus, NewComponent, StorageBackend, StorageError};
use crate::summary::{self, SeverityCounts, SystemSummary};

/// Capacity of the change-notification channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Errors returned by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request is malformed; nothing was written
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Store behavior knobs
#[derive(Debug, Clone, Copy)]
pub struct StoreSettings {
    pub liveness: LivenessSettings,

    /// Reject reports that carry neither `Id` nor `Name`
    pub require_natural_key: bool,

    /// How many components header inference looks at
    pub header_sample_size: usize,

    /// Upper bound for page sizes and window counts
    pub max_page_size: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            liveness: LivenessSettings::default(),
            require_natural_key: false,
            header_sample_size: 100,
            max_page_size: 1000,
        }
    }
}

/// A status report as submitted by an agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default)]
    pub system_name: Option<String>,

    #[serde(default)]
    pub project_name: Option<String>,

    /// A JSON object, or a string holding (ideally) a JSON object
    #[serde(default)]
    pub payload: Option<Value>,
}

/// Whether an ingest created a new component or refreshed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestOutcome {
    Created,
    Updated,
}

/// A validated report, ready to be resolved and written
struct Normalized {
    scope: Scope,
    payload: String,
    key: Option<NaturalKey>,
}

/// Async mutexes keyed by scope
#[derive(Default)]
struct ScopeLocks {
    locks: Mutex<HashMap<Scope, Arc<tokio::sync::Mutex<()>>>>,
}

impl ScopeLocks {
    async fn acquire(&self, scope: &Scope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(scope.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Forget the lock of a scope nobody is holding or waiting on
    ///
    /// Clones are handed out under the same map lock, so a count of one
    /// means only the table still refers to it.
    fn release(&self, scope: &Scope) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(scope).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(scope);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// The component status store
#[derive(Clone)]
pub struct ComponentStore {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    settings: StoreSettings,
    locks: Arc<ScopeLocks>,
    events: broadcast::Sender<ChangeEvent>,
}

impl ComponentStore {
    /// Create a store reading time from the system clock
    pub fn new(backend: Arc<dyn StorageBackend>, settings: StoreSettings) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock), settings)
    }

    pub fn with_clock(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        settings: StoreSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            clock,
            settings,
            locks: Arc::new(ScopeLocks::default()),
            events,
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Receive a [`ChangeEvent`] for every committed mutation from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Create or update a component from an agent report
    #[instrument(skip(self, request))]
    pub async fn ingest(&self, request: IngestRequest) -> StoreResult<(IngestOutcome, ComponentView)> {
        let Normalized {
            scope,
            payload,
            key,
        } = self.normalize(request)?;

        let guard = self.locks.acquire(&scope).await;
        let now = self.clock.now();

        let existing = match &key {
            Some(key) => {
                let candidates = self.backend.list_scope(&scope).await?;
                resolver::resolve(key, &candidates).map(|row| row.id)
            }
            None => None,
        };

        let (outcome, row) = match existing {
            Some(id) => match self.backend.update_component(id, payload.clone(), now).await {
                Ok(row) => (IngestOutcome::Updated, row),
                Err(StorageError::NotFound(_)) => {
                    debug!("component {} vanished before update, recreating", id);
                    let row = self
                        .backend
                        .insert_component(NewComponent {
                            scope: scope.clone(),
                            created_at: now,
                            payload,
                        })
                        .await?;
                    (IngestOutcome::Created, row)
                }
                Err(e) => return Err(e.into()),
            },
            None => {
                let row = self
                    .backend
                    .insert_component(NewComponent {
                        scope: scope.clone(),
                        created_at: now,
                        payload,
                    })
                    .await?;
                (IngestOutcome::Created, row)
            }
        };

        drop(guard);

        match &key {
            Some(key) => trace!("{:?} component {} in {} ({})", outcome, row.id, scope, key),
            None => trace!("{:?} component {} in {} (no natural key)", outcome, row.id, scope),
        }

        let kind = match outcome {
            IngestOutcome::Created => ChangeKind::Created,
            IngestOutcome::Updated => ChangeKind::Updated,
        };
        self.publish(ChangeEvent::for_row(kind, &row, now));

        Ok((outcome, self.materialize(&row, now)))
    }

    pub async fn get(&self, id: i64) -> StoreResult<Option<ComponentView>> {
        let now = self.clock.now();
        Ok(self
            .backend
            .get_component(id)
            .await?
            .map(|row| self.materialize(&row, now)))
    }

    pub async fn list_all(&self) -> StoreResult<Vec<ComponentView>> {
        let now = self.clock.now();
        let rows = self.backend.list_components().await?;
        Ok(rows.iter().map(|row| self.materialize(row, now)).collect())
    }

    pub async fn list_scope(&self, scope: &Scope) -> StoreResult<Vec<ComponentView>> {
        let now = self.clock.now();
        let rows = self.backend.list_scope(scope).await?;
        Ok(rows.iter().map(|row| self.materialize(row, now)).collect())
    }

    /// Delete one component, returning whether it existed
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        let Some(row) = self.backend.get_component(id).await? else {
            return Ok(false);
        };

        let deleted = self.backend.delete_component(id).await?;
        if deleted {
            debug!("deleted component {} from {}", id, row.scope());
            self.publish(ChangeEvent::for_row(ChangeKind::Deleted, &row, self.clock.now()));
        }
        Ok(deleted)
    }

    /// Delete every component in a scope, returning how many were removed
    #[instrument(skip(self))]
    pub async fn delete_scope(&self, scope: &Scope) -> StoreResult<usize> {
        let deleted = {
            let _guard = self.locks.acquire(scope).await;
            self.backend.delete_scope(scope).await?
        };
        self.locks.release(scope);

        if deleted > 0 {
            info!("deleted {} components from {}", deleted, scope);
            self.publish(ChangeEvent::scope_deleted(
                &scope.system_name,
                &scope.project_name,
                deleted,
                self.clock.now(),
            ));
        }
        Ok(deleted)
    }

    /// Filter, sort and slice the components of a scope
    pub async fn query(&self, scope: &Scope, mut query: ComponentQuery) -> StoreResult<QueryPage> {
        let max = self.settings.max_page_size;
        query.window = match query.window {
            Window::Page { page, page_size } => Window::Page {
                page,
                page_size: page_size.min(max),
            },
            Window::Range { start_index, count } => Window::Range {
                start_index,
                count: count.min(max),
            },
        };

        let rows = self.backend.list_scope(scope).await?;
        let page = query::run(rows, &query, self.clock.now(), &self.settings.liveness);
        trace!("query on {} matched {} components", scope, page.total);
        Ok(page)
    }

    /// Severity counts for every system and project
    pub async fn summary_all(&self) -> StoreResult<Vec<SystemSummary>> {
        let rows = self.backend.list_components().await?;
        Ok(summary::aggregate(&rows, self.clock.now(), &self.settings.liveness))
    }

    /// Severity counts for one scope
    pub async fn summary_scope(&self, scope: &Scope) -> StoreResult<SeverityCounts> {
        let rows = self.backend.list_scope(scope).await?;
        Ok(summary::count(&rows, self.clock.now(), &self.settings.liveness))
    }

    /// Column headers inferred from a sample of the scope
    pub async fn headers(&self, scope: &Scope) -> StoreResult<Vec<String>> {
        let rows = self
            .backend
            .sample_scope(scope, self.settings.header_sample_size)
            .await?;
        Ok(headers::infer_headers(&rows))
    }

    /// Every scope that currently holds at least one component
    pub async fn scopes(&self) -> StoreResult<Vec<Scope>> {
        Ok(self.backend.list_scopes().await?)
    }

    /// Delete components last written more than `threshold` ago
    #[instrument(skip(self))]
    pub async fn sweep_older_than(&self, threshold: Duration) -> StoreResult<usize> {
        let now = self.clock.now();
        let cutoff = now - threshold;

        debug!("sweeping components last written before {}", cutoff);
        let deleted = self.backend.cleanup_old_components(cutoff).await?;

        if deleted > 0 {
            self.publish(ChangeEvent::swept(deleted, now));
        }
        Ok(deleted)
    }

    pub async fn health_check(&self) -> StoreResult<HealthStatus> {
        Ok(self.backend.health_check().await?)
    }

    pub async fn backend_stats(&self) -> StoreResult<String> {
        Ok(self.backend.get_stats().await?)
    }

    pub async fn close(&self) -> StoreResult<()> {
        Ok(self.backend.close().await?)
    }

    fn materialize(&self, row: &ComponentRow, now: DateTime<Utc>) -> ComponentView {
        let severity =
            liveness::evaluate(&row.attributes(), row.created_at, now, &self.settings.liveness);
        ComponentView::from_row(row, severity)
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers is not an error
        if self.events.send(event).is_err() {
            trace!("no change subscribers");
        }
    }

    fn normalize(&self, request: IngestRequest) -> StoreResult<Normalized> {
        let system_name = required_name(request.system_name, "systemName")?;
        let project_name = required_name(request.project_name, "projectName")?;

        let (payload, attributes) = match request.payload {
            Some(Value::Object(map)) => {
                let payload = serde_json::to_string(&map)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                (payload, Some(Attributes::from(map)))
            }
            Some(Value::String(raw)) if !raw.trim().is_empty() => {
                let attributes = Attributes::parse(&raw);
                if attributes.is_none() {
                    debug!(
                        "payload for {}/{} is not a JSON object, storing as opaque text",
                        system_name, project_name
                    );
                }
                (raw, attributes)
            }
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(StoreError::Validation("payload is required".to_string()));
            }
            Some(_) => {
                return Err(StoreError::Validation(
                    "payload must be a JSON object or a JSON-encoded string".to_string(),
                ));
            }
        };

        let key = attributes.as_ref().and_then(NaturalKey::extract);
        if key.is_none() && self.settings.require_natural_key {
            return Err(StoreError::Validation(
                "payload must carry an Id or a Name".to_string(),
            ));
        }

        Ok(Normalized {
            scope: Scope::new(system_name, project_name),
            payload,
            key,
        })
    }
}

fn required_name(value: Option<String>, field: &str) -> StoreResult<String> {
    match value.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(StoreError::Validation(format!("{field} is required"))),
    }
}
