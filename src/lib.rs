//! Component status store
//!
//! Agents push schema-less status reports ("components") grouped by
//! `(systemName, projectName)`. The hub upserts them by natural key, derives
//! a time-based severity on every read and serves filtered, sorted,
//! paginated and aggregated views over them.

pub mod actors;
pub mod agent;
pub mod api;
pub mod clock;
pub mod component;
pub mod config;
pub mod headers;
pub mod liveness;
pub mod query;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod summary;
pub mod util;

pub use component::{ComponentView, Scope};
pub use liveness::{Liveness, Severity};
pub use store::{ComponentStore, IngestOutcome, IngestRequest, StoreError, StoreSettings};
