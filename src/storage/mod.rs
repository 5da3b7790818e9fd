//! Storage backends for component persistence
//!
//! This module provides a trait-based abstraction for storing component
//! records to various backends.
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` trait allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio
//! - **Payload-agnostic**: Attribute bags are stored as opaque text
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database, good for thousands of components
//! - **In-Memory**: No persistence, for testing or throwaway hubs
//!
//! ## Usage
//!
//! ```no_run
//! use overview_hub::storage::{StorageBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./components.db").await?;
//!     let stats = backend.get_stats().await?;
//!     println!("{stats}");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use schema::{ComponentRow, NewComponent};
