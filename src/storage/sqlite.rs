//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Limitations
//!
//! - **Concurrency**: One writer at a time; the hub serializes writes per scope anyway
//! - **Replication**: No built-in replication (file-level backups only)

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{ComponentRow, NewComponent};
use crate::component::Scope;

const COLUMNS: &str = "id, system_name, project_name, created_at, payload";

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for concurrent readers (WAL mode, etc.)
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use overview_hub::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./components.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    /// Helper to convert timestamp to Unix milliseconds for SQLite
    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    /// Helper to convert Unix milliseconds from SQLite to DateTime
    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }

    fn map_row(row: &SqliteRow) -> StorageResult<ComponentRow> {
        Ok(ComponentRow {
            id: row.try_get("id")?,
            system_name: row.try_get("system_name")?,
            project_name: row.try_get("project_name")?,
            created_at: Self::millis_to_timestamp(row.try_get("created_at")?),
            payload: row.try_get("payload")?,
        })
    }

    fn map_rows(rows: Vec<SqliteRow>) -> StorageResult<Vec<ComponentRow>> {
        rows.iter().map(Self::map_row).collect()
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self, component), fields(scope = %component.scope))]
    async fn insert_component(&self, component: NewComponent) -> StorageResult<ComponentRow> {
        let created_at = Self::timestamp_to_millis(&component.created_at);

        let result = sqlx::query(
            r#"
            INSERT INTO components (system_name, project_name, created_at, payload)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&component.scope.system_name)
        .bind(&component.scope.project_name)
        .bind(created_at)
        .bind(&component.payload)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("inserted component {}", id);

        Ok(ComponentRow {
            id,
            system_name: component.scope.system_name,
            project_name: component.scope.project_name,
            created_at: Self::millis_to_timestamp(created_at),
            payload: component.payload,
        })
    }

    #[instrument(skip(self, payload))]
    async fn update_component(
        &self,
        id: i64,
        payload: String,
        created_at: DateTime<Utc>,
    ) -> StorageResult<ComponentRow> {
        let sql = format!(
            "UPDATE components SET payload = ?, created_at = ? WHERE id = ? RETURNING {COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(payload)
            .bind(Self::timestamp_to_millis(&created_at))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound(id))?;

        Self::map_row(&row)
    }

    #[instrument(skip(self))]
    async fn get_component(&self, id: i64) -> StorageResult<Option<ComponentRow>> {
        let sql = format!("SELECT {COLUMNS} FROM components WHERE id = ?");

        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::map_row)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_components(&self) -> StorageResult<Vec<ComponentRow>> {
        let sql = format!("SELECT {COLUMNS} FROM components ORDER BY id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        debug!("listed {} components", rows.len());
        Self::map_rows(rows)
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn list_scope(&self, scope: &Scope) -> StorageResult<Vec<ComponentRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM components WHERE system_name = ? AND project_name = ? ORDER BY id ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(&scope.system_name)
            .bind(&scope.project_name)
            .fetch_all(&self.pool)
            .await?;

        Self::map_rows(rows)
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn sample_scope(&self, scope: &Scope, limit: usize) -> StorageResult<Vec<ComponentRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM components WHERE system_name = ? AND project_name = ? ORDER BY id ASC LIMIT ?"
        );

        let rows = sqlx::query(&sql)
            .bind(&scope.system_name)
            .bind(&scope.project_name)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Self::map_rows(rows)
    }

    #[instrument(skip(self))]
    async fn list_scopes(&self) -> StorageResult<Vec<Scope>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT DISTINCT system_name, project_name
            FROM components
            ORDER BY system_name ASC, project_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(system, project)| Scope::new(system, project))
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_component(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM components WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn delete_scope(&self, scope: &Scope) -> StorageResult<usize> {
        let result =
            sqlx::query("DELETE FROM components WHERE system_name = ? AND project_name = ?")
                .bind(&scope.system_name)
                .bind(&scope.project_name)
                .execute(&self.pool)
                .await?;

        let deleted = result.rows_affected() as usize;
        info!("deleted {} components in {}", deleted, scope);
        Ok(deleted)
    }

    #[instrument(skip(self), fields(before = %before))]
    async fn cleanup_old_components(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM components WHERE created_at < ?")
            .bind(Self::timestamp_to_millis(&before))
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() as usize;
        debug!("deleted {} components older than {}", deleted, before);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<String> {
        let (total_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM components")
            .fetch_one(&self.pool)
            .await?;

        let (scopes,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM (SELECT DISTINCT system_name, project_name FROM components)",
        )
        .fetch_one(&self.pool)
        .await?;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(format!(
            "SQLite: {} rows in {} scopes, {:.2} MB on disk",
            total_rows,
            scopes,
            file_size as f64 / 1_000_000.0
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
