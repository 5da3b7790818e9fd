//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to a specific actor via mpsc
//! 2. **Events**: Broadcast notifications published to every subscriber
//! 3. **Immutability**: Events are cloneable for multi-subscriber fan-out

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::storage::schema::ComponentRow;

/// What kind of mutation a [`ChangeEvent`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    ScopeDeleted,
    Swept,
}

/// Event published after every committed mutation of the component set
///
/// Delivery is best-effort. Subscribers that lag lose events and should
/// re-read the store; nothing depends on an event arriving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Affected component, for single-row changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Number of components affected
    pub count: usize,

    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn for_row(kind: ChangeKind, row: &ComponentRow, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            system_name: Some(row.system_name.clone()),
            project_name: Some(row.project_name.clone()),
            id: Some(row.id),
            count: 1,
            timestamp,
        }
    }

    pub fn scope_deleted(
        system_name: &str,
        project_name: &str,
        count: usize,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: ChangeKind::ScopeDeleted,
            system_name: Some(system_name.to_string()),
            project_name: Some(project_name.to_string()),
            id: None,
            count,
            timestamp,
        }
    }

    pub fn swept(count: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ChangeKind::Swept,
            system_name: None,
            project_name: None,
            id: None,
            count,
            timestamp,
        }
    }
}

/// Commands that can be sent to the RetentionActor
#[derive(Debug)]
pub enum RetentionCommand {
    /// Run a sweep immediately, bypassing the interval timer
    ///
    /// Responds with the number of components deleted. A disabled sweeper
    /// always answers `Ok(0)`.
    SweepNow {
        respond_to: oneshot::Sender<anyhow::Result<usize>>,
    },

    /// Get sweep statistics
    GetStats {
        respond_to: oneshot::Sender<RetentionStats>,
    },

    /// Stop the actor after the current command
    Shutdown,
}

/// Retention sweep statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetentionStats {
    /// False when the retention threshold is `<= 0`
    pub enabled: bool,

    pub threshold_minutes: i64,

    pub interval_minutes: u64,

    /// When the last sweep finished (successful or not)
    pub last_sweep: Option<DateTime<Utc>>,

    /// Components deleted by the last successful sweep
    pub last_deleted: usize,

    pub total_deleted: u64,

    pub sweep_count: u64,

    pub failed_sweeps: u64,
}
