//! API request and response types
//!
//! Everything here serializes as camelCase, matching the ingestion contract
//! agents already speak.

use serde::{Deserialize, Serialize};

use crate::actors::messages::RetentionStats;
use crate::component::{ComponentView, Scope};
use crate::liveness::Liveness;
use crate::query::{ComponentQuery, SortKey, SortSpec, Window};
use crate::storage::HealthStatus;
use crate::store::IngestOutcome;
use crate::summary::{SeverityCounts, SystemSummary};

use super::error::{ApiError, ApiResult};

/// Default page size for paged queries
pub const DEFAULT_PAGE_SIZE: usize = 50;

// ============================================================================
// Query Parameters
// ============================================================================

/// Filters shared by the paged and windowed queries
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    /// Effective severity to keep (`ok|warning|error|info|offline`)
    pub severity: Option<String>,

    /// Case-insensitive substring of the raw payload
    pub search: Option<String>,

    /// `createdAt`/`timestamp` or an attribute key
    pub sort_by: Option<String>,

    pub sort_desc: Option<bool>,
}

impl FilterParams {
    /// Build a query with the given window
    pub fn into_query(self, window: Window) -> ApiResult<ComponentQuery> {
        let severity = match self.severity.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Liveness::parse(raw).ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "unknown severity '{raw}', expected one of ok, warning, error, info, offline"
                ))
            })?),
        };

        let sort_by = self.sort_by.filter(|s| !s.trim().is_empty());
        let sort = match (sort_by, self.sort_desc) {
            (Some(field), descending) => Some(SortSpec {
                key: SortKey::parse(&field),
                descending: descending.unwrap_or(false),
            }),
            (None, Some(descending)) => Some(SortSpec {
                key: SortKey::CreatedAt,
                descending,
            }),
            (None, None) => None,
        };

        Ok(ComponentQuery {
            severity,
            search: self.search,
            sort,
            window,
        })
    }
}

/// Query parameters for GET /api/v1/scopes/:system/:project/components
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub severity: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,

    /// 1-based page number (default: 1)
    pub page: Option<usize>,

    /// Items per page (default: 50)
    pub page_size: Option<usize>,
}

impl PageParams {
    pub fn split(self) -> (FilterParams, usize, usize) {
        let filter = FilterParams {
            severity: self.severity,
            search: self.search,
            sort_by: self.sort_by,
            sort_desc: self.sort_desc,
        };
        (
            filter,
            self.page.unwrap_or(1).max(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// Query parameters for GET /api/v1/scopes/:system/:project/components/window
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowParams {
    pub severity: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,

    /// Index of the first item (default: 0)
    pub start_index: Option<usize>,

    /// Number of items (default: 50)
    pub count: Option<usize>,
}

impl WindowParams {
    pub fn split(self) -> (FilterParams, usize, usize) {
        let filter = FilterParams {
            severity: self.severity,
            search: self.search,
            sort_by: self.sort_by,
            sort_desc: self.sort_desc,
        };
        (
            filter,
            self.start_index.unwrap_or(0),
            self.count.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

// ============================================================================
// API Response Types
// ============================================================================

/// Response for POST /api/v1/components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// `created` for a new component, `ok` for an update
    pub status: String,

    pub component: ComponentView,
}

impl IngestResponse {
    pub fn new(outcome: IngestOutcome, component: ComponentView) -> Self {
        let status = match outcome {
            IngestOutcome::Created => "created",
            IngestOutcome::Updated => "ok",
        };
        Self {
            status: status.to_string(),
            component,
        }
    }
}

/// Response for GET /api/v1/components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsResponse {
    pub components: Vec<ComponentView>,
    pub count: usize,
}

/// Response for GET /api/v1/scopes/:system/:project/components
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub items: Vec<ComponentView>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Response for GET /api/v1/scopes/:system/:project/components/window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowResponse {
    pub items: Vec<ComponentView>,
    pub total: usize,
    pub start_index: usize,
    pub count: usize,
}

/// A system and the projects reporting under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemScopes {
    pub system_name: String,
    pub projects: Vec<String>,
}

/// Response for GET /api/v1/scopes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopesResponse {
    pub systems: Vec<SystemScopes>,
    pub count: usize,
}

impl ScopesResponse {
    /// Group scopes (sorted by system then project) under their system
    pub fn from_scopes(scopes: Vec<Scope>) -> Self {
        let count = scopes.len();
        let mut systems: Vec<SystemScopes> = Vec::new();

        for scope in scopes {
            match systems.last_mut() {
                Some(last) if last.system_name == scope.system_name => {
                    last.projects.push(scope.project_name);
                }
                _ => systems.push(SystemScopes {
                    system_name: scope.system_name,
                    projects: vec![scope.project_name],
                }),
            }
        }

        Self { systems, count }
    }
}

/// Response for GET /api/v1/scopes/:system/:project/headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadersResponse {
    pub headers: Vec<String>,
}

/// Response for DELETE /api/v1/scopes/:system/:project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteScopeResponse {
    pub deleted: usize,
}

/// Response for GET /api/v1/summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub systems: Vec<SystemSummary>,
    pub totals: SeverityCounts,
}

/// Response for GET /api/v1/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: HealthStatus,
}

/// Response for GET /api/v1/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub timestamp: String,
    pub storage: String,
    pub scopes: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<RetentionStats>,
}
