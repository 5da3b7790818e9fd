//! Query engine: filter, sort and slice a scope's components
//!
//! The attribute schema is dynamic, so nothing is pushed down to storage.
//! A query loads the whole scope and runs in memory:
//!
//! 1. evaluate liveness and parse attributes per component
//! 2. keep components matching the severity filter
//! 3. keep components whose raw payload contains the search text
//! 4. count matches (the total reported back to the client)
//! 5. sort by timestamp or by an attribute, numerically when every present
//!    value is a number and lexically otherwise
//! 6. slice by page or by index window

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::component::{Attributes, ComponentView};
use crate::liveness::{self, Liveness, LivenessSettings};
use crate::storage::schema::ComponentRow;

/// Which part of the filtered, sorted list to return
///
/// Both variants resolve to the same skip/take slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Classic pagination, `page` is 1-based
    Page { page: usize, page_size: usize },

    /// Index window for virtualized lists
    Range { start_index: usize, count: usize },
}

impl Window {
    /// `(skip, take)` for this window
    pub fn bounds(&self) -> (usize, usize) {
        match *self {
            Window::Page { page, page_size } => {
                (page.max(1).saturating_sub(1).saturating_mul(page_size), page_size)
            }
            Window::Range { start_index, count } => (start_index, count),
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Window::Page {
            page: 1,
            page_size: 50,
        }
    }
}

/// What to sort by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Attribute(String),
}

impl SortKey {
    /// Interpret a client-supplied sort field
    pub fn parse(field: &str) -> Self {
        let field = field.trim();
        if ["createdAt", "created_at", "timestamp"]
            .iter()
            .any(|k| k.eq_ignore_ascii_case(field))
        {
            SortKey::CreatedAt
        } else {
            SortKey::Attribute(field.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub descending: bool,
}

/// A query over one scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentQuery {
    pub severity: Option<Liveness>,
    pub search: Option<String>,

    /// `None` sorts newest first
    pub sort: Option<SortSpec>,

    pub window: Window,
}

/// One slice of query results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub items: Vec<ComponentView>,

    /// Number of matches before slicing
    pub total: usize,
}

struct Evaluated {
    row: ComponentRow,
    attributes: Attributes,
    severity: Liveness,
}

/// Run a query over the components of a scope
pub fn run(
    rows: Vec<ComponentRow>,
    query: &ComponentQuery,
    now: DateTime<Utc>,
    settings: &LivenessSettings,
) -> QueryPage {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matches: Vec<Evaluated> = rows
        .into_iter()
        .map(|row| {
            let attributes = row.attributes();
            let severity = liveness::evaluate(&attributes, row.created_at, now, settings);
            Evaluated {
                row,
                attributes,
                severity,
            }
        })
        .filter(|e| query.severity.is_none_or(|s| e.severity == s))
        .filter(|e| {
            needle
                .as_deref()
                .is_none_or(|n| e.row.payload.to_lowercase().contains(n))
        })
        .collect();

    let total = matches.len();

    sort(&mut matches, query.sort.as_ref());

    let (skip, take) = query.window.bounds();
    let items = matches
        .into_iter()
        .skip(skip)
        .take(take)
        .map(|e| ComponentView::from_row(&e.row, e.severity))
        .collect();

    QueryPage { items, total }
}

fn sort(entries: &mut Vec<Evaluated>, spec: Option<&SortSpec>) {
    let newest_first = SortSpec {
        key: SortKey::CreatedAt,
        descending: true,
    };
    let SortSpec { key, descending } = spec.unwrap_or(&newest_first);
    let descending = *descending;

    let direction = |ordering: Ordering| {
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    };

    match key {
        SortKey::CreatedAt => {
            entries.sort_by(|a, b| direction(a.row.created_at.cmp(&b.row.created_at)));
        }
        SortKey::Attribute(name) => {
            let values: Vec<Option<String>> = entries
                .iter()
                .map(|e| e.attributes.get_string(name))
                .collect();

            let numbers: Option<Vec<Option<f64>>> = values
                .iter()
                .map(|v| match v {
                    Some(s) => parse_number(s).map(Some),
                    None => Some(None),
                })
                .collect();

            let mut keyed: Vec<(SortValue, Evaluated)> = match numbers {
                Some(numbers) => numbers
                    .into_iter()
                    .map(SortValue::Number)
                    .zip(entries.drain(..))
                    .collect(),
                None => values
                    .into_iter()
                    .map(|v| SortValue::Text(v.unwrap_or_default()))
                    .zip(entries.drain(..))
                    .collect(),
            };

            keyed.sort_by(|(a, _), (b, _)| direction(a.compare(b)));
            entries.extend(keyed.into_iter().map(|(_, e)| e));
        }
    }
}

enum SortValue {
    /// Missing values sort before every number
    Number(Option<f64>),
    /// Missing values sort as the empty string
    Text(String),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
            },
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            // never mixed within one sort
            _ => Ordering::Equal,
        }
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
