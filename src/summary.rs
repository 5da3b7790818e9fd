//! Severity roll-ups
//!
//! Counts are always recomputed from the current rows: liveness moves with
//! the clock, so a persisted counter would be wrong as soon as a TTL lapses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::liveness::{self, Liveness, LivenessSettings};
use crate::storage::schema::ComponentRow;

/// Number of components per effective severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub ok: usize,
    pub warning: usize,
    pub error: usize,
    pub info: usize,
    pub offline: usize,
    pub total: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Liveness) {
        *self.bucket_mut(severity) += 1;
        self.total += 1;
    }

    pub fn get(&self, severity: Liveness) -> usize {
        match severity {
            Liveness::Ok => self.ok,
            Liveness::Warning => self.warning,
            Liveness::Error => self.error,
            Liveness::Info => self.info,
            Liveness::Offline => self.offline,
        }
    }

    pub fn merge(&mut self, other: &SeverityCounts) {
        for severity in Liveness::ALL {
            *self.bucket_mut(severity) += other.get(severity);
        }
        self.total += other.total;
    }

    fn bucket_mut(&mut self, severity: Liveness) -> &mut usize {
        match severity {
            Liveness::Ok => &mut self.ok,
            Liveness::Warning => &mut self.warning,
            Liveness::Error => &mut self.error,
            Liveness::Info => &mut self.info,
            Liveness::Offline => &mut self.offline,
        }
    }
}

/// Counts for one `(system, project)` scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSummary {
    pub system_name: String,
    pub project_name: String,
    pub counts: SeverityCounts,
}

/// Counts for a system, plus the breakdown per project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSummary {
    pub system_name: String,
    pub counts: SeverityCounts,
    pub projects: Vec<ScopeSummary>,
}

/// Count rows per effective severity
pub fn count(rows: &[ComponentRow], now: DateTime<Utc>, settings: &LivenessSettings) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for row in rows {
        counts.record(liveness::evaluate(&row.attributes(), row.created_at, now, settings));
    }
    counts
}

/// Group rows by system then project and count each group
///
/// Systems and projects come back in lexical order.
pub fn aggregate(
    rows: &[ComponentRow],
    now: DateTime<Utc>,
    settings: &LivenessSettings,
) -> Vec<SystemSummary> {
    let mut grouped: BTreeMap<&str, BTreeMap<&str, SeverityCounts>> = BTreeMap::new();

    for row in rows {
        let severity = liveness::evaluate(&row.attributes(), row.created_at, now, settings);
        grouped
            .entry(row.system_name.as_str())
            .or_default()
            .entry(row.project_name.as_str())
            .or_default()
            .record(severity);
    }

    grouped
        .into_iter()
        .map(|(system, projects)| {
            let mut counts = SeverityCounts::default();
            let projects = projects
                .into_iter()
                .map(|(project, project_counts)| {
                    counts.merge(&project_counts);
                    ScopeSummary {
                        system_name: system.to_string(),
                        project_name: project.to_string(),
                        counts: project_counts,
                    }
                })
                .collect();

            SystemSummary {
                system_name: system.to_string(),
                counts,
                projects,
            }
        })
        .collect()
}
