//! Push agent
//!
//! Samples the local host, derives a severity from usage thresholds and
//! reports the result as one component to the hub's ingestion endpoint.
//! The component is keyed by hostname, so repeated reports update the same
//! row instead of piling up.

pub mod collect;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::component::keys;
use crate::liveness::Severity;
use crate::store::IngestRequest;

pub use collect::{DiskUsage, HostSample, sample_host};

/// Usage percentages at which the host is flagged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning: f64,
    pub error: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: 85.0,
            error: 95.0,
        }
    }
}

impl Thresholds {
    /// `error` if any value reaches the error threshold, else `warning` if
    /// any value reaches the warning threshold, else `ok`
    pub fn classify(&self, sample: &HostSample) -> Severity {
        let values = std::iter::once(sample.cpu_percent)
            .chain(std::iter::once(sample.memory_percent))
            .chain(sample.disks.iter().map(|d| d.used_percent));

        let mut severity = Severity::Ok;
        for value in values {
            if value >= self.error {
                return Severity::Error;
            }
            if value >= self.warning {
                severity = Severity::Warning;
            }
        }
        severity
    }
}

/// Where and how the agent reports
#[derive(Debug, Clone)]
pub struct ReportTarget {
    pub system_name: String,
    pub project_name: String,

    /// Liveness TTL in seconds attached to every report
    pub ttl: Option<u64>,
}

/// Build the attribute payload for a sample
pub fn build_payload(sample: &HostSample, severity: Severity, ttl: Option<u64>) -> Map<String, Value> {
    let disks = if sample.disks.is_empty() {
        "No disks found".to_string()
    } else {
        sample
            .disks
            .iter()
            .map(|d| format!("{} ({:.1}%)", d.mount_point, d.used_percent))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut payload = Map::new();
    payload.insert(keys::ID.to_string(), json!(sample.host_name));
    payload.insert(keys::NAME.to_string(), json!(sample.host_name));
    payload.insert("CPU".to_string(), json!(format!("{:.1}%", sample.cpu_percent)));
    payload.insert(
        "Memory".to_string(),
        json!(format!("{:.1}%", sample.memory_percent)),
    );
    payload.insert("Disks".to_string(), json!(disks));
    payload.insert(keys::SEVERITY.to_string(), json!(severity));
    if let Some(ttl) = ttl {
        payload.insert(keys::TTL.to_string(), json!(ttl));
    }
    payload
}

/// Build the full ingestion request for a sample
pub fn build_report(sample: &HostSample, thresholds: &Thresholds, target: &ReportTarget) -> IngestRequest {
    let severity = thresholds.classify(sample);
    IngestRequest {
        system_name: Some(target.system_name.clone()),
        project_name: Some(target.project_name.clone()),
        payload: Some(Value::Object(build_payload(sample, severity, target.ttl))),
    }
}

/// HTTP client for the ingestion endpoint
#[derive(Debug, Clone)]
pub struct Reporter {
    client: reqwest::Client,
    url: String,
}

impl Reporter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// POST a report, failing on any non-2xx answer
    #[instrument(skip(self, report), fields(url = %self.url))]
    pub async fn send(&self, report: &IngestRequest) -> anyhow::Result<StatusCode> {
        let response = self.client.post(&self.url).json(report).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("ingestion endpoint answered {status}: {body}");
        }

        debug!("report accepted ({})", status);
        Ok(status)
    }
}
