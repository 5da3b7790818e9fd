//! Liveness evaluation
//!
//! A component's effective severity is never stored. It is derived on every
//! read from the declared `Severity`, the last-write timestamp and a TTL:
//!
//! ```text
//! effective_ttl = attributes.TTL (seconds, if > 0) else default_ttl
//! now - created_at >= effective_ttl  ->  offline
//! otherwise                          ->  declared severity (unknown -> info)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Attributes, keys};

/// Default staleness threshold when a component carries no `TTL`
pub const DEFAULT_STALE_THRESHOLD_SECS: i64 = 3600;

/// Severity an agent can declare in its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warning,
    Error,
    Info,
}

impl Severity {
    /// Parse a declared severity, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ok" => Some(Severity::Ok),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Declared severity of an attribute bag; anything unrecognized is `info`
    pub fn declared(attributes: &Attributes) -> Self {
        attributes
            .get_string(keys::SEVERITY)
            .and_then(|s| Severity::parse(&s))
            .unwrap_or(Severity::Info)
    }
}

/// Effective severity bucket of a component at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Ok,
    Warning,
    Error,
    Info,
    Offline,
}

impl Liveness {
    pub const ALL: [Liveness; 5] = [
        Liveness::Ok,
        Liveness::Warning,
        Liveness::Error,
        Liveness::Info,
        Liveness::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Liveness::Ok => "ok",
            Liveness::Warning => "warning",
            Liveness::Error => "error",
            Liveness::Info => "info",
            Liveness::Offline => "offline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Liveness::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for Liveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for Liveness {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Ok => Liveness::Ok,
            Severity::Warning => Liveness::Warning,
            Severity::Error => Liveness::Error,
            Severity::Info => Liveness::Info,
        }
    }
}

/// Global liveness settings
#[derive(Debug, Clone, Copy)]
pub struct LivenessSettings {
    /// TTL applied to components without their own `TTL`
    pub default_ttl: Duration,
}

impl LivenessSettings {
    pub fn from_secs(secs: i64) -> Self {
        let secs = if secs > 0 {
            secs
        } else {
            DEFAULT_STALE_THRESHOLD_SECS
        };
        Self {
            default_ttl: Duration::seconds(secs),
        }
    }
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self::from_secs(DEFAULT_STALE_THRESHOLD_SECS)
    }
}

/// Per-component TTL override in seconds, if present and positive
pub fn ttl_override(attributes: &Attributes) -> Option<Duration> {
    let secs = match attributes.get(keys::TTL)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }

    // Clamp to something chrono can represent; anything this large never expires anyway.
    let millis = (secs * 1000.0).min(i64::MAX as f64 / 4.0) as i64;
    Some(Duration::milliseconds(millis))
}

/// Compute the effective severity of a component
pub fn evaluate(
    attributes: &Attributes,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    settings: &LivenessSettings,
) -> Liveness {
    let ttl = ttl_override(attributes).unwrap_or(settings.default_ttl);

    if now - created_at >= ttl {
        return Liveness::Offline;
    }

    Severity::declared(attributes).into()
}
