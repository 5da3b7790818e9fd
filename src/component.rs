//! Component domain types
//!
//! A component is one monitored entity reported by an agent. Its attribute
//! bag is schema-less: the store only requires that it is a JSON object and
//! reads a handful of well-known keys (`Severity`, `TTL`, `Id`, `Name`,
//! `Namespace`) through the accessors below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::liveness::Liveness;
use crate::storage::schema::ComponentRow;

/// Well-known attribute keys
pub mod keys {
    pub const ID: &str = "Id";
    pub const NAME: &str = "Name";
    pub const NAMESPACE: &str = "Namespace";
    pub const SEVERITY: &str = "Severity";
    pub const TTL: &str = "TTL";
}

/// The `(systemName, projectName)` pair components are grouped under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub system_name: String,
    pub project_name: String,
}

impl Scope {
    pub fn new(system_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            system_name: system_name.into(),
            project_name: project_name.into(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.system_name, self.project_name)
    }
}

/// Parsed attribute bag of a component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Parse a stored payload, returning `None` unless it is a JSON object
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(Self(map)),
            _ => None,
        }
    }

    /// Parse a stored payload, falling back to an empty bag
    pub fn parse_lossy(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    /// Look up a key, preferring an exact match over a case-insensitive one
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// Look up a key and coerce its value to a string (`None` for null/absent)
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_to_string)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// String form of a JSON value as used for matching and sorting
///
/// Strings are taken verbatim, scalars use their JSON text and nested values
/// are serialized. `null` has no string form.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// A component as served to clients: parsed payload plus effective severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentView {
    pub id: i64,
    pub system_name: String,
    pub project_name: String,
    pub created_at: DateTime<Utc>,

    /// The attribute object, or the raw text when it is not a JSON object
    pub payload: Value,

    /// Severity derived at read time
    pub severity: Liveness,
}

impl ComponentView {
    pub fn from_row(row: &ComponentRow, severity: Liveness) -> Self {
        let payload = match serde_json::from_str::<Value>(&row.payload) {
            Ok(value @ Value::Object(_)) => value,
            _ => Value::String(row.payload.clone()),
        };

        Self {
            id: row.id,
            system_name: row.system_name.clone(),
            project_name: row.project_name.clone(),
            created_at: row.created_at,
            payload,
            severity,
        }
    }
}
