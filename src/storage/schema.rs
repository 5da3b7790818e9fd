//! Database schema and component row definitions
//!
//! ## Design Philosophy
//!
//! The attribute bag is stored **verbatim as text**. Agents send arbitrary
//! keys and the set of keys changes over time, so there is nothing to gain
//! from columns: filtering, sorting and schema inference all run over the
//! parsed bag in memory.
//!
//! Only the scope and the timestamp are real columns, since those are what
//! the storage layer itself filters on (scope listing, retention cleanup).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::component::{Attributes, Scope};

/// A single component row stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRow {
    /// Store-assigned identity
    pub id: i64,

    pub system_name: String,

    pub project_name: String,

    /// Time of the last accepted write (always UTC)
    pub created_at: DateTime<Utc>,

    /// Raw attribute payload as received
    pub payload: String,
}

impl ComponentRow {
    pub fn scope(&self) -> Scope {
        Scope::new(self.system_name.clone(), self.project_name.clone())
    }

    pub fn in_scope(&self, scope: &Scope) -> bool {
        self.system_name == scope.system_name && self.project_name == scope.project_name
    }

    /// Parsed attributes; malformed payloads yield an empty bag
    pub fn attributes(&self) -> Attributes {
        Attributes::parse_lossy(&self.payload)
    }
}

/// A component that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewComponent {
    pub scope: Scope,
    pub created_at: DateTime<Utc>,
    pub payload: String,
}
