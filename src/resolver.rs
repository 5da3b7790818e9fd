//! Identity resolution
//!
//! Decides whether an incoming payload updates an existing component or
//! creates a new one, based on a natural key pulled from the attribute bag:
//!
//! 1. `Id` present: match a candidate whose `Id` has the same string form.
//! 2. Otherwise `Name` present: match on `Name`, and on `Namespace` too when
//!    the incoming payload carries one.
//! 3. Otherwise: no key, always create.
//!
//! Candidates are parsed on every resolution; there is no index.

use crate::component::{Attributes, keys};
use crate::storage::schema::ComponentRow;

/// Key used to find the component an incoming payload belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NaturalKey {
    Id(String),
    Name {
        name: String,
        namespace: Option<String>,
    },
}

impl NaturalKey {
    /// Extract the natural key of an attribute bag, if it has one
    pub fn extract(attributes: &Attributes) -> Option<Self> {
        if let Some(id) = attributes.get_string(keys::ID) {
            return Some(NaturalKey::Id(id));
        }

        attributes.get_string(keys::NAME).map(|name| NaturalKey::Name {
            name,
            namespace: attributes.get_string(keys::NAMESPACE),
        })
    }

    /// Does a stored attribute bag carry this key?
    pub fn matches(&self, candidate: &Attributes) -> bool {
        match self {
            NaturalKey::Id(id) => candidate.get_string(keys::ID).as_deref() == Some(id.as_str()),
            NaturalKey::Name { name, namespace } => {
                if candidate.get_string(keys::NAME).as_deref() != Some(name.as_str()) {
                    return false;
                }

                match namespace {
                    Some(ns) => {
                        candidate.get_string(keys::NAMESPACE).as_deref() == Some(ns.as_str())
                    }
                    None => true,
                }
            }
        }
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NaturalKey::Id(id) => write!(f, "Id={id}"),
            NaturalKey::Name {
                name,
                namespace: Some(ns),
            } => write!(f, "Name={name} Namespace={ns}"),
            NaturalKey::Name {
                name,
                namespace: None,
            } => write!(f, "Name={name}"),
        }
    }
}

/// Find the first candidate (in the given order) that carries `key`
pub fn resolve<'a>(key: &NaturalKey, candidates: &'a [ComponentRow]) -> Option<&'a ComponentRow> {
    candidates
        .iter()
        .find(|row| key.matches(&row.attributes()))
}
