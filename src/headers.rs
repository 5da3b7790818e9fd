//! Column header inference for a scope
//!
//! Headers are the union of the top-level keys of a bounded sample of rows,
//! sorted ordinally, with `Severity` then `Name` pulled to the front and `Id`
//! hidden. Key matching for those three is case-insensitive; the casing
//! shown is the one agents actually sent.

use std::collections::BTreeSet;

use crate::component::keys;
use crate::storage::schema::ComponentRow;

/// Infer ordered column headers from sampled rows
pub fn infer_headers(rows: &[ComponentRow]) -> Vec<String> {
    let mut union: BTreeSet<String> = BTreeSet::new();
    for row in rows {
        union.extend(row.attributes().keys().cloned());
    }

    let mut remaining: Vec<String> = union
        .into_iter()
        .filter(|k| !k.eq_ignore_ascii_case(keys::ID))
        .collect();

    let severity = take_key(&mut remaining, keys::SEVERITY);
    let name = take_key(&mut remaining, keys::NAME);

    severity.into_iter().chain(name).chain(remaining).collect()
}

/// Remove every casing of `key` from `headers` and return the one to show
///
/// The canonical spelling wins when present, else the first in sort order.
fn take_key(headers: &mut Vec<String>, key: &str) -> Option<String> {
    let mut found: Vec<String> = Vec::new();
    headers.retain(|h| {
        if h.eq_ignore_ascii_case(key) {
            found.push(h.clone());
            false
        } else {
            true
        }
    });

    let exact = found.iter().position(|h| h == key).unwrap_or(0);
    (!found.is_empty()).then(|| found.swap_remove(exact))
}
