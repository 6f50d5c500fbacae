//! Metadata filtering (C5).
//!
//! Generalizes the teacher's single-value `FilterPredicate::Equals` into a
//! value-or-list constraint per field, keyed by the canonical string form
//! metadata values already produce for the field index.

use std::collections::{HashMap, HashSet};

use crate::error::SearchError;
use crate::index::IndexState;
use crate::meta::MetaValue;

/// A filter clause: per field, a value or list of values (OR'd together
/// within the field, AND'd across fields).
pub type Filter = HashMap<String, MetaValue>;

/// Validate `filter` against the index's indexed-fields set and resolve it
/// to an "allowed" doc id set, or `None` meaning "no filter, everything
/// allowed".
pub fn resolve(state: &IndexState, filter: &Filter) -> Result<Option<HashSet<u32>>, SearchError> {
    if filter.is_empty() {
        return Ok(None);
    }

    let unknown: Vec<String> = filter
        .keys()
        .filter(|field| !state.indexed_fields().contains(*field))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        let mut known: Vec<String> = state.indexed_fields().iter().cloned().collect();
        known.sort_unstable();
        return Err(SearchError::UnknownField {
            requested: unknown,
            known,
        });
    }

    let mut allowed: Option<HashSet<u32>> = None;
    for (field, value) in filter {
        let field_set = per_field_matches(state, field, value);
        allowed = Some(match allowed {
            None => field_set,
            Some(acc) => acc.intersection(&field_set).copied().collect(),
        });
        if allowed.as_ref().is_some_and(|s| s.is_empty()) {
            break;
        }
    }
    Ok(allowed)
}

/// Union of doc ids across every value named by this field's filter clause.
fn per_field_matches(state: &IndexState, field: &str, value: &MetaValue) -> HashSet<u32> {
    let Some(buckets) = state.field_index.get(field) else {
        return HashSet::new();
    };
    let mut out = HashSet::new();
    for canon in value.canonical_strings() {
        if let Some(ids) = buckets.get(&canon) {
            out.extend(ids.iter().copied());
        }
    }
    out
}
