//! Merging explicit definitions with stored defaults.
//!
//! Two modes, selected by `only_lower_merge`:
//!
//! - full merge ([`union`]): keys union recursively at every nesting
//!   level, so stored-only filters, terms, and filter options all join
//!   the candidate; the explicit value wins wherever both sides hold a
//!   non-mapping.
//! - lower-only merge ([`merge_filter_terms`], [`merge_policy_terms`]):
//!   only term attribute maps merge. The explicit definition fixes the
//!   set of filters and terms and their header options; stored values
//!   fill in attributes for terms the explicit side already names.
//!
//! All functions are pure; source selection (explicit vs store, which
//! fragment of the stored policy applies) lives with the caller.

use serde_yaml::{Mapping, Value};

/// Whether a definition value counts as "not provided".
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(mapping) => mapping.is_empty(),
        Value::Sequence(sequence) => sequence.is_empty(),
        _ => false,
    }
}

/// Look up a key in a mapping value.
pub fn get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_mapping().and_then(|m| m.get(key))
}

/// Recursive key union. Explicit keys come first in their own order,
/// stored-only keys follow in store order; where both sides hold a
/// mapping the union recurses, anywhere else the explicit value wins.
pub fn union(explicit: &Value, stored: &Value) -> Value {
    let (Some(explicit_map), Some(stored_map)) = (explicit.as_mapping(), stored.as_mapping())
    else {
        return explicit.clone();
    };

    let mut merged = Mapping::new();
    for (key, value) in explicit_map {
        let value = match stored_map.get(key) {
            Some(stored_value) => union(value, stored_value),
            None => value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    for (key, value) in stored_map {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Mapping(merged)
}

/// Lower-only merge of one filter body: for every explicit term, merge
/// its attribute map with the stored term of the same name. The
/// `options` key and the set of terms stay as given explicitly.
pub fn merge_filter_terms(explicit: &Value, stored: &Value) -> Value {
    let Some(explicit_map) = explicit.as_mapping() else {
        return explicit.clone();
    };

    let mut merged = Mapping::new();
    for (key, value) in explicit_map {
        let is_term = key.as_str() != Some("options");
        let value = match (is_term, key.as_str().and_then(|k| get(stored, k))) {
            (true, Some(stored_term)) => union(value, stored_term),
            _ => value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    Value::Mapping(merged)
}

/// Lower-only merge across a whole policy: term attributes merge inside
/// every filter the explicit definition names; nothing above the term
/// attribute level is imported from the store.
pub fn merge_policy_terms(explicit: &Value, stored: &Value) -> Value {
    let Some(explicit_map) = explicit.as_mapping() else {
        return explicit.clone();
    };

    let mut merged = Mapping::new();
    for (key, value) in explicit_map {
        let value = match key.as_str().and_then(|k| get(stored, k)) {
            Some(stored_filter) => merge_filter_terms(value, stored_filter),
            None => value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    Value::Mapping(merged)
}
