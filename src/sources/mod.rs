use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::normalize::AliasSources;
use crate::stats::merge_nested;

pub mod cohort;
pub mod comparison;
pub mod lenient;
pub mod likert;
pub mod multiple_choice;
pub mod spatial;
pub mod spatial_hvm;
#[cfg(test)]
mod tests;

/// Folds a block keyed by raw model name into one object per canonical name.
/// Shards of the same model are unioned rather than overwritten.
pub fn merge_by_model(
    raw: Map<String, Value>,
    aliases: &mut AliasSources,
) -> BTreeMap<String, Map<String, Value>> {
    let mut merged: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for (raw_name, value) in raw {
        let incoming = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => continue,
        };
        let canonical = aliases.resolve_model(&raw_name);
        let existing = merged.remove(&canonical).unwrap_or_default();
        merged.insert(canonical, merge_nested(existing, incoming));
    }
    merged
}

pub fn decode_each<T: DeserializeOwned>(
    merged: BTreeMap<String, Map<String, Value>>,
) -> BTreeMap<String, T> {
    merged
        .into_iter()
        .filter_map(|(name, map)| lenient::decode(Value::Object(map)).map(|record| (name, record)))
        .collect()
}
