//! Boundary decoding for result files written by several generations of the
//! evaluation scripts. Field-level problems (wrong type, numeric strings,
//! missing keys) degrade to `None` instead of failing the whole file; a
//! record whose overall shape is wrong is dropped.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|parsed| parsed.is_finite()),
        _ => None,
    }
}

/// Integer coercion: floats truncate toward zero, strings must hold an integer.
pub fn count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|raw| raw.is_finite())
                .map(|raw| raw.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// JSON truthiness as the evaluation scripts use it for correctness flags.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|raw| raw != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

/// Records are always JSON objects; anything else is dropped.
pub fn decode<T: DeserializeOwned>(value: Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

pub fn entries_of<T: DeserializeOwned>(value: Value) -> BTreeMap<String, T> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, item)| decode(item).map(|record| (key, record)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number))
}

pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count))
}

pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text))
}

/// Present-and-`false` is the only way to get `Some(false)`.
pub fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(other) => Some(truthy(&other)),
    })
}

/// A present key grades the item even when its value is null; only an
/// absent key (handled by `#[serde(default)]`) leaves it ungraded.
pub fn graded_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(truthy(&value)))
}

pub fn shaped<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(decode))
}

/// Object of records; entries that do not decode are skipped.
pub fn entries<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(entries_of).unwrap_or_default())
}

/// Array of records; items that do not decode are skipped.
pub fn items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(list)) => list.into_iter().filter_map(decode).collect(),
        _ => Vec::new(),
    })
}

/// Raw object kept untyped, for blocks that are merged before decoding.
pub fn object<'de, D>(deserializer: D) -> Result<serde_json::Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    })
}

/// Positional list of numbers; non-numeric items stay in place as `None`.
pub fn numbers<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(list)) => list.iter().map(number).collect(),
        _ => Vec::new(),
    })
}
