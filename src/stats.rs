use serde_json::{Map, Number, Value};

/// Sample standard deviation (n - 1) over sqrt(n); 0 below two values.
pub fn standard_error(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt() / n.sqrt()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `sum(value_i * weight_i) / sum(weight_i)`, ignoring non-positive weights.
pub fn weighted_mean(pairs: impl IntoIterator<Item = (f64, i64)>) -> Option<f64> {
    let mut weighted_sum = 0.0_f64;
    let mut total_weight = 0_i64;
    for (value, weight) in pairs {
        if weight <= 0 {
            continue;
        }
        weighted_sum += value * weight as f64;
        total_weight = total_weight.saturating_add(weight);
    }
    (total_weight > 0).then(|| weighted_sum / total_weight as f64)
}

/// Deep merge; nested objects merge recursively, a null never overwrites.
pub fn merge_nested(
    existing: Map<String, Value>,
    incoming: Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = existing;
    for (key, value) in incoming {
        match (merged.remove(&key), value) {
            (Some(Value::Object(current)), Value::Object(next)) => {
                merged.insert(key, Value::Object(merge_nested(current, next)));
            }
            (Some(current), Value::Null) => {
                merged.insert(key, current);
            }
            (None, Value::Null) => {}
            (_, next) => {
                merged.insert(key, next);
            }
        }
    }
    merged
}

/// Rounds every float leaf to `digits` decimals; integers, strings, bools and
/// nulls pass through.
pub fn round_floats(value: Value, digits: usize) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => {
            let rounded = number.as_f64().map(|raw| round_to(raw, digits));
            match rounded.and_then(Number::from_f64) {
                Some(rounded) => Value::Number(rounded),
                None => Value::Number(number),
            }
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| round_floats(item, digits))
                .collect(),
        ),
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, item)| (key, round_floats(item, digits)))
                .collect(),
        ),
        other => other,
    }
}

fn round_to(value: f64, digits: usize) -> f64 {
    format!("{value:.digits$}").parse().unwrap_or(value)
}
