use serde_json::Value;

use super::format_value;

/// Key answer fields, in order of priority.
const PRIORITY_KEYS: [&str; 8] = [
    "price",
    "approximate_ytm",
    "modified_duration",
    "sharpe_ratio",
    "beta",
    "global_min",
    "base_price",
    "mean_cost",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back to
/// the first scalar field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_array()) {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        // Dated extremes print as "<drawdown> @ <date>"
        Value::Object(map) => match (map.get("drawdown"), map.get("date")) {
            (Some(dd), Some(date)) => format!("{} @ {}", format_value(dd), format_value(date)),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
        Value::Null => "null".to_string(),
        _ => format_value(value),
    }
}
