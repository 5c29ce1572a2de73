use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{format_value, split_series};

/// Write output as CSV to stdout.
///
/// Results carrying series are written one row per observation with a leading
/// `series` column; scalar-only results as two-column `field,value` rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let target = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            write_result_csv(&mut wtr, target);
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result_csv<W: Write>(wtr: &mut csv::Writer<W>, result: &Map<String, Value>) {
    let (scalars, series) = split_series(result);
    if series.is_empty() {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in scalars {
            let _ = wtr.write_record([key.to_string(), format_value(val)]);
        }
        return;
    }

    let Some(Value::Object(first)) = series[0].1.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let mut header_row = vec!["series"];
    header_row.extend(headers.iter().copied());
    let _ = wtr.write_record(&header_row);

    for (name, rows) in series {
        for item in rows {
            if let Value::Object(map) = item {
                let mut row = vec![name.to_string()];
                row.extend(
                    headers
                        .iter()
                        .map(|h| map.get(*h).map(format_value).unwrap_or_default()),
                );
                let _ = wtr.write_record(&row);
            }
        }
    }
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(result: Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_result_csv(&mut wtr, result.as_object().unwrap());
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_scalar_result_is_field_value() {
        let out = render(json!({"approximate_ytm": "0.06"}));
        assert_eq!(out, "field,value\napproximate_ytm,0.06\n");
    }

    #[test]
    fn test_series_rows_are_tagged() {
        let out = render(json!({
            "global_min": {"date": "2024-01-02", "drawdown": "-0.1"},
            "daily_drawdown": [{"date": "2024-01-01", "drawdown": "0"}],
            "rolling_max_drawdown": [{"date": "2024-01-01", "drawdown": "0"}],
        }));
        assert_eq!(
            out,
            "series,date,drawdown\n\
             daily_drawdown,2024-01-01,0\n\
             rolling_max_drawdown,2024-01-01,0\n"
        );
    }
}
