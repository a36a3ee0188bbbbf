use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            match map.get("result") {
                // Sensitivity grids become one row per variable-1 value
                Some(Value::Object(result)) if result.contains_key("matrix") => {
                    write_matrix_csv(&mut wtr, result);
                }
                // The frontier, when present, is the interesting tabular data
                Some(Value::Object(result)) if result.contains_key("frontier") => {
                    if let Some(Value::Array(frontier)) = result.get("frontier") {
                        write_array_csv(&mut wtr, frontier);
                    }
                }
                Some(Value::Object(result)) => {
                    let _ = wtr.write_record(["field", "value"]);
                    write_fields_csv(&mut wtr, result, "");
                }
                _ => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in map {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                    }
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// field,value rows with nested objects flattened one level deep.
fn write_fields_csv(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    map: &serde_json::Map<String, Value>,
    prefix: &str,
) {
    for (key, val) in map {
        match val {
            Value::Object(nested) if prefix.is_empty() => {
                write_fields_csv(wtr, nested, &format!("{}.", key));
            }
            _ => {
                let _ = wtr.write_record([
                    format!("{}{}", prefix, key).as_str(),
                    &format_csv_value(val),
                ]);
            }
        }
    }
}

fn write_matrix_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, result: &serde_json::Map<String, Value>) {
    let empty = Vec::new();
    let v1_values = result
        .get("variable_1_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let v2_values = result
        .get("variable_2_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let matrix = result
        .get("matrix")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let v1_name = result
        .get("variable_1_name")
        .and_then(Value::as_str)
        .unwrap_or("variable_1");

    let mut header: Vec<String> = vec![v1_name.to_string()];
    header.extend(v2_values.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    for (v1, row) in v1_values.iter().zip(matrix.iter()) {
        let mut record = vec![format_csv_value(v1)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
