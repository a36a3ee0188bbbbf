use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    match result {
        // Sensitivity output renders as a grid, not field/value pairs
        Value::Object(res_map) if res_map.contains_key("matrix") => {
            print_sensitivity_grid(res_map);
        }
        Value::Object(res_map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            push_fields(&mut builder, res_map, "");
            let table = Table::from(builder);
            println!("{}", table);

            // The optimizer's feasible frontier gets its own table
            if let Some(Value::Array(frontier)) = res_map.get("frontier") {
                println!("\nFeasible frontier:");
                print_array_table(frontier);
            }
        }
        _ => {
            print_flat_object(&Value::Object(envelope.clone()));
        }
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Push field/value rows, flattening nested objects one level deep
/// (e.g. summary.net_operating_income).
fn push_fields(builder: &mut Builder, map: &serde_json::Map<String, Value>, prefix: &str) {
    for (key, val) in map {
        if key == "frontier" {
            continue; // rendered separately
        }
        match val {
            Value::Object(nested) if prefix.is_empty() => {
                push_fields(builder, nested, &format!("{}.", key));
            }
            _ => {
                builder.push_record([format!("{}{}", prefix, key), format_value(val)]);
            }
        }
    }
}

/// Render the sensitivity matrix with variable-2 values as columns and
/// variable-1 values as row labels.
fn print_sensitivity_grid(res_map: &serde_json::Map<String, Value>) {
    let v1_name = res_map
        .get("variable_1_name")
        .and_then(Value::as_str)
        .unwrap_or("variable_1");
    let v2_name = res_map
        .get("variable_2_name")
        .and_then(Value::as_str)
        .unwrap_or("variable_2");

    let empty = Vec::new();
    let v1_values = res_map
        .get("variable_1_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let v2_values = res_map
        .get("variable_2_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let matrix = res_map
        .get("matrix")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut builder = Builder::default();

    let mut header: Vec<String> = vec![format!("{} \\ {}", v1_name, v2_name)];
    header.extend(v2_values.iter().map(format_value));
    builder.push_record(header);

    for (v1, row) in v1_values.iter().zip(matrix.iter()) {
        let mut record = vec![format_value(v1)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }

    let table = Table::from(builder);
    println!("{}", table);

    if let Some(base) = res_map.get("base_case_value") {
        println!("\nBase case: {}", format_value(base));
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
