use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: descend into the optimizer's nested summary when present,
/// then look for well-known result fields in order of priority, falling
/// back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Extract the "result" envelope
    let mut result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // An infeasible optimizer run has no summary; the status is the answer
    if result_obj.get("status").and_then(Value::as_str) == Some("infeasible") {
        println!("infeasible");
        return;
    }

    // Optimizer output nests the financials under "summary"
    if let Some(summary) = result_obj.get("summary") {
        result_obj = summary;
    }

    // Priority list of key output fields
    let priority_keys = [
        "net_operating_income",
        "base_case_value",
        "annual_revenue",
        "implied_value",
        "debt_service_coverage_ratio",
    ];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
