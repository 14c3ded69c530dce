use serde_json::Value;

/// Pull a record list out of whatever the backend wrapped it in: a bare array,
/// a `{"data": [...]}` envelope, or a single-key object holding an array.
pub fn extract_data_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            if let Some(data) = map.get("data") {
                return data.as_array().cloned().unwrap_or_default();
            }
            if map.len() == 1 {
                if let Some(Value::Array(items)) = map.values().next() {
                    return items.clone();
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Unwrap a `{"data": {...}}` envelope; anything else is returned as-is.
pub fn extract_data_object(value: &Value) -> Value {
    match value.get("data") {
        Some(data) => data.clone(),
        None => value.clone(),
    }
}
