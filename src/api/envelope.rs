//! The backend wraps lists in several envelope shapes depending on the
//! endpoint and its version. These helpers dig the payload out of all of them.

use serde::de::DeserializeOwned;
use serde_json::Value;

const COMMON_KEYS: &[&str] = &["data", "results", "items", "records", "rows"];

/// Extracts the record list from `value`. `keys` are entity specific
/// envelope names (`"leads"`, `"assignments"`, ...) tried before the common ones.
pub fn records(value: Value, keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in keys.iter().chain(COMMON_KEYS) {
                match map.remove(*key) {
                    Some(Value::Array(items)) => return items,
                    Some(nested @ Value::Object(_)) => {
                        let items = records(nested, keys);
                        if !items.is_empty() {
                            return items;
                        }
                    }
                    _ => {}
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Extracts a single record, unwrapping `{"data": {...}}` style envelopes.
pub fn record(value: Value, keys: &[&str]) -> Option<Value> {
    let Value::Object(mut map) = value else {
        return None;
    };
    for key in keys.iter().chain(COMMON_KEYS) {
        if map.get(*key).is_some_and(Value::is_object) {
            return map.remove(*key).and_then(|inner| record(inner, keys));
        }
    }
    Some(Value::Object(map))
}

/// Deserializes every record that fits `T`, skipping the rest.
pub fn parse_list<T: DeserializeOwned>(value: Value, keys: &[&str]) -> Vec<T> {
    let items = records(value, keys);
    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("Skipping malformed {}: {}", std::any::type_name::<T>(), e);
                None
            }
        })
        .collect();
    if parsed.len() < total {
        tracing::warn!(
            "Skipped {} of {} malformed {} records",
            total - parsed.len(),
            total,
            std::any::type_name::<T>()
        );
    }
    parsed
}

pub fn parse_record<T: DeserializeOwned>(value: Value, keys: &[&str]) -> Option<T> {
    record(value, keys).and_then(|v| serde_json::from_value(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_shapes() {
        let expected = vec![json!({ "id": 1 })];
        assert_eq!(records(json!([{ "id": 1 }]), &["leads"]), expected);
        assert_eq!(records(json!({ "leads": [{ "id": 1 }] }), &["leads"]), expected);
        assert_eq!(records(json!({ "data": [{ "id": 1 }] }), &["leads"]), expected);
        assert_eq!(
            records(json!({ "success": true, "data": { "leads": [{ "id": 1 }], "total": 1 } }), &["leads"]),
            expected
        );
        assert_eq!(records(json!({ "results": [{ "id": 1 }] }), &[]), expected);
    }

    #[test]
    fn test_unknown_shapes_are_empty() {
        assert!(records(json!({ "message": "ok" }), &["leads"]).is_empty());
        assert!(records(json!("nope"), &["leads"]).is_empty());
        assert!(records(Value::Null, &["leads"]).is_empty());
    }

    #[test]
    fn test_single_record() {
        assert_eq!(
            record(json!({ "data": { "assignment": { "id": 5 } } }), &["assignment"]),
            Some(json!({ "id": 5 }))
        );
        assert_eq!(record(json!({ "id": 5 }), &[]), Some(json!({ "id": 5 })));
        assert_eq!(record(json!([1]), &[]), None);
    }

    #[test]
    fn test_parse_list_skips_bad_items() {
        #[derive(serde::Deserialize)]
        struct Item {
            id: u32,
        }
        let items: Vec<Item> = parse_list(json!({ "data": [{ "id": 1 }, { "id": "x" }, { "id": 3 }] }), &[]);
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
