// ── Controller JSON to domain model ──
//
// Controller exports arrive as a bare array, a `{ "data": [...] }`
// envelope, or a single object, and field presence varies across
// firmware versions. Everything here walks `serde_json::Value` trees and
// degrades to defaults instead of failing: only a row without an id is
// dropped.

mod inventory;
mod networks;
mod rules;

pub use inventory::{
    has_cellular_device, parse_devices, parse_groups, parse_port_forwards, parse_upnp_enabled,
    parse_zones,
};
pub use networks::{parse_network, parse_networks};
pub use rules::{parse_firewall_rules, parse_legacy_rule, parse_policy};

use serde_json::Value;

use crate::error::CoreError;

/// Decode a raw JSON document.
pub fn parse_document(raw: &str, context: &str) -> Result<Value, CoreError> {
    serde_json::from_str(raw).map_err(|source| CoreError::Json {
        context: context.to_owned(),
        source,
    })
}

/// Items of a document in any of the three envelope forms.
pub(crate) fn unwrap_envelope(doc: &Value) -> Vec<&Value> {
    match doc {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(obj @ Value::Object(_)) => vec![obj],
            _ => vec![doc],
        },
        _ => Vec::new(),
    }
}

/// Elements of an array-valued field, or nothing.
pub(crate) fn array_field<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Trimmed non-empty string field. Numbers are accepted and stringified
/// by [`string_field`]; this accessor only borrows real strings.
pub(crate) fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// String or number field rendered as a trimmed non-empty string.
pub(crate) fn string_field(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Row identifier: `_id`, falling back to `id`.
pub(crate) fn row_id(v: &Value) -> Option<String> {
    string_field(v, "_id").or_else(|| string_field(v, "id"))
}

/// Bool field, tolerating `"true"`/`"false"` strings and 0/1 numbers.
pub(crate) fn bool_field(v: &Value, key: &str) -> Option<bool> {
    match v.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

/// Integer field, tolerating numeric strings.
pub(crate) fn int_field(v: &Value, key: &str) -> Option<i64> {
    match v.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String list from an array field (strings and numbers kept, others
/// dropped). A plain string is read as a single-element list.
pub(crate) fn string_list(v: &Value, key: &str) -> Vec<String> {
    match v.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_owned()],
        _ => Vec::new(),
    }
}

/// Integer list from an array field; non-numeric entries are dropped.
pub(crate) fn int_list(v: &Value, key: &str) -> Vec<i64> {
    array_field(v, key)
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_forms() {
        let bare = json!([{ "a": 1 }, { "a": 2 }]);
        let wrapped = json!({ "meta": { "rc": "ok" }, "data": [{ "a": 1 }, { "a": 2 }] });
        let single = json!({ "a": 1 });
        assert_eq!(unwrap_envelope(&bare).len(), 2);
        assert_eq!(unwrap_envelope(&wrapped).len(), 2);
        assert_eq!(unwrap_envelope(&single).len(), 1);
        assert!(unwrap_envelope(&json!("nope")).is_empty());
    }

    #[test]
    fn lenient_scalars() {
        let v = json!({ "b": "true", "n": 1, "i": "42", "s": "  ", "port": 443 });
        assert_eq!(bool_field(&v, "b"), Some(true));
        assert_eq!(bool_field(&v, "n"), Some(true));
        assert_eq!(int_field(&v, "i"), Some(42));
        assert_eq!(str_field(&v, "s"), None);
        assert_eq!(string_field(&v, "port").as_deref(), Some("443"));
        assert_eq!(bool_field(&v, "missing"), None);
    }

    #[test]
    fn lists_tolerate_mixed_entries() {
        let v = json!({ "ids": ["a", 7, null, ""], "one": "x", "apps": [1, "2", "z"] });
        assert_eq!(string_list(&v, "ids"), vec!["a".to_owned(), "7".to_owned()]);
        assert_eq!(string_list(&v, "one"), vec!["x".to_owned()]);
        assert_eq!(int_list(&v, "apps"), vec![1, 2]);
    }

    #[test]
    fn invalid_document_is_an_error() {
        let err = parse_document("{not json", "devices").unwrap_err();
        assert!(err.to_string().contains("devices"));
    }
}
