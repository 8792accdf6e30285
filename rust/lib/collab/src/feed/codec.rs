//! Firestore typed-value encoding.
//!
//! Documents travel as `{"fields": {"name": {"stringValue": "..."}}}`.
//! These helpers convert between that shape and plain JSON so posts can
//! go through serde on both sides.

use serde_json::{Map, Value};
use statusboard_core::StatusError;

use crate::model::{NewPost, StatusPost};

/// Encode a plain JSON object as a Firestore `fields` map.
pub(crate) fn to_fields(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), to_typed(v)))
            .collect(),
        _ => Map::new(),
    }
}

fn to_typed(value: &Value) -> Value {
    match value {
        Value::Null => serde_json::json!({ "nullValue": null }),
        Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => serde_json::json!({ "integerValue": i.to_string() }),
            None => serde_json::json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => serde_json::json!({ "stringValue": s }),
        Value::Array(items) => serde_json::json!({
            "arrayValue": { "values": items.iter().map(to_typed).collect::<Vec<_>>() }
        }),
        Value::Object(_) => serde_json::json!({ "mapValue": { "fields": to_fields(value) } }),
    }
}

/// Decode a Firestore `fields` map into plain JSON.
pub(crate) fn from_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), from_typed(v)))
            .collect(),
    )
}

fn from_typed(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "booleanValue" | "doubleValue" => {
            inner.clone()
        }
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map(from_fields)
            .unwrap_or_else(|| Value::Object(Map::new())),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vs| vs.iter().map(from_typed).collect())
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

/// Encode a new post's fields (without `createdAt`, which the server sets).
pub(crate) fn encode_post(post: &NewPost) -> Result<Map<String, Value>, StatusError> {
    let plain = serde_json::to_value(post)?;
    Ok(to_fields(&plain))
}

/// Decode a Firestore document (`name`, `fields`) into a post. The id is
/// the last segment of the document name.
pub(crate) fn decode_document(doc: &Value) -> Result<StatusPost, StatusError> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StatusError::Decode("document without name".into()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let mut plain = doc
        .get("fields")
        .and_then(Value::as_object)
        .map(from_fields)
        .unwrap_or_else(|| Value::Object(Map::new()));
    if let Value::Object(obj) = &mut plain {
        obj.insert("id".to_string(), Value::String(id));
    }
    Ok(serde_json::from_value(plain)?)
}
