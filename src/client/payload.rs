//! Tolerant extraction helpers for backend response bodies
//!
//! The backend has shipped two response envelopes over its lifetime: bare
//! arrays/objects (`[...]`, `{ "id": 7, ... }`) and a wrapped form
//! (`{ "status": "success", "data": ... }`). Login responses similarly
//! carry the token under either `token` or `data`. These helpers accept
//! both shapes so the engine never has to guess which backend build it is
//! talking to. Success itself is decided by the request client's result
//! tag, never by body shape.

use serde_json::Value;

/// Interpret a payload as a list of records
///
/// Accepts a bare array or a `data` array inside a wrapper object.
/// Anything else yields an empty slice.
pub fn items(value: &Value) -> &[Value] {
    match value {
        Value::Array(list) => list,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(list)) => list,
            _ => &[],
        },
        _ => &[],
    }
}

/// Interpret a payload as a single record
///
/// Unwraps one level of envelope: `data`, or the entity keys used by the
/// older controllers (`course`, `courseContent`, `enrollment`,
/// `notification`, `user`). A bare object passes through.
pub fn record(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    for key in ["data", "course", "courseContent", "enrollment", "notification", "user"] {
        if let Some(inner @ Value::Object(_)) = map.get(key) {
            return Some(inner);
        }
    }
    Some(value)
}

/// Numeric id of a record, if present
pub fn id_of(value: &Value) -> Option<i64> {
    record(value)?.get("id")?.as_i64()
}

/// Named integer field of a record
pub fn int_field(value: &Value, field: &str) -> Option<i64> {
    record(value)?.get(field)?.as_i64()
}

/// Named string field of a record
pub fn str_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    record(value)?.get(field)?.as_str()
}

/// Bearer token from a login response (`{"token": ...}` or `{"data": ...}`)
pub fn token_of(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    for key in ["token", "data"] {
        if let Some(Value::String(token)) = map.get(key) {
            return Some(token.clone());
        }
    }
    None
}
