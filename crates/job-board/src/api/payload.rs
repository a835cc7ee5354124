use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::http::ApiError;

/// The shapes list endpoints are known to answer with.
///
/// `Bare` is a top-level JSON array. `Wrapped` is an object carrying the array under
/// `data` or under a resource-specific key such as `offers`. Anything else is
/// `Unrecognized` and normalizes to an empty list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListPayload {
    Bare(Vec<Value>),
    Wrapped(Map<String, Value>),
    Unrecognized,
}

impl From<Value> for ListPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Bare(items),
            Value::Object(map) => Self::Wrapped(map),
            _ => Self::Unrecognized,
        }
    }
}

impl ListPayload {
    /// `data` is consulted first; the resource key only when `data` is absent or null.
    pub fn into_items(self, key: &str) -> Vec<Value> {
        match self {
            ListPayload::Bare(items) => items,
            ListPayload::Wrapped(mut map) => {
                let nested = match map.remove("data") {
                    Some(value) if !value.is_null() => Some(value),
                    _ => map.remove(key),
                };
                match nested {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                }
            }
            ListPayload::Unrecognized => Vec::new(),
        }
    }
}

/// Normalizes any list payload to typed records.
pub fn normalize_list<T: DeserializeOwned>(
    payload: Value,
    key: &str,
    path: &str,
) -> Result<Vec<T>, ApiError> {
    let items = ListPayload::from(payload).into_items(key);
    serde_json::from_value(Value::Array(items)).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Accepts strings, numbers, or null for free-text fields the backend is loose about.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    })
}

/// Identifiers arrive as either `"org-5"` or `5` depending on the endpoint.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or numeric identifier, got {other}"
        ))),
    }
}
