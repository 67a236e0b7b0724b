#![forbid(unsafe_code)]

use serde_json::Value;

pub(crate) fn parse_json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
