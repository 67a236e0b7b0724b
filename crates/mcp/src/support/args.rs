#![forbid(unsafe_code)]

use super::ai::ai_error;
use serde_json::{Map, Value};

pub(crate) fn require_object(args: &Value) -> Result<&Map<String, Value>, Value> {
    args.as_object()
        .ok_or_else(|| ai_error("INVALID_INPUT", "arguments must be an object"))
}

pub(crate) fn require_string(args: &Map<String, Value>, key: &str) -> Result<String, Value> {
    let Some(v) = args.get(key).and_then(|v| v.as_str()) else {
        return Err(ai_error("INVALID_INPUT", &format!("{key} is required")));
    };
    Ok(v.to_string())
}

pub(crate) fn require_nonempty_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<String, Value> {
    let value = require_string(args, key)?;
    if value.trim().is_empty() {
        return Err(ai_error("INVALID_INPUT", &format!("{key} must not be empty")));
    }
    Ok(value)
}

pub(crate) fn optional_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.to_string())),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a string"),
        )),
    }
}

/// Presence-preserving nullable string: `None` = key absent, `Some(None)` =
/// explicit null, `Some(Some(_))` = value. Updates rely on the distinction.
pub(crate) fn optional_nullable_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Option<String>>, Value> {
    if !args.contains_key(key) {
        return Ok(None);
    }
    match args.get(key) {
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(v)) => Ok(Some(Some(v.to_string()))),
        Some(_) => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a string or null"),
        )),
        None => Ok(None),
    }
}

pub(crate) fn optional_usize(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<usize>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(|v| v as usize).map(Some).ok_or_else(|| {
            ai_error(
                "INVALID_INPUT",
                &format!("{key} must be a positive integer"),
            )
        }),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a positive integer"),
        )),
    }
}

pub(crate) fn require_positive_usize(
    args: &Map<String, Value>,
    key: &str,
) -> Result<usize, Value> {
    match optional_usize(args, key)? {
        Some(v) if v >= 1 => Ok(v),
        Some(_) => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be >= 1"),
        )),
        None => Err(ai_error("INVALID_INPUT", &format!("{key} is required"))),
    }
}

pub(crate) fn optional_string_array(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<String>>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let Some(s) = item.as_str() else {
                    return Err(ai_error(
                        "INVALID_INPUT",
                        &format!("{key} items must be strings"),
                    ));
                };
                out.push(s.to_string());
            }
            Ok(Some(out))
        }
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be an array of strings"),
        )),
    }
}

pub(crate) fn optional_object_array<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<Vec<&'a Map<String, Value>>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(Vec::new());
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let Some(obj) = item.as_object() else {
                    return Err(ai_error(
                        "INVALID_INPUT",
                        &format!("{key} items must be objects"),
                    ));
                };
                out.push(obj);
            }
            Ok(out)
        }
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be an array of objects"),
        )),
    }
}
