#![forbid(unsafe_code)]

use crate::support::time::now_rfc3339;
use rwm_storage::StoreError;
use serde_json::{Value, json};

pub(crate) fn ai_ok(intent: &str, text: impl Into<String>, result: Value) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "text": text.into(),
        "result": result,
        "error": null,
        "timestamp": now_rfc3339(),
    })
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    ai_error_with(code, message, None)
}

pub(crate) fn ai_error_with(code: &str, message: &str, recovery: Option<&str>) -> Value {
    let error = match recovery {
        None => json!({ "code": code, "message": message }),
        Some(recovery) => json!({ "code": code, "message": message, "recovery": recovery }),
    };
    json!({
        "success": false,
        "intent": "error",
        "text": message,
        "result": {},
        "error": error,
        "timestamp": now_rfc3339(),
    })
}

pub(crate) fn store_error(err: StoreError) -> Value {
    ai_error(err.code(), &err.to_string())
}
