#![forbid(unsafe_code)]

use crate::server::McpServer;
use crate::support::ai::{ai_error, ai_ok, store_error};
use crate::support::args::{require_nonempty_string, require_object, require_positive_usize};
use serde_json::{Value, json};

pub(crate) fn handle(server: &mut McpServer, args: Value) -> Value {
    let args_obj = match require_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let path = match require_nonempty_string(args_obj, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let start_line = match require_positive_usize(args_obj, "startLine") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let end_line = match require_positive_usize(args_obj, "endLine") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if start_line > end_line {
        return ai_error("INVALID_INPUT", "startLine must be <= endLine");
    }

    match server
        .store
        .read_span(&path, Some(start_line), Some(end_line))
    {
        Ok((text, start, end)) => ai_ok(
            "memory_span",
            text.clone(),
            json!({
                "path": path,
                "startLine": start,
                "endLine": end,
                "text": text,
            }),
        ),
        Err(err) => store_error(err),
    }
}
