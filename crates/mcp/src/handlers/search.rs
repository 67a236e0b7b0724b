#![forbid(unsafe_code)]

use super::{event_json, fact_json, task_json};
use crate::server::McpServer;
use crate::support::ai::{ai_error, ai_ok, store_error};
use crate::support::args::{optional_usize, require_nonempty_string, require_object, require_string};
use serde_json::{Value, json};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 200;

pub(crate) fn handle(server: &mut McpServer, args: Value) -> Value {
    let args_obj = match require_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session_raw = match require_string(args_obj, "session_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let query = match require_nonempty_string(args_obj, "query") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let limit = match optional_usize(args_obj, "limit") {
        Ok(Some(v)) if (1..=MAX_LIMIT).contains(&v) => v,
        Ok(Some(_)) => {
            return ai_error("INVALID_INPUT", "limit must be between 1 and 200");
        }
        Ok(None) => DEFAULT_LIMIT,
        Err(resp) => return resp,
    };

    let session = match server.resolve_session(&session_raw) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let hits = match server.store.search(session.as_str(), &query, limit) {
        Ok(v) => v,
        Err(err) => return store_error(err),
    };

    ai_ok(
        "memory_search",
        format!(
            "{} event(s), {} task(s), {} fact(s) match {:?}",
            hits.events.len(),
            hits.tasks.len(),
            hits.facts.len(),
            query
        ),
        json!({
            "events": hits.events.iter().map(event_json).collect::<Vec<_>>(),
            "tasks": hits.tasks.iter().map(task_json).collect::<Vec<_>>(),
            "facts": hits.facts.iter().map(fact_json).collect::<Vec<_>>(),
            "session_id": session.as_str(),
        }),
    )
}
