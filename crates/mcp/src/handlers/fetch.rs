#![forbid(unsafe_code)]

use super::{artifact_json, event_json, fact_json, task_json};
use crate::server::McpServer;
use crate::support::ai::{ai_error, ai_ok, store_error};
use crate::support::args::{require_object, require_string};
use crate::support::json::parse_json_or_string;
use serde_json::{Value, json};

pub(crate) fn handle(server: &mut McpServer, args: Value) -> Value {
    let args_obj = match require_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id = match require_string(args_obj, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match server.store.get_task(&id) {
        Ok(Some(task)) => {
            return ai_ok(
                "memory_fetch",
                format!("task {}: {}", task.id, task.title),
                json!({ "kind": "task", "record": task_json(&task) }),
            );
        }
        Ok(None) => {}
        Err(err) => return store_error(err),
    }

    match server.store.get_artifact(&id) {
        Ok(Some(artifact)) => {
            let resource = format!("artifact://sha256/{}", artifact.sha256);
            return ai_ok(
                "memory_fetch",
                format!("artifact {}: {}", artifact.id, artifact.uri),
                json!({
                    "kind": "artifact",
                    "record": artifact_json(&artifact),
                    "resource": resource,
                }),
            );
        }
        Ok(None) => {}
        Err(err) => return store_error(err),
    }

    match server.store.get_fact(&id) {
        Ok(Some(fact)) => {
            return ai_ok(
                "memory_fetch",
                format!("fact {}={}", fact.key, fact.value),
                json!({ "kind": "fact", "record": fact_json(&fact) }),
            );
        }
        Ok(None) => {}
        Err(err) => return store_error(err),
    }

    match server.store.get_event(&id) {
        Ok(Some(event)) => {
            return ai_ok(
                "memory_fetch",
                format!("{} {}: {}", event.kind, event.id, event.summary),
                json!({ "kind": "event", "record": event_json(&event) }),
            );
        }
        Ok(None) => {}
        Err(err) => return store_error(err),
    }

    match server.store.get_checkpoint(&id) {
        Ok(Some(checkpoint)) => ai_ok(
            "memory_fetch",
            format!("checkpoint {}: {}", checkpoint.id, checkpoint.label),
            json!({
                "kind": "checkpoint",
                "record": {
                    "id": checkpoint.id,
                    "session_id": checkpoint.session_id,
                    "label": checkpoint.label,
                    "ts_ms": checkpoint.ts_ms,
                    "bundle_meta": parse_json_or_string(&checkpoint.bundle_meta),
                },
            }),
        ),
        Ok(None) => ai_error("NOT_FOUND", &format!("no record with id: {id}")),
        Err(err) => store_error(err),
    }
}
