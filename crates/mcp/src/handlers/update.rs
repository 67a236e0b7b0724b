#![forbid(unsafe_code)]

use super::{artifact_json, fact_json, task_json};
use crate::server::McpServer;
use crate::support::ai::{ai_error, ai_ok, store_error};
use crate::support::args::{
    optional_nullable_string, optional_string, require_object, require_string,
};
use crate::support::time::now_ms_i64;
use rwm_core::hash::sha256_hex;
use rwm_core::model::{ArtifactKind, FactScope, TaskStatus};
use serde_json::{Value, json};

pub(crate) fn handle(server: &mut McpServer, args: Value) -> Value {
    let args_obj = match require_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let target = match require_string(args_obj, "target") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id = match require_string(args_obj, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match target.as_str() {
        "task" => update_task(server, args_obj, &id),
        "artifact" => update_artifact(server, args_obj, &id),
        "fact" => update_fact(server, args_obj, &id),
        _ => ai_error(
            "INVALID_INPUT",
            "target must be one of task, artifact, fact",
        ),
    }
}

fn update_task(
    server: &mut McpServer,
    args: &serde_json::Map<String, Value>,
    id: &str,
) -> Value {
    let mut task = match server.store.get_task(id) {
        Ok(Some(row)) => row,
        Ok(None) => return ai_error("NOT_FOUND", &format!("task not found: {id}")),
        Err(err) => return store_error(err),
    };

    let title = match optional_string(args, "title") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match optional_string(args, "status") {
        Ok(Some(raw)) => match TaskStatus::parse(&raw) {
            Some(status) => Some(status),
            None => {
                return ai_error(
                    "INVALID_INPUT",
                    &format!("status is not a known task status: {raw}"),
                );
            }
        },
        Ok(None) => None,
        Err(resp) => return resp,
    };
    // Presence matters: an explicit null clears the criteria, an absent key
    // leaves them alone.
    let accept_criteria = match optional_nullable_string(args, "accept_criteria") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let parent_id = match optional_nullable_string(args, "parent_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if title.is_none() && status.is_none() && accept_criteria.is_none() && parent_id.is_none() {
        return ai_error("INVALID_UPDATE", "no mutable fields supplied for target task");
    }

    if let Some(title) = title {
        task.title = title;
    }
    if let Some(status) = status {
        task.status = status.as_str().to_string();
    }
    if let Some(criteria) = accept_criteria {
        task.accept_criteria = criteria;
    }
    if let Some(parent) = parent_id {
        task.parent_id = parent;
    }
    task.updated_at_ms = now_ms_i64();

    if let Err(err) = server.store.upsert_task(&task) {
        return store_error(err);
    }
    ai_ok(
        "memory_update",
        format!("Updated task {id}"),
        json!({ "target": "task", "record": task_json(&task) }),
    )
}

fn update_artifact(
    server: &mut McpServer,
    args: &serde_json::Map<String, Value>,
    id: &str,
) -> Value {
    let mut artifact = match server.store.get_artifact(id) {
        Ok(Some(row)) => row,
        Ok(None) => return ai_error("NOT_FOUND", &format!("artifact not found: {id}")),
        Err(err) => return store_error(err),
    };

    let kind = match optional_string(args, "kind") {
        Ok(Some(raw)) => match ArtifactKind::parse(&raw) {
            Some(kind) => Some(kind),
            None => {
                return ai_error(
                    "INVALID_INPUT",
                    &format!("kind is not a known artifact kind: {raw}"),
                );
            }
        },
        Ok(None) => None,
        Err(resp) => return resp,
    };
    let text = match optional_string(args, "text") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let uri = match optional_string(args, "uri") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let meta = args.get("meta").cloned();

    if kind.is_none() && text.is_none() && uri.is_none() && meta.is_none() {
        return ai_error(
            "INVALID_UPDATE",
            "no mutable fields supplied for target artifact",
        );
    }

    if let Some(kind) = kind {
        artifact.kind = kind.as_str().to_string();
    }
    if let Some(text) = text {
        // New body: rewrite the content address. The old body file stays
        // until the next prune sweeps it.
        let hash = match server.store.pool().write_body(text.as_bytes()) {
            Ok(v) => v,
            Err(err) => return store_error(err),
        };
        artifact.uri = format!("artifact://sha256/{hash}");
        artifact.size = text.len() as i64;
        artifact.sha256 = hash;
    } else if let Some(uri) = uri {
        // Pointer reshape: hash of the uri string, no body.
        artifact.sha256 = sha256_hex(uri.as_bytes());
        artifact.size = 0;
        artifact.uri = uri;
    }
    if let Some(meta) = meta {
        let mut map = match meta {
            Value::Object(map) => map,
            _ => return ai_error("INVALID_INPUT", "meta must be an object"),
        };
        // Origin stamps survive meta replacement.
        if !map.contains_key("origin")
            && let Ok(Value::Object(old)) = serde_json::from_str(&artifact.meta_json)
            && let Some(origin) = old.get("origin")
        {
            map.insert("origin".to_string(), origin.clone());
        }
        artifact.meta_json = Value::Object(map).to_string();
    }

    if let Err(err) = server.store.upsert_artifact(&artifact) {
        return store_error(err);
    }
    ai_ok(
        "memory_update",
        format!("Updated artifact {id}"),
        json!({ "target": "artifact", "record": artifact_json(&artifact) }),
    )
}

fn update_fact(
    server: &mut McpServer,
    args: &serde_json::Map<String, Value>,
    id: &str,
) -> Value {
    let mut fact = match server.store.get_fact(id) {
        Ok(Some(row)) => row,
        Ok(None) => return ai_error("NOT_FOUND", &format!("fact not found: {id}")),
        Err(err) => return store_error(err),
    };

    let value = match optional_string(args, "value") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let scope = match optional_string(args, "scope") {
        Ok(Some(raw)) => match FactScope::parse(&raw) {
            Some(scope) => Some(scope),
            None => {
                return ai_error(
                    "INVALID_INPUT",
                    &format!("scope is not a known fact scope: {raw}"),
                );
            }
        },
        Ok(None) => None,
        Err(resp) => return resp,
    };

    if value.is_none() && scope.is_none() {
        return ai_error("INVALID_UPDATE", "no mutable fields supplied for target fact");
    }

    if let Some(value) = value {
        fact.value = value;
    }
    if let Some(scope) = scope {
        fact.scope = scope.as_str().to_string();
    }

    if let Err(err) = server.store.upsert_fact(&fact) {
        return store_error(err);
    }
    ai_ok(
        "memory_update",
        format!("Updated fact {id}"),
        json!({ "target": "fact", "record": fact_json(&fact) }),
    )
}
