#![forbid(unsafe_code)]

mod checkpoint;
mod commit;
mod definitions;
mod fetch;
mod resume;
mod search;
mod span;
mod update;

use crate::server::McpServer;
use crate::support::json::parse_json_or_string;
use crate::support::time::ts_ms_to_rfc3339;
use serde_json::{Value, json};

pub(crate) use definitions::tool_definitions;

pub(crate) fn dispatch_memory_tool(
    server: &mut McpServer,
    name: &str,
    args: Value,
) -> Option<Value> {
    match name {
        "memory_commit" => Some(commit::handle(server, args)),
        "memory_resume" => Some(resume::handle(server, args)),
        "memory_update" => Some(update::handle(server, args)),
        "memory_fetch" => Some(fetch::handle(server, args)),
        "memory_search" => Some(search::handle(server, args)),
        "memory_span" => Some(span::handle(server, args)),
        "memory_checkpoint" => Some(checkpoint::handle(server, args)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn dispatched_tool_names() -> &'static [&'static str] {
    &[
        "memory_commit",
        "memory_resume",
        "memory_update",
        "memory_fetch",
        "memory_search",
        "memory_span",
        "memory_checkpoint",
    ]
}

pub(crate) fn task_json(task: &rwm_storage::TaskRow) -> Value {
    json!({
        "id": task.id,
        "session_id": task.session_id,
        "parent_id": task.parent_id,
        "title": task.title,
        "status": task.status,
        "accept_criteria": task.accept_criteria,
        "created_at_ms": task.created_at_ms,
        "updated_at_ms": task.updated_at_ms,
    })
}

pub(crate) fn event_json(event: &rwm_storage::EventRow) -> Value {
    json!({
        "id": event.id,
        "kind": event.kind,
        "task_id": event.task_id,
        "session_id": event.session_id,
        "summary": event.summary,
        "evidence": parse_json_or_string(&event.evidence_json),
        "ts": ts_ms_to_rfc3339(event.ts_ms),
        "ts_ms": event.ts_ms,
    })
}

pub(crate) fn artifact_json(artifact: &rwm_storage::ArtifactRow) -> Value {
    json!({
        "id": artifact.id,
        "kind": artifact.kind,
        "uri": artifact.uri,
        "sha256": artifact.sha256,
        "size": artifact.size,
        "meta": parse_json_or_string(&artifact.meta_json),
        "created_at_ms": artifact.created_at_ms,
    })
}

pub(crate) fn fact_json(fact: &rwm_storage::FactRow) -> Value {
    json!({
        "id": fact.id,
        "key": fact.key,
        "value": fact.value,
        "scope": fact.scope,
    })
}
