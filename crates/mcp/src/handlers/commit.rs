#![forbid(unsafe_code)]

use crate::server::McpServer;
use crate::support::ai::{ai_error, ai_ok, store_error};
use crate::support::args::{
    optional_object_array, optional_string, optional_string_array, optional_usize,
    require_object, require_string,
};
use crate::support::time::now_ms_i64;
use rwm_core::model::{ArtifactKind, EventKind, FactScope};
use rwm_storage::{ArtifactInput, CommitFrame, DecisionInput, FactInput};
use serde_json::{Value, json};

pub(crate) fn handle(server: &mut McpServer, args: Value) -> Value {
    let args_obj = match require_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session_raw = match require_string(args_obj, "session_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = match server.resolve_session(&session_raw) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let task = match optional_string(args_obj, "task") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut decisions = Vec::new();
    let decision_objs = match optional_object_array(args_obj, "decisions") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    for obj in decision_objs {
        let kind_raw = match require_string(obj, "type") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let Some(kind) = EventKind::parse(&kind_raw) else {
            return ai_error(
                "INVALID_INPUT",
                &format!("decisions[].type is not a known event kind: {kind_raw}"),
            );
        };
        let summary = match require_string(obj, "summary") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let id = match optional_string(obj, "id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let task_id = match optional_string(obj, "task_id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let evidence = match optional_string_array(obj, "evidence") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        decisions.push(DecisionInput {
            id,
            kind,
            summary,
            task_id,
            evidence,
        });
    }

    let mut artifacts = Vec::new();
    let artifact_objs = match optional_object_array(args_obj, "artifacts") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    for obj in artifact_objs {
        let kind_raw = match require_string(obj, "kind") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let Some(kind) = ArtifactKind::parse(&kind_raw) else {
            return ai_error(
                "INVALID_INPUT",
                &format!("artifacts[].kind is not a known artifact kind: {kind_raw}"),
            );
        };
        let id = match optional_string(obj, "id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let uri = match optional_string(obj, "uri") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let text = match optional_string(obj, "text") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let path = match optional_string(obj, "path") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let start_line = match optional_usize(obj, "startLine") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let end_line = match optional_usize(obj, "endLine") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        artifacts.push(ArtifactInput {
            id,
            kind,
            uri,
            text,
            path,
            start_line,
            end_line,
            meta: obj.get("meta").cloned(),
        });
    }

    let mut facts = Vec::new();
    let fact_objs = match optional_object_array(args_obj, "facts") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    for obj in fact_objs {
        let key = match require_string(obj, "key") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let value = match require_string(obj, "value") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let scope = match optional_string(obj, "scope") {
            Ok(Some(raw)) => match FactScope::parse(&raw) {
                Some(scope) => scope,
                None => {
                    return ai_error(
                        "INVALID_INPUT",
                        &format!("facts[].scope is not a known scope: {raw}"),
                    );
                }
            },
            Ok(None) => FactScope::default(),
            Err(resp) => return resp,
        };
        facts.push(FactInput { key, value, scope });
    }

    let counts = (decisions.len(), artifacts.len(), facts.len());
    let frame = CommitFrame {
        task,
        decisions,
        artifacts,
        facts,
    };
    let ts = now_ms_i64();

    match server.store.commit_frame(&session, frame, ts) {
        Ok(artifact_ids) => ai_ok(
            "memory_commit",
            format!(
                "Committed {} decision(s), {} artifact(s), {} fact(s) to {}",
                counts.0, counts.1, counts.2, session
            ),
            json!({
                "ok": true,
                "ts": ts,
                "artifactIds": artifact_ids,
                "session_id": session.as_str(),
            }),
        ),
        Err(err) => store_error(err),
    }
}
