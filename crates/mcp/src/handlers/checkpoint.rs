#![forbid(unsafe_code)]

use crate::server::McpServer;
use crate::support::ai::{ai_ok, store_error};
use crate::support::args::{require_nonempty_string, require_object, require_string};
use crate::support::checkpoint_meta;
use crate::support::time::now_ms_i64;
use rwm_core::ids::rid;
use rwm_storage::CheckpointRow;
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
    let label = match require_nonempty_string(args_obj, "label") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = match server.resolve_session(&session_raw) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let meta = match checkpoint_meta::build(&server.store, &session) {
        Ok(v) => v,
        Err(err) => return store_error(err),
    };

    let checkpoint = CheckpointRow {
        id: rid("C"),
        session_id: session.as_str().to_string(),
        label: label.clone(),
        ts_ms: now_ms_i64(),
        bundle_meta: meta.to_string(),
    };
    if let Err(err) = server.store.insert_checkpoint(&checkpoint) {
        return store_error(err);
    }

    ai_ok(
        "memory_checkpoint",
        format!("Checkpoint {} ({label}) recorded for {session}", checkpoint.id),
        json!({
            "id": checkpoint.id,
            "session_id": session.as_str(),
            "label": label,
        }),
    )
}
