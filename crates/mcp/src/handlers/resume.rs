#![forbid(unsafe_code)]

use crate::server::McpServer;
use crate::support::ai::{ai_error, ai_ok, store_error};
use crate::support::args::{optional_usize, require_object, require_string};
use crate::support::bundle;
use crate::support::time::now_ms_i64;
use rwm_core::ids::rid;
use rwm_storage::TokenMetricRow;
use serde_json::{Value, json};

const MAX_TOKEN_BUDGET: usize = 1_000_000;

pub(crate) fn handle(server: &mut McpServer, args: Value) -> Value {
    let args_obj = match require_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session_raw = match require_string(args_obj, "session_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let budget = match optional_usize(args_obj, "token_budget") {
        Ok(Some(v)) if (1..=MAX_TOKEN_BUDGET).contains(&v) => v,
        Ok(Some(_)) => {
            return ai_error(
                "INVALID_INPUT",
                "token_budget must be between 1 and 1000000",
            );
        }
        Ok(None) => server.bundle_budget,
        Err(resp) => return resp,
    };

    let session = match server.resolve_session(&session_raw) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let now_ms = now_ms_i64();
    let bundle = match bundle::compose(
        &server.store,
        &server.estimator,
        server.estimator.default_family(),
        &session,
        budget,
        now_ms,
    ) {
        Ok(v) => v,
        Err(err) => return store_error(err),
    };

    // Diagnostics trail; a failed metric write never fails the resume.
    for (pointer_id, token_cost) in &bundle.metrics {
        let _ = server.store.insert_token_metric(&TokenMetricRow {
            id: rid("M"),
            session_id: session.as_str().to_string(),
            pointer_id: pointer_id.clone(),
            token_cost: *token_cost as i64,
            budget: budget as i64,
            created_at_ms: now_ms,
        });
    }

    ai_ok(
        "memory_resume",
        bundle.text.clone(),
        json!({
            "now": bundle.now,
            "pointers": bundle.pointers,
            "token_estimate": bundle.token_estimate,
            "budget": bundle.budget,
            "session_id": session.as_str(),
        }),
    )
}
