#![forbid(unsafe_code)]

use rwm_core::ids::SessionId;
use rwm_storage::{SqliteStore, StoreError};
use serde_json::{Value, json};

const SNAPSHOT_LIMIT: usize = 5;

/// Snapshot of the session state stored as a checkpoint's `bundle_meta`:
/// objective plus trimmed views of active tasks, recent events and facts.
pub(crate) fn build(store: &SqliteStore, session: &SessionId) -> Result<Value, StoreError> {
    let tasks = store.list_active_tasks(session.as_str(), SNAPSHOT_LIMIT)?;
    let events = store.list_recent_events(session.as_str(), SNAPSHOT_LIMIT)?;
    let facts = store.list_facts()?;

    let objective = tasks
        .first()
        .map(|t| t.title.clone())
        .unwrap_or_else(|| "No active task".to_string());

    Ok(json!({
        "objective": objective,
        "active_tasks": tasks
            .iter()
            .map(|t| json!({ "id": t.id, "title": t.title, "status": t.status }))
            .collect::<Vec<_>>(),
        "recent_events": events
            .iter()
            .map(|e| json!({ "id": e.id, "kind": e.kind, "summary": e.summary }))
            .collect::<Vec<_>>(),
        "facts": facts
            .iter()
            .take(SNAPSHOT_LIMIT)
            .map(|f| json!({ "id": f.id, "key": f.key, "value": f.value }))
            .collect::<Vec<_>>(),
    }))
}
