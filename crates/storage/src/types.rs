#![forbid(unsafe_code)]

use rwm_core::model::{ArtifactKind, EventKind, FactScope};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct TaskRow {
    pub id: String,
    pub session_id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub status: String,
    pub accept_criteria: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct EventRow {
    pub id: String,
    pub kind: String,
    pub task_id: Option<String>,
    pub session_id: String,
    pub summary: String,
    pub evidence_json: String,
    pub ts_ms: i64,
}

#[derive(Clone, Debug)]
pub struct ArtifactRow {
    pub id: String,
    pub kind: String,
    pub uri: String,
    pub sha256: String,
    pub size: i64,
    pub meta_json: String,
    pub created_at_ms: i64,
}

impl ArtifactRow {
    pub fn is_pointer(&self) -> bool {
        !self.uri.starts_with(crate::commit::BODY_URI_PREFIX)
    }
}

#[derive(Clone, Debug)]
pub struct FactRow {
    pub id: String,
    pub key: String,
    pub value: String,
    pub scope: String,
}

#[derive(Clone, Debug)]
pub struct CheckpointRow {
    pub id: String,
    pub session_id: String,
    pub label: String,
    pub ts_ms: i64,
    pub bundle_meta: String,
}

#[derive(Clone, Debug)]
pub struct TokenMetricRow {
    pub id: String,
    pub session_id: String,
    pub pointer_id: String,
    pub token_cost: i64,
    pub budget: i64,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Default)]
pub struct SearchHits {
    pub events: Vec<EventRow>,
    pub tasks: Vec<TaskRow>,
    pub facts: Vec<FactRow>,
}

/// One structured commit: task, decisions, artifacts, facts for a single
/// logical step.
#[derive(Clone, Debug, Default)]
pub struct CommitFrame {
    pub task: Option<String>,
    pub decisions: Vec<DecisionInput>,
    pub artifacts: Vec<ArtifactInput>,
    pub facts: Vec<FactInput>,
}

#[derive(Clone, Debug)]
pub struct DecisionInput {
    pub id: Option<String>,
    pub kind: EventKind,
    pub summary: String,
    pub task_id: Option<String>,
    pub evidence: Option<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct ArtifactInput {
    pub id: Option<String>,
    pub kind: ArtifactKind,
    pub uri: Option<String>,
    pub text: Option<String>,
    pub path: Option<String>,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub meta: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct FactInput {
    pub key: String,
    pub value: String,
    pub scope: FactScope,
}
