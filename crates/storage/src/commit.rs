#![forbid(unsafe_code)]

use super::*;
use crate::support::ts_ms_to_rfc3339;
use rwm_core::ids::{SessionId, fact_id, rid, task_id};
use rwm_core::model::{OriginType, TaskStatus};
use rwm_core::paths::safe_join;
use serde_json::{Map, Value, json};
use std::collections::HashSet;

pub(crate) const BODY_URI_PREFIX: &str = "artifact://sha256/";

impl SqliteStore {
    /// Apply one state frame: task upsert, artifact prepare/upsert, decision
    /// events, fact upserts, orphan prune. Returns the generated artifact ids
    /// in input order.
    ///
    /// All artifact ids are collected before any event is inserted so that a
    /// decision without explicit evidence inherits the full list.
    pub fn commit_frame(
        &mut self,
        session: &SessionId,
        frame: CommitFrame,
        ts_ms: i64,
    ) -> Result<Vec<String>, StoreError> {
        let current_task_id = match frame.task.as_deref() {
            Some(title) if !title.trim().is_empty() => {
                let id = task_id(title);
                self.upsert_task(&TaskRow {
                    id: id.clone(),
                    session_id: session.as_str().to_string(),
                    parent_id: None,
                    title: title.to_string(),
                    status: TaskStatus::Doing.as_str().to_string(),
                    accept_criteria: None,
                    created_at_ms: ts_ms,
                    updated_at_ms: ts_ms,
                })?;
                Some(id)
            }
            _ => None,
        };

        let mut artifact_ids = Vec::with_capacity(frame.artifacts.len());
        for input in &frame.artifacts {
            let (id, row) = self.prepare_artifact(input, ts_ms)?;
            self.upsert_artifact(&row)?;
            artifact_ids.push(id);
        }

        for decision in frame.decisions {
            let evidence = decision
                .evidence
                .unwrap_or_else(|| artifact_ids.clone());
            self.insert_event(&EventRow {
                id: decision.id.unwrap_or_else(|| rid("D")),
                kind: decision.kind.as_str().to_string(),
                task_id: decision.task_id.or_else(|| current_task_id.clone()),
                session_id: session.as_str().to_string(),
                summary: decision.summary,
                evidence_json: Value::from(evidence).to_string(),
                ts_ms,
            })?;
        }

        for fact in frame.facts {
            self.upsert_fact(&FactRow {
                id: fact_id(&fact.key, fact.scope.as_str()),
                key: fact.key,
                value: fact.value,
                scope: fact.scope.as_str().to_string(),
            })?;
        }

        self.prune_orphans();
        Ok(artifact_ids)
    }

    /// Resolve an artifact descriptor into a row, writing the body into the
    /// pool when one exists. Resolution order: inline text, workspace span,
    /// pointer uri, empty body.
    pub fn prepare_artifact(
        &self,
        input: &ArtifactInput,
        ts_ms: i64,
    ) -> Result<(String, ArtifactRow), StoreError> {
        let mut meta = match &input.meta {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        let (uri, sha256, size) = if let Some(text) = &input.text {
            stamp_origin(&mut meta, OriginType::Text, ts_ms);
            let hash = self.pool.write_body(text.as_bytes())?;
            (
                format!("{BODY_URI_PREFIX}{hash}"),
                hash,
                text.len() as i64,
            )
        } else if let Some(path) = &input.path {
            let (body, start, end) = self.read_span(path, input.start_line, input.end_line)?;
            meta.insert("path".to_string(), Value::String(path.clone()));
            meta.insert("startLine".to_string(), json!(start));
            meta.insert("endLine".to_string(), json!(end));
            stamp_origin(&mut meta, OriginType::Workspace, ts_ms);
            let size = body.len() as i64;
            let hash = self.pool.write_body(body.as_bytes())?;
            (format!("{BODY_URI_PREFIX}{hash}"), hash, size)
        } else if let Some(uri) = &input.uri {
            meta.entry("pointer".to_string()).or_insert(Value::Bool(true));
            let origin = if uri.starts_with("workspace://") {
                OriginType::WorkspaceUri
            } else {
                OriginType::Uri
            };
            stamp_origin(&mut meta, origin, ts_ms);
            (
                uri.clone(),
                rwm_core::hash::sha256_hex(uri.as_bytes()),
                0,
            )
        } else {
            stamp_origin(&mut meta, OriginType::Empty, ts_ms);
            let hash = self.pool.write_body(b"")?;
            (format!("{BODY_URI_PREFIX}{hash}"), hash, 0)
        };

        let id = input
            .id
            .clone()
            .unwrap_or_else(|| format!("P-{}", &sha256[..8]));
        let row = ArtifactRow {
            id: id.clone(),
            kind: input.kind.as_str().to_string(),
            uri,
            sha256,
            size,
            meta_json: Value::Object(meta).to_string(),
            created_at_ms: ts_ms,
        };
        Ok((id, row))
    }

    /// Read a 1-indexed inclusive line span from a workspace file through the
    /// path guard. Out-of-range bounds clamp to the file.
    pub fn read_span(
        &self,
        path: &str,
        start_line: Option<usize>,
        end_line: Option<usize>,
    ) -> Result<(String, usize, usize), StoreError> {
        let file_path = safe_join(&self.root, path)?;
        let content = std::fs::read_to_string(file_path)?;
        let lines: Vec<&str> = content.lines().collect();
        let total = lines.len();
        let start = start_line.unwrap_or(1).max(1);
        let end = end_line.unwrap_or(total).min(total);
        if total == 0 || start > end {
            return Ok((String::new(), start, end));
        }
        Ok((lines[start - 1..end].join("\n"), start, end))
    }

    /// Sweep pool files no row references. Delete failures are swallowed;
    /// the next commit retries.
    pub fn prune_orphans(&self) -> usize {
        let referenced: HashSet<String> = match self.list_artifact_hashes() {
            Ok(hashes) => hashes.into_iter().collect(),
            Err(_) => return 0,
        };
        self.pool.prune(&referenced)
    }
}

/// Never overwrite a caller-supplied origin stamp.
fn stamp_origin(meta: &mut Map<String, Value>, origin: OriginType, ts_ms: i64) {
    meta.entry("origin".to_string()).or_insert_with(|| {
        json!({
            "type": origin.as_str(),
            "recordedAt": ts_ms_to_rfc3339(ts_ms),
        })
    });
}
