#![forbid(unsafe_code)]

use super::*;
use rwm_core::hash::sha256_hex;
use rwm_core::ids::{SessionId, fact_id};
use rwm_core::model::{ArtifactKind, EventKind, FactScope};
use std::path::PathBuf;

struct TestStore {
    store: SqliteStore,
    dir: PathBuf,
}

impl TestStore {
    fn new(test_name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "rwm_store_{test_name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let store = SqliteStore::open(dir.join("rwm.db"), &dir, dir.join("rwm_artifacts"))
            .expect("open store");
        Self { store, dir }
    }
}

impl Drop for TestStore {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn session() -> SessionId {
    SessionId::try_new("proj@main").expect("session id")
}

fn fact(key: &str, value: &str) -> FactInput {
    FactInput {
        key: key.to_string(),
        value: value.to_string(),
        scope: FactScope::Repo,
    }
}

#[test]
fn fact_commits_dedupe_by_key_and_scope() {
    let mut t = TestStore::new("fact_dedup");
    for value in ["npm run build", "cargo build"] {
        t.store
            .commit_frame(
                &session(),
                CommitFrame {
                    facts: vec![fact("build", value)],
                    ..Default::default()
                },
                1_000,
            )
            .expect("commit");
    }

    let facts = t.store.list_facts().expect("list facts");
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].value, "cargo build");
    assert_eq!(facts[0].id, fact_id("build", "repo"));
    assert_eq!(
        facts[0].id,
        format!("F-{}", &sha256_hex(b"build::repo")[..16])
    );
}

#[test]
fn pointer_artifact_preserves_uri_and_writes_no_body() {
    let mut t = TestStore::new("pointer");
    let ids = t
        .store
        .commit_frame(
            &session(),
            CommitFrame {
                artifacts: vec![ArtifactInput {
                    id: None,
                    kind: ArtifactKind::Snippet,
                    uri: Some("workspace://README.md".to_string()),
                    text: None,
                    path: None,
                    start_line: None,
                    end_line: None,
                    meta: None,
                }],
                ..Default::default()
            },
            1_000,
        )
        .expect("commit");

    assert_eq!(ids.len(), 1);
    let row = t.store.get_artifact(&ids[0]).expect("get").expect("row");
    assert_eq!(row.uri, "workspace://README.md");
    assert_eq!(row.size, 0);
    assert_eq!(row.sha256, sha256_hex(b"workspace://README.md"));
    assert!(row.is_pointer());
    assert!(!t.store.pool().has_body(&row.sha256));

    let meta: serde_json::Value = serde_json::from_str(&row.meta_json).expect("meta json");
    assert_eq!(meta["pointer"], serde_json::Value::Bool(true));
    assert_eq!(meta["origin"]["type"], "workspace-uri");
    assert!(
        !meta["origin"]["recordedAt"]
            .as_str()
            .unwrap_or("")
            .is_empty()
    );
}

#[test]
fn text_artifact_body_round_trips() {
    let mut t = TestStore::new("text_body");
    let ids = t
        .store
        .commit_frame(
            &session(),
            CommitFrame {
                artifacts: vec![ArtifactInput {
                    id: None,
                    kind: ArtifactKind::Diff,
                    uri: None,
                    text: Some("diff --git a b".to_string()),
                    path: None,
                    start_line: None,
                    end_line: None,
                    meta: None,
                }],
                ..Default::default()
            },
            1_000,
        )
        .expect("commit");

    let row = t.store.get_artifact(&ids[0]).expect("get").expect("row");
    assert_eq!(row.uri, format!("artifact://sha256/{}", row.sha256));
    assert_eq!(row.size, "diff --git a b".len() as i64);
    assert_eq!(row.id, format!("P-{}", &row.sha256[..8]));

    let body = t.store.pool().read_body(&row.sha256).expect("body");
    assert_eq!(body, b"diff --git a b");
    assert_eq!(sha256_hex(&body), row.sha256);
}

#[test]
fn decision_without_evidence_inherits_all_commit_artifacts() {
    let mut t = TestStore::new("evidence_default");
    let text_artifact = |text: &str| ArtifactInput {
        id: None,
        kind: ArtifactKind::Snippet,
        uri: None,
        text: Some(text.to_string()),
        path: None,
        start_line: None,
        end_line: None,
        meta: None,
    };
    let ids = t
        .store
        .commit_frame(
            &session(),
            CommitFrame {
                decisions: vec![
                    DecisionInput {
                        id: Some("D-first".to_string()),
                        kind: EventKind::Decision,
                        summary: "no explicit evidence".to_string(),
                        task_id: None,
                        evidence: None,
                    },
                    DecisionInput {
                        id: Some("D-second".to_string()),
                        kind: EventKind::Decision,
                        summary: "explicit evidence".to_string(),
                        task_id: None,
                        evidence: Some(vec!["E-1".to_string()]),
                    },
                ],
                artifacts: vec![text_artifact("one"), text_artifact("two")],
                ..Default::default()
            },
            1_000,
        )
        .expect("commit");
    assert_eq!(ids.len(), 2);

    let first = t.store.get_event("D-first").expect("get").expect("event");
    let evidence: Vec<String> = serde_json::from_str(&first.evidence_json).expect("json");
    assert_eq!(evidence, ids);

    let second = t.store.get_event("D-second").expect("get").expect("event");
    let evidence: Vec<String> = serde_json::from_str(&second.evidence_json).expect("json");
    assert_eq!(evidence, vec!["E-1".to_string()]);
}

#[test]
fn decision_links_to_current_task() {
    let mut t = TestStore::new("task_link");
    t.store
        .commit_frame(
            &session(),
            CommitFrame {
                task: Some("Implement feature".to_string()),
                decisions: vec![DecisionInput {
                    id: Some("D-choice".to_string()),
                    kind: EventKind::Decision,
                    summary: "Chose approach".to_string(),
                    task_id: None,
                    evidence: None,
                }],
                ..Default::default()
            },
            1_000,
        )
        .expect("commit");

    let event = t.store.get_event("D-choice").expect("get").expect("event");
    assert_eq!(event.task_id.as_deref(), Some("T-implement-fe"));

    let task = t
        .store
        .get_task("T-implement-fe")
        .expect("get")
        .expect("task");
    assert_eq!(task.title, "Implement feature");
    assert_eq!(task.status, "doing");
}

#[test]
fn task_upsert_preserves_created_at() {
    let mut t = TestStore::new("task_created_at");
    let frame = |ts: i64| {
        (
            CommitFrame {
                task: Some("Stable task".to_string()),
                ..Default::default()
            },
            ts,
        )
    };
    for (f, ts) in [frame(1_000), frame(9_000)] {
        t.store.commit_frame(&session(), f, ts).expect("commit");
    }
    let task = t
        .store
        .get_task("T-stable-task")
        .expect("get")
        .expect("task");
    assert_eq!(task.created_at_ms, 1_000);
    assert_eq!(task.updated_at_ms, 9_000);
}

#[test]
fn prune_removes_orphans_and_keeps_referenced_bodies() {
    let mut t = TestStore::new("prune");
    let ids = t
        .store
        .commit_frame(
            &session(),
            CommitFrame {
                artifacts: vec![ArtifactInput {
                    id: None,
                    kind: ArtifactKind::Log,
                    uri: None,
                    text: Some("kept body".to_string()),
                    path: None,
                    start_line: None,
                    end_line: None,
                    meta: None,
                }],
                ..Default::default()
            },
            1_000,
        )
        .expect("commit");
    let kept = t.store.get_artifact(&ids[0]).expect("get").expect("row");

    let orphan = t.store.pool().dir().join("orphan.tmp");
    std::fs::write(&orphan, b"stray").expect("write orphan");

    let removed = t.store.prune_orphans();
    assert_eq!(removed, 1);
    assert!(!orphan.exists());
    assert!(t.store.pool().has_body(&kept.sha256));
}

#[test]
fn canonicalize_rewrites_only_matching_aliases() {
    let mut t = TestStore::new("canonicalize");
    let alias = SessionId::try_new("proj@unknown").expect("alias");
    let other = SessionId::try_new("other@main").expect("other");
    for (sid, event_id) in [(&alias, "D-alias"), (&other, "D-other")] {
        t.store
            .insert_event(&EventRow {
                id: event_id.to_string(),
                kind: "NOTE".to_string(),
                task_id: None,
                session_id: sid.as_str().to_string(),
                summary: "note".to_string(),
                evidence_json: "[]".to_string(),
                ts_ms: 1_000,
            })
            .expect("insert");
    }

    let rewritten = t
        .store
        .canonicalize_sessions("proj", "proj@main")
        .expect("canonicalize");
    assert_eq!(rewritten, 1);

    let moved = t.store.get_event("D-alias").expect("get").expect("event");
    assert_eq!(moved.session_id, "proj@main");
    let untouched = t.store.get_event("D-other").expect("get").expect("event");
    assert_eq!(untouched.session_id, "other@main");
}

#[test]
fn read_span_clamps_to_file() {
    let t = TestStore::new("span");
    std::fs::write(t.dir.join("file.txt"), "l1\nl2\nl3\n").expect("write file");

    let (body, start, end) = t
        .store
        .read_span("file.txt", Some(2), Some(99))
        .expect("span");
    assert_eq!(body, "l2\nl3");
    assert_eq!((start, end), (2, 3));

    let (full, _, _) = t.store.read_span("file.txt", None, None).expect("span");
    assert_eq!(full, "l1\nl2\nl3");

    assert!(t.store.read_span("../escape.txt", None, None).is_err());
}
