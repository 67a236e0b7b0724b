#![forbid(unsafe_code)]

use rwm_core::ids::SessionId;
use rwm_core::tokens::{ModelFamily, TokenEstimator};
use rwm_storage::{EventRow, SqliteStore, StoreError};
use serde_json::{Value, json};

const TASK_CANDIDATES: usize = 20;
const EVENT_CANDIDATES: usize = 100;
const MANDATORY_DECISIONS: usize = 3;
const MANDATORY_FAILURES: usize = 3;
const NOW_CARD_IDS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PointerType {
    Task,
    Event,
    Fact,
}

impl PointerType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Event => "EVENT",
            Self::Fact => "FACT",
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct BundleItem {
    pub(crate) id: String,
    pub(crate) pointer_type: PointerType,
    pub(crate) text: String,
    pub(crate) token_cost: usize,
    pub(crate) score: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct Bundle {
    pub(crate) text: String,
    pub(crate) now: Value,
    pub(crate) pointers: Vec<Value>,
    pub(crate) token_estimate: usize,
    pub(crate) budget: usize,
    pub(crate) metrics: Vec<(String, usize)>,
}

/// Compose a rehydration bundle: gather candidates, score, pick greedily by
/// utility density under the token budget, with recent decisions and
/// failures included first.
pub(crate) fn compose(
    store: &SqliteStore,
    estimator: &TokenEstimator,
    family: ModelFamily,
    session: &SessionId,
    budget: usize,
    now_ms: i64,
) -> Result<Bundle, StoreError> {
    let tasks = store.list_active_tasks(session.as_str(), TASK_CANDIDATES)?;
    let events = store.list_recent_events(session.as_str(), EVENT_CANDIDATES)?;
    let facts = store.list_facts()?;

    let mut candidates: Vec<BundleItem> = Vec::new();
    for task in &tasks {
        let mut text = format!("TASK {}: {} [{}]", task.id, task.title, task.status);
        if let Some(criteria) = &task.accept_criteria {
            text.push_str("\nACCEPT: ");
            text.push_str(criteria);
        }
        let score = 5.0 + (3.0 - age_hours(now_ms, task.updated_at_ms) * 0.5).max(0.0);
        candidates.push(BundleItem {
            id: task.id.clone(),
            pointer_type: PointerType::Task,
            token_cost: estimator.estimate(&text, family),
            text,
            score,
        });
    }
    for event in &events {
        let text = format!("{} {}: {}", event.kind, event.id, event.summary);
        let base = match event.kind.as_str() {
            "TEST_FAIL" | "BLOCKER" => 4.0,
            "DECISION" => 3.5,
            _ => 2.0,
        };
        let score = base + (4.0 - age_hours(now_ms, event.ts_ms)).max(0.0);
        candidates.push(BundleItem {
            id: event.id.clone(),
            pointer_type: PointerType::Event,
            token_cost: estimator.estimate(&text, family),
            text,
            score,
        });
    }
    for fact in &facts {
        let text = format!("FACT {}={} ({})", fact.key, fact.value, fact.scope);
        candidates.push(BundleItem {
            id: fact.id.clone(),
            pointer_type: PointerType::Fact,
            token_cost: estimator.estimate(&text, family),
            text,
            score: 1.5,
        });
    }

    // Mandatory set: most recent decisions plus most recent failures or
    // blockers; `events` is already newest-first.
    let mandatory_ids: Vec<String> = {
        let decisions = events
            .iter()
            .filter(|e| e.kind == "DECISION")
            .take(MANDATORY_DECISIONS);
        let failures = events
            .iter()
            .filter(|e| e.kind == "TEST_FAIL" || e.kind == "BLOCKER")
            .take(MANDATORY_FAILURES);
        let mut mandatory: Vec<&EventRow> = decisions.chain(failures).collect();
        mandatory.sort_by_key(|e| std::cmp::Reverse(e.ts_ms));
        mandatory.iter().map(|e| e.id.clone()).collect()
    };

    let mut picked: Vec<BundleItem> = Vec::new();
    let mut used = 0usize;
    let is_picked =
        |picked: &[BundleItem], item: &BundleItem| picked.iter().any(|p| p.id == item.id);

    for id in &mandatory_ids {
        let Some(item) = candidates
            .iter()
            .find(|c| c.pointer_type == PointerType::Event && &c.id == id)
        else {
            continue;
        };
        // A mandatory item that does not fit is skipped, not an error.
        if used + item.token_cost <= budget && !is_picked(&picked, item) {
            used += item.token_cost;
            picked.push(item.clone());
        }
    }

    let mut remainder: Vec<&BundleItem> = candidates
        .iter()
        .filter(|c| !(c.pointer_type == PointerType::Event && mandatory_ids.contains(&c.id)))
        .collect();
    // Stable sort keeps candidate insertion order on density ties.
    remainder.sort_by(|a, b| {
        density(b)
            .partial_cmp(&density(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for item in remainder {
        if is_picked(&picked, item) {
            continue;
        }
        if used + item.token_cost <= budget {
            used += item.token_cost;
            picked.push(item.clone());
        }
    }

    let now = now_card(&tasks, &events);
    let text = render_text(&now, &picked);
    let pointers = picked
        .iter()
        .map(|item| {
            json!({
                "type": item.pointer_type.as_str(),
                "id": item.id,
                "text": item.text,
                "tokens": item.token_cost,
            })
        })
        .collect();
    let metrics = picked
        .iter()
        .map(|item| (item.id.clone(), item.token_cost))
        .collect();

    Ok(Bundle {
        text,
        now,
        pointers,
        token_estimate: used,
        budget,
        metrics,
    })
}

fn density(item: &BundleItem) -> f64 {
    item.score / (item.token_cost as f64 + 1.0)
}

fn age_hours(now_ms: i64, ts_ms: i64) -> f64 {
    (now_ms.saturating_sub(ts_ms)) as f64 / 3_600_000.0
}

fn now_card(tasks: &[rwm_storage::TaskRow], events: &[EventRow]) -> Value {
    let objective = tasks
        .first()
        .map(|t| t.title.clone())
        .unwrap_or_else(|| "No active task".to_string());
    let active: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
    let decisions: Vec<String> = events
        .iter()
        .filter(|e| e.kind == "DECISION")
        .take(NOW_CARD_IDS)
        .map(|e| e.id.clone())
        .collect();
    let failing: Vec<String> = events
        .iter()
        .filter(|e| e.kind == "TEST_FAIL")
        .take(NOW_CARD_IDS)
        .map(|e| e.id.clone())
        .collect();
    json!({
        "objective": objective,
        "active": active,
        "decisions": decisions,
        "failing_tests": failing,
    })
}

fn render_text(now: &Value, picked: &[BundleItem]) -> String {
    let join = |key: &str| {
        let ids: Vec<&str> = now[key]
            .as_array()
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        if ids.is_empty() {
            "—".to_string()
        } else {
            ids.join(", ")
        }
    };

    let mut out = String::new();
    out.push_str("NOW:\n");
    out.push_str(&format!(
        "- Objective: {}\n",
        now["objective"].as_str().unwrap_or("No active task")
    ));
    out.push_str(&format!("- Active: {}\n", join("active")));
    out.push_str(&format!("- Decisions: {}\n", join("decisions")));
    out.push_str(&format!("- Failing tests: {}\n", join("failing_tests")));
    out.push_str("\nPOINTERS:\n");
    for item in picked {
        out.push_str(&format!("• {} {}\n", item.pointer_type.as_str(), item.id));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rwm_core::model::{EventKind, FactScope};
    use rwm_storage::{CommitFrame, DecisionInput, FactInput};
    use std::path::PathBuf;

    struct TestStore {
        store: SqliteStore,
        dir: PathBuf,
    }

    impl TestStore {
        fn new(test_name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "rwm_bundle_{test_name}_{}_{}",
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

    fn decision(id: &str, kind: EventKind, summary: &str) -> DecisionInput {
        DecisionInput {
            id: Some(id.to_string()),
            kind,
            summary: summary.to_string(),
            task_id: None,
            evidence: None,
        }
    }

    fn estimator() -> TokenEstimator {
        TokenEstimator::new(ModelFamily::Generic)
    }

    #[test]
    fn mandatory_decisions_and_failures_are_included() {
        let mut t = TestStore::new("mandatory");
        t.store
            .commit_frame(
                &session(),
                CommitFrame {
                    decisions: vec![
                        decision("D-1", EventKind::Decision, "chose sqlite"),
                        decision("F-1", EventKind::TestFail, "schema test red"),
                        decision("N-1", EventKind::Note, "minor remark"),
                    ],
                    ..Default::default()
                },
                1_000,
            )
            .expect("commit");

        let bundle = compose(
            &t.store,
            &estimator(),
            ModelFamily::Generic,
            &session(),
            100,
            2_000,
        )
        .expect("compose");

        let pointer_ids: Vec<&str> = bundle
            .pointers
            .iter()
            .filter_map(|p| p["id"].as_str())
            .collect();
        assert!(pointer_ids.contains(&"D-1"));
        assert!(pointer_ids.contains(&"F-1"));
        assert!(bundle.metrics.len() >= bundle.pointers.len());
        assert!(bundle.token_estimate <= bundle.budget);
    }

    #[test]
    fn selection_never_exceeds_budget() {
        let mut t = TestStore::new("budget");
        let decisions = (0..40)
            .map(|i| {
                decision(
                    &format!("D-{i}"),
                    EventKind::Note,
                    "a reasonably long event summary with many words to cost tokens",
                )
            })
            .collect();
        t.store
            .commit_frame(
                &session(),
                CommitFrame {
                    decisions,
                    ..Default::default()
                },
                1_000,
            )
            .expect("commit");

        let budget = 30;
        let bundle = compose(
            &t.store,
            &estimator(),
            ModelFamily::Generic,
            &session(),
            budget,
            2_000,
        )
        .expect("compose");
        assert!(bundle.token_estimate <= budget);
        assert!(!bundle.pointers.is_empty());
        assert!(bundle.pointers.len() < 40);
    }

    #[test]
    fn oversized_mandatory_items_are_silently_skipped() {
        let mut t = TestStore::new("oversized");
        let long_summary = "word ".repeat(200);
        t.store
            .commit_frame(
                &session(),
                CommitFrame {
                    decisions: vec![decision("D-big", EventKind::Decision, &long_summary)],
                    ..Default::default()
                },
                1_000,
            )
            .expect("commit");

        let bundle = compose(
            &t.store,
            &estimator(),
            ModelFamily::Generic,
            &session(),
            10,
            2_000,
        )
        .expect("compose");
        assert!(bundle.pointers.is_empty());
        assert_eq!(bundle.token_estimate, 0);
    }

    #[test]
    fn now_card_renders_objective_and_placeholders() {
        let mut t = TestStore::new("nowcard");
        t.store
            .commit_frame(
                &session(),
                CommitFrame {
                    task: Some("Ship the composer".to_string()),
                    facts: vec![FactInput {
                        key: "build".to_string(),
                        value: "cargo build".to_string(),
                        scope: FactScope::Repo,
                    }],
                    ..Default::default()
                },
                1_000,
            )
            .expect("commit");

        let bundle = compose(
            &t.store,
            &estimator(),
            ModelFamily::Generic,
            &session(),
            500,
            2_000,
        )
        .expect("compose");

        assert!(bundle.text.starts_with("NOW:\n- Objective: Ship the composer"));
        assert!(bundle.text.contains("- Decisions: —"));
        assert!(bundle.text.contains("- Failing tests: —"));
        assert!(bundle.text.contains("• TASK T-ship-the-com"));
        assert!(bundle.text.contains("• FACT F-"));
        assert_eq!(bundle.now["active"][0], "T-ship-the-com");
    }

    #[test]
    fn empty_session_composes_an_empty_bundle() {
        let t = TestStore::new("empty");
        let bundle = compose(
            &t.store,
            &estimator(),
            ModelFamily::Generic,
            &session(),
            100,
            2_000,
        )
        .expect("compose");
        assert_eq!(bundle.now["objective"], "No active task");
        assert!(bundle.pointers.is_empty());
        assert_eq!(bundle.token_estimate, 0);
    }
}
