#![forbid(unsafe_code)]

use super::*;
use crate::events::map_event_row;
use crate::facts::map_fact_row;
use crate::tasks::map_task_row;
use rusqlite::params;

impl SqliteStore {
    /// Literal substring lookup over events, tasks and facts. Events and
    /// tasks are session-scoped; facts are project-wide and ignore the
    /// session on purpose.
    pub fn search(
        &self,
        session_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<SearchHits, StoreError> {
        let needle = format!("%{query}%");
        let limit = limit as i64;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, kind, task_id, session_id, summary, evidence_json, ts_ms
            FROM events
            WHERE session_id=?1 AND (summary LIKE ?2 OR id LIKE ?2)
            ORDER BY ts_ms DESC, rowid DESC
            LIMIT ?3
            "#,
        )?;
        let rows = stmt.query_map(params![session_id, needle, limit], map_event_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, session_id, parent_id, title, status, accept_criteria, created_at_ms, updated_at_ms
            FROM tasks
            WHERE session_id=?1 AND (title LIKE ?2 OR id LIKE ?2)
            ORDER BY updated_at_ms DESC
            LIMIT ?3
            "#,
        )?;
        let rows = stmt.query_map(params![session_id, needle, limit], map_task_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, key, value, scope
            FROM facts
            WHERE key LIKE ?1 OR value LIKE ?1
            ORDER BY key ASC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![needle, limit], map_fact_row)?;
        let mut facts = Vec::new();
        for row in rows {
            facts.push(row?);
        }

        Ok(SearchHits {
            events,
            tasks,
            facts,
        })
    }
}
