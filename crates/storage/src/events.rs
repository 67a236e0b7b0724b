#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Append-only: a duplicate id is a constraint failure, never an update.
    pub fn insert_event(&mut self, event: &EventRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO events(id, kind, task_id, session_id, summary, evidence_json, ts_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event.id,
                event.kind,
                event.task_id,
                event.session_id,
                event.summary,
                event.evidence_json,
                event.ts_ms,
            ],
        )?;
        Ok(())
    }

    pub fn get_event(&self, id: &str) -> Result<Option<EventRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, kind, task_id, session_id, summary, evidence_json, ts_ms
                FROM events WHERE id=?1
                "#,
                params![id],
                map_event_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Newest first; rowid breaks same-millisecond ties by insertion order.
    pub fn list_recent_events(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<EventRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, kind, task_id, session_id, summary, evidence_json, ts_ms
            FROM events
            WHERE session_id=?1
            ORDER BY ts_ms DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![session_id, limit as i64], map_event_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

pub(crate) fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        task_id: row.get(2)?,
        session_id: row.get(3)?,
        summary: row.get(4)?,
        evidence_json: row.get(5)?,
        ts_ms: row.get(6)?,
    })
}
