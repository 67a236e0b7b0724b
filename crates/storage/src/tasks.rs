#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Primary-key upsert; `created_at_ms` survives, everything else is
    /// rewritten.
    pub fn upsert_task(&mut self, task: &TaskRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO tasks(id, session_id, parent_id, title, status, accept_criteria, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
              session_id=excluded.session_id,
              parent_id=excluded.parent_id,
              title=excluded.title,
              status=excluded.status,
              accept_criteria=excluded.accept_criteria,
              updated_at_ms=excluded.updated_at_ms
            "#,
            params![
                task.id,
                task.session_id,
                task.parent_id,
                task.title,
                task.status,
                task.accept_criteria,
                task.created_at_ms,
                task.updated_at_ms,
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<TaskRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, session_id, parent_id, title, status, accept_criteria, created_at_ms, updated_at_ms
                FROM tasks WHERE id=?1
                "#,
                params![id],
                map_task_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Tasks with status doing/blocked for the session, most recently
    /// touched first.
    pub fn list_active_tasks(&self, session_id: &str, limit: usize) -> Result<Vec<TaskRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, session_id, parent_id, title, status, accept_criteria, created_at_ms, updated_at_ms
            FROM tasks
            WHERE session_id=?1 AND status IN ('doing', 'blocked')
            ORDER BY updated_at_ms DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![session_id, limit as i64], map_task_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

pub(crate) fn map_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        parent_id: row.get(2)?,
        title: row.get(3)?,
        status: row.get(4)?,
        accept_criteria: row.get(5)?,
        created_at_ms: row.get(6)?,
        updated_at_ms: row.get(7)?,
    })
}
