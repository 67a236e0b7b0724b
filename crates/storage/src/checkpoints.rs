#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    pub fn insert_checkpoint(&mut self, checkpoint: &CheckpointRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO checkpoints(id, session_id, label, ts_ms, bundle_meta)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                checkpoint.id,
                checkpoint.session_id,
                checkpoint.label,
                checkpoint.ts_ms,
                checkpoint.bundle_meta,
            ],
        )?;
        Ok(())
    }

    pub fn get_checkpoint(&self, id: &str) -> Result<Option<CheckpointRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, session_id, label, ts_ms, bundle_meta FROM checkpoints WHERE id=?1",
                params![id],
                |row| {
                    Ok(CheckpointRow {
                        id: row.get(0)?,
                        session_id: row.get(1)?,
                        label: row.get(2)?,
                        ts_ms: row.get(3)?,
                        bundle_meta: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}
