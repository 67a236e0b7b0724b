#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// The deterministic id makes repeated commits of the same (key, scope)
    /// update in place.
    pub fn upsert_fact(&mut self, fact: &FactRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO facts(id, key, value, scope)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
              value=excluded.value,
              scope=excluded.scope
            "#,
            params![fact.id, fact.key, fact.value, fact.scope],
        )?;
        Ok(())
    }

    pub fn get_fact(&self, id: &str) -> Result<Option<FactRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, key, value, scope FROM facts WHERE id=?1",
                params![id],
                map_fact_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Facts are project-wide; there is no session filter.
    pub fn list_facts(&self) -> Result<Vec<FactRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, key, value, scope FROM facts ORDER BY key ASC")?;
        let rows = stmt.query_map([], map_fact_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

pub(crate) fn map_fact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FactRow> {
    Ok(FactRow {
        id: row.get(0)?,
        key: row.get(1)?,
        value: row.get(2)?,
        scope: row.get(3)?,
    })
}
