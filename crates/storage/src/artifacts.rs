#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Overwrite all mutable columns; `created_at_ms` survives the first
    /// insert.
    pub fn upsert_artifact(&mut self, artifact: &ArtifactRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO artifacts(id, kind, uri, sha256, size, meta_json, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
              kind=excluded.kind,
              uri=excluded.uri,
              sha256=excluded.sha256,
              size=excluded.size,
              meta_json=excluded.meta_json
            "#,
            params![
                artifact.id,
                artifact.kind,
                artifact.uri,
                artifact.sha256,
                artifact.size,
                artifact.meta_json,
                artifact.created_at_ms,
            ],
        )?;
        Ok(())
    }

    pub fn get_artifact(&self, id: &str) -> Result<Option<ArtifactRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, kind, uri, sha256, size, meta_json, created_at_ms
                FROM artifacts WHERE id=?1
                "#,
                params![id],
                map_artifact_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Distinct hashes across all artifact rows; the prune survivor set.
    pub fn list_artifact_hashes(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT sha256 FROM artifacts")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

pub(crate) fn map_artifact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtifactRow> {
    Ok(ArtifactRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        uri: row.get(2)?,
        sha256: row.get(3)?,
        size: row.get(4)?,
        meta_json: row.get(5)?,
        created_at_ms: row.get(6)?,
    })
}
