#![forbid(unsafe_code)]

use super::*;
use rusqlite::params;

impl SqliteStore {
    /// Fold legacy session aliases (`<base>@unknown`, stale suffixes) into
    /// the canonical id across every session-keyed table.
    pub fn canonicalize_sessions(&mut self, base: &str, canonical: &str) -> Result<usize, StoreError> {
        let pattern = format!("{base}@%");
        let tx = self.conn.transaction()?;
        let mut rewritten = 0usize;
        for table in ["events", "tasks", "checkpoints"] {
            let sql = format!(
                "UPDATE {table} SET session_id=?1 WHERE session_id LIKE ?2 AND session_id != ?1"
            );
            rewritten += tx.execute(&sql, params![canonical, pattern])?;
        }
        tx.commit()?;
        Ok(rewritten)
    }
}
