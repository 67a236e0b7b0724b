#![forbid(unsafe_code)]

use super::*;
use rusqlite::params;

impl SqliteStore {
    /// Diagnostics trail for bundle composition; append-only.
    pub fn insert_token_metric(&mut self, metric: &TokenMetricRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO token_metrics(id, session_id, pointer_id, token_cost, budget, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                metric.id,
                metric.session_id,
                metric.pointer_id,
                metric.token_cost,
                metric.budget,
                metric.created_at_ms,
            ],
        )?;
        Ok(())
    }
}
