#![forbid(unsafe_code)]
//! Structured store for resumable working memory: SQLite schema, the
//! content-addressed artifact body pool, and the state-frame commit pipeline.

mod artifacts;
mod checkpoints;
mod commit;
mod error;
mod events;
mod facts;
mod metrics;
mod pool;
mod search;
mod sessions;
mod support;
mod tasks;
#[cfg(test)]
mod tests;
mod types;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub use error::StoreError;
pub use pool::ArtifactPool;
pub use types::*;

#[derive(Debug)]
pub struct SqliteStore {
    root: PathBuf,
    conn: Connection,
    pool: ArtifactPool,
}

impl SqliteStore {
    /// Open (creating if absent) the project database and body pool.
    /// Every mutation is flushed durably before the call returns
    /// (WAL + synchronous=FULL).
    pub fn open(
        db_path: impl AsRef<Path>,
        root: impl AsRef<Path>,
        artifacts_dir: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        let pool = ArtifactPool::open(artifacts_dir)?;
        let store = Self {
            root: root.as_ref().to_path_buf(),
            conn,
            pool,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pool(&self) -> &ArtifactPool {
        &self.pool
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=FULL;

            CREATE TABLE IF NOT EXISTS tasks (
              id TEXT PRIMARY KEY,
              session_id TEXT NOT NULL,
              parent_id TEXT,
              title TEXT NOT NULL,
              status TEXT NOT NULL,
              accept_criteria TEXT,
              created_at_ms INTEGER NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
              id TEXT PRIMARY KEY,
              kind TEXT NOT NULL,
              task_id TEXT,
              session_id TEXT NOT NULL,
              summary TEXT NOT NULL,
              evidence_json TEXT NOT NULL,
              ts_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS artifacts (
              id TEXT PRIMARY KEY,
              kind TEXT NOT NULL,
              uri TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              size INTEGER NOT NULL,
              meta_json TEXT NOT NULL,
              created_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS facts (
              id TEXT PRIMARY KEY,
              key TEXT NOT NULL,
              value TEXT NOT NULL,
              scope TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS checkpoints (
              id TEXT PRIMARY KEY,
              session_id TEXT NOT NULL,
              label TEXT NOT NULL,
              ts_ms INTEGER NOT NULL,
              bundle_meta TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS token_metrics (
              id TEXT PRIMARY KEY,
              session_id TEXT NOT NULL,
              pointer_id TEXT NOT NULL,
              token_cost INTEGER NOT NULL,
              budget INTEGER NOT NULL,
              created_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS edges (
              src_id TEXT NOT NULL,
              dst_id TEXT NOT NULL,
              kind TEXT NOT NULL,
              PRIMARY KEY (src_id, dst_id, kind)
            );

            CREATE INDEX IF NOT EXISTS idx_events_session_ts ON events(session_id, ts_ms);
            CREATE INDEX IF NOT EXISTS idx_tasks_session_updated ON tasks(session_id, updated_at_ms);
            CREATE INDEX IF NOT EXISTS idx_checkpoints_session ON checkpoints(session_id, ts_ms);
            CREATE INDEX IF NOT EXISTS idx_artifacts_sha ON artifacts(sha256);
            "#,
        )?;
        Ok(())
    }
}
