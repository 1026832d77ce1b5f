//! SQLite-backed durable store.

use async_trait::async_trait;
use grokrelay_types::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::Store;

/// Key/value store on a single SQLite file.
///
/// The connection lives behind an async mutex; writes go through an UPSERT
/// so each `set` is atomic.
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), conn: Mutex::new(None) }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn init(&self) -> Result<(), StoreError> {
        let mut guard = self.conn.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let conn = Connection::open(&self.path)
            .map_err(|e| StoreError::unavailable(format!("open {}: {}", self.path.display(), e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::unavailable(format!("create schema: {}", e)))?;

        *guard = Some(conn);
        tracing::debug!("SQLite store ready at {}", self.path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::unavailable("store not initialized"))?;

        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(|e| StoreError::read(e.to_string()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::unavailable("store not initialized"))?;

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .map_err(|e| StoreError::write(e.to_string()))?;
        Ok(())
    }
}
