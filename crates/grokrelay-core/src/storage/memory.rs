//! In-memory store for tests and ephemeral deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use grokrelay_types::StoreError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::Store;

/// DashMap-backed store. Also counts writes and can be switched into a
/// failing mode, which the pool tests use to exercise retry behavior.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
    writes: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `set` fail until re-enabled.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write("injected write failure"));
        }
        self.entries.insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
