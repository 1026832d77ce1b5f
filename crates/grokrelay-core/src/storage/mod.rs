//! Durable key/value store contract.
//!
//! The pool treats the store as a synchronization point only at load and
//! flush time; per-request coordination never touches it.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use grokrelay_types::StoreError;

/// Abstract durable store: atomic get/set with an initialization lifecycle.
///
/// Implementations must be safe for concurrent callers without external
/// locking.
#[async_trait]
pub trait Store: Send + Sync {
    /// Prepare the backend (open files, create schema). Must be called once
    /// before `get`/`set`.
    async fn init(&self) -> Result<(), StoreError>;

    /// Read a value; `Ok(None)` means the key is absent, which is distinct
    /// from a read failure.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a value atomically.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}
