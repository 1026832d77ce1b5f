//! Token lifecycle manager.
//!
//! Single authoritative source of truth for which upstream tokens exist and
//! their current usability. All shared-state access goes through the pool's
//! methods; the background workers never touch the record map directly.

mod workers;

use crate::config::PoolConfig;
use crate::storage::Store;
use dashmap::DashMap;
use grokrelay_types::{CallOutcome, PoolError, StoreError, TokenRecord, TokenStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Store key under which the whole record set is persisted as one batch.
pub(crate) const STORE_KEY: &str = "grok_tokens";

/// Manages the pool of upstream credentials.
///
/// Key responsibilities:
/// - Load/persist the record set through the durable store
/// - LRU token selection for load distribution
/// - Health bookkeeping from reported call outcomes
/// - Owns the batch-save and status-refresh workers and their shutdown
pub struct TokenPool {
    records: DashMap<String, TokenRecord>,
    store: Arc<dyn Store>,
    config: PoolConfig,
    shutdown_tx: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown_started: AtomicBool,
    /// A record was removed since the last successful flush; forces the next
    /// batch write even when no surviving record is dirty.
    removed: AtomicBool,
}

impl TokenPool {
    pub fn new(store: Arc<dyn Store>, config: PoolConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            records: DashMap::new(),
            store,
            config,
            shutdown_tx,
            workers: Mutex::new(Vec::new()),
            shutdown_started: AtomicBool::new(false),
            removed: AtomicBool::new(false),
        }
    }

    /// Populate the record set from the durable store.
    ///
    /// Called exactly once at startup, before the workers run. A store
    /// failure propagates so the caller can abort initialization; an
    /// unreachable store must never be mistaken for "no tokens configured".
    /// An absent key is a valid empty pool.
    pub async fn load(&self) -> Result<usize, PoolError> {
        let Some(bytes) = self.store.get(STORE_KEY).await? else {
            tracing::info!("No persisted token set; starting with an empty pool");
            return Ok(0);
        };

        let persisted: Vec<TokenRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::read(format!("token set payload: {}", e)))?;

        let mut count = 0;
        for record in persisted {
            if record.value.is_empty() {
                tracing::warn!("Skipping persisted record with empty value");
                continue;
            }
            self.records.insert(record.value.clone(), record);
            count += 1;
        }

        tracing::info!("Loaded {} token record(s) from store", count);
        Ok(count)
    }

    /// Select a usable token by least-recently-used rotation.
    ///
    /// Never blocks; an empty or fully-degraded pool yields
    /// `NoTokenAvailable` immediately so callers can surface 503.
    pub fn acquire(&self) -> Result<TokenRecord, PoolError> {
        let now = chrono::Utc::now().timestamp();

        // A candidate can be demoted between the scan and the entry lock;
        // rescan until the pool has no usable record left.
        for _ in 0..=self.records.len() {
            let candidate = self
                .records
                .iter()
                .filter(|entry| entry.value().is_usable())
                .min_by_key(|entry| (entry.value().last_used_at, entry.key().clone()))
                .map(|entry| entry.key().clone());

            let Some(key) = candidate else {
                break;
            };

            if let Some(mut entry) = self.records.get_mut(&key) {
                if entry.is_usable() {
                    entry.last_used_at = now;
                    return Ok(entry.clone());
                }
            }
        }

        Err(PoolError::NoTokenAvailable)
    }

    /// Update a record's health from the result of an upstream call.
    ///
    /// Success keeps Valid; a rate limit starts a cooldown; an auth failure
    /// exhausts the token; Neutral (client disconnect, transient transport
    /// trouble) changes nothing.
    pub fn report_outcome(&self, value: &str, outcome: CallOutcome) {
        let Some(mut entry) = self.records.get_mut(value) else {
            tracing::debug!("Outcome for unknown token {}", mask(value));
            return;
        };

        let now = chrono::Utc::now().timestamp();
        match outcome {
            CallOutcome::Success | CallOutcome::Neutral => {},
            CallOutcome::RateLimited { retry_after_secs } => {
                let cooldown = if self.config.honor_retry_after {
                    retry_after_secs.unwrap_or(self.config.cooldown_secs)
                } else {
                    self.config.cooldown_secs
                };
                entry.status = TokenStatus::RateLimited;
                entry.cooldown_until = Some(now + cooldown as i64);
                entry.touch();
                tracing::warn!("Token {} rate-limited for {}s", mask(value), cooldown);
            },
            CallOutcome::AuthFailed => {
                entry.status = TokenStatus::Exhausted;
                entry.cooldown_until = None;
                entry.touch();
                tracing::warn!("Token {} exhausted (auth failure)", mask(value));
            },
        }
    }

    /// Add a credential to the pool. New records start Unknown and are
    /// promoted by the next refresh tick.
    pub fn insert(&self, value: &str) -> Result<(), PoolError> {
        if value.is_empty() {
            return Err(PoolError::InvalidToken { reason: "empty credential".to_string() });
        }
        self.records
            .entry(value.to_string())
            .or_insert_with(|| TokenRecord::new(value));
        Ok(())
    }

    /// Remove a credential; the removal lands in the store on the next flush.
    pub fn remove(&self, value: &str) -> bool {
        let removed = self.records.remove(value).is_some();
        if removed {
            self.removed.store(true, Ordering::SeqCst);
        }
        removed
    }

    /// Clear an exhausted record back into rotation (operator reset).
    /// Exhausted tokens are never promoted without this explicit step.
    pub fn reset(&self, value: &str) -> bool {
        let Some(mut entry) = self.records.get_mut(value) else {
            return false;
        };
        if entry.status != TokenStatus::Exhausted {
            return false;
        }
        entry.status = TokenStatus::Unknown;
        entry.cooldown_until = None;
        entry.touch();
        tracing::info!("Token {} reset by operator", mask(value));
        true
    }

    /// Current records, sorted by value, for the admin surface and tests.
    pub fn snapshot(&self) -> Vec<TokenRecord> {
        let mut records: Vec<TokenRecord> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.value.cmp(&b.value));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flush dirty records to the store as a single batch write.
    ///
    /// Takes a snapshot of dirty (value, version) pairs, writes the whole
    /// record set under one key, then clears `dirty` only where the version
    /// is still the snapshotted one. A mutation that raced past the
    /// snapshot stays dirty and lands next tick. Returns the number of
    /// records whose dirty flag was covered by this batch.
    pub(crate) async fn flush_dirty(&self) -> Result<usize, StoreError> {
        let dirty_snapshot: Vec<(String, u64)> = self
            .records
            .iter()
            .filter(|entry| entry.value().dirty)
            .map(|entry| (entry.key().clone(), entry.value().version))
            .collect();

        let had_removals = self.removed.swap(false, Ordering::SeqCst);
        if dirty_snapshot.is_empty() && !had_removals {
            return Ok(0);
        }

        let payload = serde_json::to_vec(&self.snapshot())
            .map_err(|e| StoreError::write(format!("serialize token set: {}", e)))?;

        if let Err(e) = self.store.set(STORE_KEY, &payload).await {
            // Records stay dirty; the next tick retries.
            if had_removals {
                self.removed.store(true, Ordering::SeqCst);
            }
            return Err(e);
        }

        for (value, version) in &dirty_snapshot {
            if let Some(mut entry) = self.records.get_mut(value) {
                if entry.version == *version {
                    entry.dirty = false;
                }
            }
        }

        Ok(dirty_snapshot.len())
    }

    /// Re-evaluate records not in Valid state.
    ///
    /// Promotes RateLimited records whose cooldown has elapsed and freshly
    /// added Unknown records; never touches Exhausted ones and never
    /// demotes. Returns the number of promotions.
    pub(crate) fn refresh_statuses(&self) -> usize {
        let now = chrono::Utc::now().timestamp();
        let mut promoted = 0;

        for mut entry in self.records.iter_mut() {
            let record = entry.value_mut();
            let eligible = match record.status {
                TokenStatus::RateLimited => record.cooldown_elapsed(now),
                TokenStatus::Unknown => true,
                TokenStatus::Valid | TokenStatus::Exhausted => false,
            };
            if eligible {
                record.status = TokenStatus::Valid;
                record.cooldown_until = None;
                record.last_refreshed_at = now;
                record.touch();
                promoted += 1;
            }
        }

        if promoted > 0 {
            tracing::debug!("Promoted {} token record(s) back to valid", promoted);
        }
        promoted
    }

    /// Stop both workers and perform the final flush.
    ///
    /// Idempotent: the first caller wins, later calls return immediately
    /// without a second flush. Worker timers are select!-interrupted, so
    /// shutdown completes within one tick interval.
    pub async fn shutdown(&self) {
        if self.shutdown_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let _ = self.shutdown_tx.send(true);

        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().await;
            workers.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Worker terminated abnormally: {}", e);
            }
        }

        match self.flush_dirty().await {
            Ok(0) => tracing::info!("Token pool shut down (nothing left to persist)"),
            Ok(n) => tracing::info!("Token pool shut down, {} record(s) persisted", n),
            Err(e) => tracing::error!("Final flush failed, dirty state lost at exit: {}", e),
        }
    }
}

/// Shorten a credential for log output.
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "***".to_string()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}
