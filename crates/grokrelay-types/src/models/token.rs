//! Token record model.

use serde::{Deserialize, Serialize};

/// Health/usage state of an upstream credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Usable for new requests.
    Valid,
    /// Cooling down after an upstream 429; eligible for promotion once the
    /// cooldown elapses.
    RateLimited,
    /// Rejected by upstream auth; stays out of rotation until an operator
    /// resets it.
    Exhausted,
    /// Freshly loaded or added, awaiting its first health evaluation.
    Unknown,
}

/// One upstream credential and its bookkeeping state.
///
/// The serialized form is what lands in the durable store; `dirty` and
/// `version` are runtime-only flush bookkeeping and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    /// Opaque credential string; unique key within the record set.
    pub value: String,
    pub status: TokenStatus,
    /// Unix seconds of the last health re-evaluation.
    pub last_refreshed_at: i64,
    /// Unix seconds until which a rate-limited record stays locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<i64>,
    /// Unix seconds of the last acquisition; drives LRU rotation.
    #[serde(default)]
    pub last_used_at: i64,
    /// Mutated since the last successful flush.
    #[serde(skip)]
    pub dirty: bool,
    /// Mutation counter; lets the flush worker clear `dirty` without
    /// clobbering a mutation that raced past its snapshot.
    #[serde(skip)]
    pub version: u64,
}

impl TokenRecord {
    /// Create a fresh record awaiting health evaluation.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status: TokenStatus::Unknown,
            last_refreshed_at: 0,
            cooldown_until: None,
            last_used_at: 0,
            dirty: true,
            version: 1,
        }
    }

    /// Whether the record may be handed out by `acquire()`.
    pub fn is_usable(&self) -> bool {
        self.status == TokenStatus::Valid
    }

    /// Whether a rate-limited record has served out its cooldown.
    pub fn cooldown_elapsed(&self, now: i64) -> bool {
        self.cooldown_until.is_none_or(|until| until <= now)
    }

    /// Record a mutation for the flush worker.
    pub fn touch(&mut self) {
        self.dirty = true;
        self.version = self.version.wrapping_add(1);
    }
}

/// Result of one upstream call, reported back for health bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallOutcome {
    /// Completed normally; token stays Valid.
    Success,
    /// Upstream 429; token cools down.
    RateLimited { retry_after_secs: Option<u64> },
    /// Upstream 401/403; token is exhausted.
    AuthFailed,
    /// Partial or indeterminate result (client disconnect mid-stream,
    /// transient transport failure); non-punitive, no state change.
    Neutral,
}
