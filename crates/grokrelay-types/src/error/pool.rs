//! Token pool errors.

use super::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the token lifecycle manager.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum PoolError {
    /// No token with Valid status at acquisition time.
    ///
    /// Recoverable: surfaced to the caller as a retryable condition,
    /// never crashes the process.
    #[error("no valid token available")]
    NoTokenAvailable,

    /// The durable store failed during load or the final flush.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// A token value that violates pool invariants (empty credential).
    #[error("invalid token value: {reason}")]
    InvalidToken { reason: String },
}

impl PoolError {
    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoTokenAvailable => 503,
            Self::Store(_) => 500,
            Self::InvalidToken { .. } => 400,
        }
    }
}
