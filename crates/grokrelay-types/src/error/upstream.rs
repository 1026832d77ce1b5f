//! Upstream exchange errors.

use crate::models::CallOutcome;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while exchanging a request with the Grok backend.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum UpstreamError {
    /// Network-level failure (connect, TLS, body read).
    #[error("upstream request failed: {message}")]
    Transport { message: String },

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Upstream answered 2xx but the body was not the expected shape.
    #[error("upstream response malformed: {message}")]
    Malformed { message: String },
}

impl UpstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    /// Classify this failure as a token health outcome.
    ///
    /// 429 punishes with a cooldown, 401/403 exhausts the token; anything
    /// else is neutral so transient upstream trouble never burns credentials.
    pub fn outcome(&self) -> CallOutcome {
        match self {
            Self::Status { status: 429, retry_after_secs, .. } => {
                CallOutcome::RateLimited { retry_after_secs: *retry_after_secs }
            },
            Self::Status { status: 401 | 403, .. } => CallOutcome::AuthFailed,
            _ => CallOutcome::Neutral,
        }
    }
}
