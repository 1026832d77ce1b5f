//! Durable store errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the durable key/value store.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum StoreError {
    /// Store backend could not be reached or opened.
    ///
    /// Fatal during startup load: an unreachable store must abort process
    /// initialization instead of silently starting with zero tokens.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// A read completed abnormally (I/O failure, corrupt payload).
    #[error("store read failed: {message}")]
    Read { message: String },

    /// A write did not land; callers keep their dirty state and retry.
    #[error("store write failed: {message}")]
    Write { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::Read { message: message.into() }
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::Write { message: message.into() }
    }
}
