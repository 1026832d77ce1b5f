//! Typed error definitions for Grok Relay.
//!
//! This module provides a structured error hierarchy with specific error types
//! for different domains. All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants
//! - **Composable** via thiserror derive macros

mod invocation;
mod pool;
mod store;
mod upstream;

pub use invocation::{InvocationError, InvocationStage};
pub use pool::PoolError;
pub use store::StoreError;
pub use upstream::UpstreamError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for tool operations.
///
/// Callers are forced to distinguish "no usable token right now" (retryable,
/// 503) from "the invocation itself failed" (502); the two never collapse
/// into one opaque condition.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum RelayError {
    /// Wraps a token pool error
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Wraps a tool invocation failure
    #[error("{0}")]
    Invocation(#[from] InvocationError),
}

impl RelayError {
    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Pool(e) => e.http_status_code(),
            Self::Invocation(e) => e.http_status_code(),
        }
    }
}

/// Standard Result type using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = RelayError::Pool(PoolError::NoTokenAvailable);

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Pool"));

        let deserialized: RelayError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_status_code_passthrough() {
        assert_eq!(RelayError::Pool(PoolError::NoTokenAvailable).http_status_code(), 503);

        let invocation =
            RelayError::Invocation(InvocationError::generation("image generation failed: empty"));
        assert_eq!(invocation.http_status_code(), 502);
    }
}
