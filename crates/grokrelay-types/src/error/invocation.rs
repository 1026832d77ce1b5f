//! Tool invocation failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage at which an invocation failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStage {
    /// The upstream event stream could not be decoded into a usable result.
    Decode,
    /// Transport succeeded but the upstream produced no usable output.
    Generation,
}

impl std::fmt::Display for InvocationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode => write!(f, "decode"),
            Self::Generation => write!(f, "generation"),
        }
    }
}

/// Single normalized failure kind for tool invocations.
///
/// Carries the stage and a human-readable message; callers never see raw
/// transport stack traces or internal exception structure.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message}")]
pub struct InvocationError {
    pub stage: InvocationStage,
    pub message: String,
}

impl InvocationError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self { stage: InvocationStage::Decode, message: message.into() }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self { stage: InvocationStage::Generation, message: message.into() }
    }

    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        502
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message_only() {
        let err = InvocationError::generation("video generation failed: no media returned");
        assert_eq!(err.to_string(), "video generation failed: no media returned");
        assert_eq!(err.stage, InvocationStage::Generation);
    }
}
