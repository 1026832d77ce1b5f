//! # Grok Relay Types
//!
//! Core types, models, and error definitions for Grok Relay.
//!
//! This crate provides the foundational type system for the relay:
//!
//! - **`error`** - Typed error hierarchy for the token pool, storage,
//!   upstream exchange, and tool invocations
//! - **`models`** - Domain models (token records, model catalog)
//! - **`protocol`** - Chat protocol message types (OpenAI-shaped)
//!
//! ## Architecture Role
//!
//! `grokrelay-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!         grokrelay-types (this crate)
//!                 │
//!                 ▼
//!          grokrelay-core
//!                 │
//!                 ▼
//!         grokrelay-server
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API responses and persistence
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;
pub mod protocol;

// Re-export error types for convenience
pub use error::{InvocationError, InvocationStage, PoolError, RelayError, StoreError, UpstreamError};

// Re-export core model types
pub use models::{CallOutcome, ModelCapabilities, ModelInfo, TokenRecord, TokenStatus};
