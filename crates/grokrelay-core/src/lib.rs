//! # Grok Relay Core
//!
//! Business logic for the relay:
//!
//! - **`storage`** - Durable key/value store contract (SQLite + in-memory)
//! - **`pool`** - Token lifecycle manager with batch-save and status-refresh
//!   workers
//! - **`stream`** - Line-oriented decoder for the upstream event stream
//! - **`adapter`** - Folds decoded events into caller-facing output shapes
//! - **`upstream`** - Grok backend client contract and HTTP implementation
//! - **`tools`** - The four tool operations (converse, generate-image,
//!   generate-video, list-models)

pub mod adapter;
pub mod config;
pub mod pool;
pub mod storage;
pub mod stream;
pub mod tools;
pub mod upstream;

pub use config::RelayConfig;
pub use pool::TokenPool;
pub use tools::ToolService;
