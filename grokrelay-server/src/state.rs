//! Shared application state for the HTTP layer.

use grokrelay_core::{TokenPool, ToolService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<TokenPool>,
    pub tools: Arc<ToolService>,
    /// Static bearer key required on tool routes when configured.
    pub api_key: Option<String>,
}
