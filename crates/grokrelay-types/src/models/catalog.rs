//! Static catalog of upstream Grok models.

use serde::{Deserialize, Serialize};

/// Capability flags exposed in the model listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelCapabilities {
    pub chat: bool,
    pub image_generation: bool,
    pub video_generation: bool,
}

/// One entry of the model catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub requires_super: bool,
    pub cost_multiplier: u32,
    pub capabilities: ModelCapabilities,
}

impl ModelInfo {
    fn chat(id: &str, display_name: &str, description: &str, requires_super: bool, cost: u32) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            requires_super,
            cost_multiplier: cost,
            capabilities: ModelCapabilities {
                chat: true,
                image_generation: true,
                video_generation: false,
            },
        }
    }

    fn video(id: &str, display_name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            requires_super: false,
            cost_multiplier: 1,
            capabilities: ModelCapabilities {
                chat: false,
                image_generation: false,
                video_generation: true,
            },
        }
    }
}

/// The models this relay knows how to route.
pub fn grok_catalog() -> Vec<ModelInfo> {
    vec![
        ModelInfo::chat("grok-3", "Grok 3", "Flagship reasoning model", false, 1),
        ModelInfo::chat(
            "grok-3-fast",
            "Grok 3 Fast",
            "Low-latency variant for general chat and generation",
            false,
            1,
        ),
        ModelInfo::chat(
            "grok-4",
            "Grok 4",
            "Latest generation model with extended reasoning",
            true,
            2,
        ),
        ModelInfo::video(
            "grok-imagine-0.9",
            "Grok Imagine",
            "Image-to-video generation model",
        ),
    ]
}
