//! Generated content shapes.

use serde::{Deserialize, Serialize};

/// Business details driving content generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessBrief {
    pub business_name: String,
    pub business_type: String,
    pub offer: String,
    #[serde(default)]
    pub extra_info: String,
}

/// Script and visual headline produced by the content adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialContent {
    /// Short voiceover script (a sentence or two)
    pub script: String,
    /// Visual headline overlaid on the video
    pub headline: String,
}

impl CommercialContent {
    /// Fallback when the adapter's output cannot be parsed as the
    /// expected structure: the business name becomes the headline and
    /// the raw model text becomes the script.
    pub fn fallback(business_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            script: raw_text.into(),
            headline: business_name.into(),
        }
    }
}

/// Metadata attached to the published video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}
