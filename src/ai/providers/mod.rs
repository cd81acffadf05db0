pub mod gemini;

use super::error::ChatResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiTransport;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Fixed configuration a session handle is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub model: String,
    pub system_instruction: String,
    pub web_search: bool,
}

/// One turn of conversation history as sent to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn jpeg(data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: JPEG_MIME_TYPE.to_string(),
                data: data.into(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Citation data carried beside the reply text.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// What a transport hands back for one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct RawReply {
    pub text: String,
    pub grounding: Option<GroundingMetadata>,
}

/// Hosted model seam. `history` ends with the turn being sent.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn generate(&self, config: &SessionConfig, history: &[Content]) -> ChatResult<RawReply>;
}
