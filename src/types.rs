use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A web citation attached to a grounded model reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// One turn in the visible transcript. Never mutated once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<GroundingSource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip)]
    pub created_at: Option<OffsetDateTime>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, image_base64: Option<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image_base64,
            sources: None,
            suggestions: None,
            created_at: Some(OffsetDateTime::now_utc()),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            image_base64: None,
            sources: None,
            suggestions: None,
            created_at: Some(OffsetDateTime::now_utc()),
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self.role, Role::Model)
    }
}

/// Lifecycle of the troubleshooting view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppState {
    #[default]
    Idle,
    Analyzing,
    Troubleshooting,
    Error,
}
