use super::{ChatTransport, Content, GroundingMetadata, RawReply, SessionConfig};
use crate::ai::error::{ChatError, ChatResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// REST client for the Gemini `generateContent` endpoint
pub struct GeminiTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

// Gemini request types
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    system_instruction: SystemInstruction<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

// Gemini response types
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

impl GeminiTransport {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl ChatTransport for GeminiTransport {
    async fn generate(&self, config: &SessionConfig, history: &[Content]) -> ChatResult<RawReply> {
        let body = build_request(config, history);
        tracing::debug!(model = %config.model, turns = history.len(), "sending Gemini request");

        let response = self
            .client
            .post(self.url(&config.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(map_http_error(status, &body_text));
        }

        parse_response(&body_text)
    }
}

fn build_request<'a>(
    config: &'a SessionConfig,
    history: &'a [Content],
) -> GenerateContentRequest<'a> {
    let tools = if config.web_search {
        vec![Tool {
            google_search: GoogleSearch {},
        }]
    } else {
        Vec::new()
    };

    GenerateContentRequest {
        contents: history,
        system_instruction: SystemInstruction {
            parts: [TextPart {
                text: &config.system_instruction,
            }],
        },
        tools,
    }
}

/// Concatenate the first candidate's text parts and lift its grounding metadata.
fn parse_response(body: &str) -> ChatResult<RawReply> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)?;
    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or(ChatError::EmptyReply)?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ChatError::EmptyReply);
    }

    Ok(RawReply {
        text,
        grounding: candidate.grounding_metadata,
    })
}

/// Keep both the numeric status and the provider status string in the message.
fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| {
            let status_text = envelope.error.status.unwrap_or_default();
            let msg = envelope.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    ChatError::Api {
        status: status.as_u16(),
        message,
    }
}
