use super::error::ChatResult;
use super::providers::{ChatTransport, Content, GeminiTransport, Part, SessionConfig};
use super::response::to_chat_message;
use super::timeout::with_timeout;
use crate::config::AppConfig;
use crate::types::ChatMessage;
use std::sync::Arc;
use std::time::Duration;

const SYSTEM_INSTRUCTION: &str = r#"
You are an expert IT support specialist, acting as a conversational AI assistant named "Tech Compass".
Your goal is to help a non-technical user solve their computer problem through a simple, step-by-step interactive process.

Key behaviors:
- Analyze the user's problem description and any screenshot they provide.
- Ask clarifying questions to understand the issue. Provide only one question at a time.
- Provide simple, step-by-step instructions. Give only ONE clear, actionable step at a time.
- Wait for the user to respond after you give an instruction.
- Keep your responses very concise, friendly, and easy to understand. Use simple language.
- When you ask a question (e.g., "Is the light blinking?"), you MUST provide short, common answers as suggestions that can be displayed as buttons.
- To provide suggestions, add a new line at the very end of your response starting with "Suggestions:" followed by a comma-separated list.
- Example format:
  Is the printer turned on?
  Suggestions: Yes, No, I'm not sure
- Only provide suggestions when you are asking a direct question.
- If you need a visual, ask the user to "Please share a screenshot."
- End the conversation by confirming if the issue is resolved.
"#;

/// Entry point for troubleshooting chats against the hosted model
#[derive(Clone)]
pub struct CompassAI {
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
    timeout: Duration,
}

impl CompassAI {
    /// Create the Gemini-backed client from loaded configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let transport = GeminiTransport::new(&config.endpoint, &config.api_key);
        Self::new(Arc::new(transport), &config.model, config.request_timeout)
    }

    pub fn new(transport: Arc<dyn ChatTransport>, model: &str, timeout: Duration) -> Self {
        Self {
            transport,
            config: SessionConfig {
                model: model.to_string(),
                system_instruction: Self::system_instruction().to_string(),
                web_search: true,
            },
            timeout,
        }
    }

    /// Get the system instruction for Tech Compass
    pub fn system_instruction() -> &'static str {
        SYSTEM_INSTRUCTION.trim()
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a new conversation bound to this client's configuration.
    pub fn start_session(&self) -> ChatSession {
        tracing::debug!(model = %self.config.model, "starting chat session");
        ChatSession {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            timeout: self.timeout,
            history: Vec::new(),
        }
    }
}

/// One conversation with the model. Holds the multi-turn history.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
    timeout: Duration,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of turns (user and model) committed so far.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Send one user turn and build the model's transcript entry.
    ///
    /// The turn is committed to history only when a reply arrives in time; a
    /// failure or timeout leaves the session exactly as it was and is returned
    /// unclassified.
    pub async fn send_message(
        &mut self,
        text: &str,
        image_base64: Option<&str>,
    ) -> ChatResult<ChatMessage> {
        let mut parts = vec![Part::text(text)];
        if let Some(data) = image_base64 {
            parts.push(Part::jpeg(data));
        }

        let mut request = self.history.clone();
        request.push(Content::user(parts));

        let reply = with_timeout(
            self.transport.generate(&self.config, &request),
            self.timeout,
        )
        .await?;

        request.push(Content::model(reply.text.clone()));
        self.history = request;

        Ok(to_chat_message(&reply))
    }
}
