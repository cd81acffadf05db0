use std::fmt;

// ============================================
// Error Types
// ============================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The response bound elapsed before the model answered.
    #[error("timeout")]
    Timeout,

    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("model returned no text")]
    EmptyReply,

    #[error("{0}")]
    Transport(String),
}

impl ChatError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

// ============================================
// Failure classification for display
// ============================================

const PERMISSION_MARKERS: &[&str] = &["PERMISSION_DENIED", "403"];

/// User-facing bucket for a failed model turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    PermissionDenied,
    Generic,
}

impl FailureKind {
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::Timeout => {
                "The assistant is taking too long to respond. Please try again."
            }
            FailureKind::PermissionDenied => {
                "Could not connect to the AI assistant. There might be an issue with the application configuration (Permission Denied)."
            }
            FailureKind::Generic => {
                "The assistant is having trouble responding. Please try again in a moment."
            }
        }
    }

    /// Text of the synthetic model turn appended to the transcript.
    pub fn transcript_text(self) -> String {
        format!("Sorry, I encountered an error. {}", self.user_message())
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

/// Permission detection is a substring match on the error text.
pub fn classify(err: &ChatError) -> FailureKind {
    if matches!(err, ChatError::Timeout) {
        return FailureKind::Timeout;
    }
    let text = err.to_string();
    if PERMISSION_MARKERS.iter().any(|marker| text.contains(marker)) {
        FailureKind::PermissionDenied
    } else {
        FailureKind::Generic
    }
}
