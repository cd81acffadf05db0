//! Voice input boundary.
//!
//! Recognition engines live outside this crate; they report through
//! [`SpeechEvent`]s sent on the channel handed to [`SpeechRecognizer::start`].

use tokio::sync::mpsc;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech recognition is not supported")]
    Unsupported,

    #[error("speech recognition error: {0}")]
    Recognition(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    /// Final transcript of one recognition session.
    Result(String),
    /// Engine error code, e.g. `not-allowed` or `no-speech`.
    Error(String),
    Ended,
}

pub type SpeechEventSender = mpsc::UnboundedSender<SpeechEvent>;
pub type SpeechEventReceiver = mpsc::UnboundedReceiver<SpeechEvent>;

pub fn speech_channel() -> (SpeechEventSender, SpeechEventReceiver) {
    mpsc::unbounded_channel()
}

pub trait SpeechRecognizer {
    fn is_supported(&self) -> bool;

    /// Begin one recognition session. The engine drops `events` once it
    /// has sent [`SpeechEvent::Ended`].
    fn start(&mut self, events: SpeechEventSender) -> Result<(), SpeechError>;

    fn stop(&mut self);
}

/// Recognizer for platforms without a speech engine.
#[derive(Debug, Default)]
pub struct NoSpeech;

impl SpeechRecognizer for NoSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _events: SpeechEventSender) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) {}
}
