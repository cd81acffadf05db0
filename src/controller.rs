//! Troubleshooting flow state.
//!
//! All view state lives in [`Controller`] and changes only through its
//! methods. Sends are split into `begin_*` / [`PendingSend::run`] /
//! [`Controller::finish_send`] so a UI can await the network call without
//! holding the state; the `send_*` helpers chain the three.

use crate::ai::{ChatResult, ChatSession, CompassAI, FailureKind, classify};
use crate::capture::{self, CaptureError, SETTLE_DELAY, ScreenShare};
use crate::config::AppConfig;
use crate::speech::{SpeechError, SpeechEvent, SpeechEventSender, SpeechRecognizer};
use crate::types::{AppState, ChatMessage};
use std::time::{Duration, Instant};

pub const ERROR_BANNER_TTL: Duration = Duration::from_secs(5);

pub const MEDIA_DENIED_MESSAGE: &str =
    "Screen sharing was blocked or failed. You can continue with a text-only chat.";
pub const SPEECH_UNSUPPORTED_MESSAGE: &str = "Speech recognition is not supported on this device.";

#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("a message is already being sent")]
    Busy,

    #[error("nothing to send")]
    EmptyMessage,
}

/// Transient advisory shown above the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    raised_at: Instant,
}

impl ErrorBanner {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= ERROR_BANNER_TTL
    }
}

/// A send that has been admitted and recorded but not yet answered.
pub struct PendingSend {
    session: ChatSession,
    text: String,
    image_base64: Option<String>,
    generation: u64,
}

impl PendingSend {
    pub async fn run(mut self) -> CompletedSend {
        let result = self
            .session
            .send_message(&self.text, self.image_base64.as_deref())
            .await;
        CompletedSend {
            session: self.session,
            result,
            generation: self.generation,
        }
    }
}

pub struct CompletedSend {
    session: ChatSession,
    result: ChatResult<ChatMessage>,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Replied,
    Failed(FailureKind),
    /// The flow ended while the reply was in flight; nothing was recorded.
    Discarded,
}

pub struct Controller {
    ai: CompassAI,
    capture_max_width: u32,
    state: AppState,
    transcript: Vec<ChatMessage>,
    session: Option<ChatSession>,
    busy: bool,
    error: Option<ErrorBanner>,
    attached_image: Option<String>,
    listening: bool,
    generation: u64,
}

impl Controller {
    pub fn new(ai: CompassAI, capture_max_width: u32) -> Self {
        Self {
            ai,
            capture_max_width,
            state: AppState::Idle,
            transcript: Vec::new(),
            session: None,
            busy: false,
            error: None,
            attached_image: None,
            listening: false,
            generation: 0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(CompassAI::from_config(config), config.capture_max_width)
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|banner| banner.message.as_str())
    }

    pub fn attached_image(&self) -> Option<&str> {
        self.attached_image.as_deref()
    }

    pub fn capture_max_width(&self) -> u32 {
        self.capture_max_width
    }

    /// Quick replies offered by the latest model turn, hidden while analyzing.
    pub fn last_suggestions(&self) -> Option<&[String]> {
        if self.state == AppState::Analyzing {
            return None;
        }
        self.transcript
            .iter()
            .rev()
            .find(|msg| msg.is_model())
            .and_then(|msg| msg.suggestions.as_deref())
    }

    // ---------------
    // Session lifecycle
    // ---------------

    /// Reset the flow and send `description` as its first turn.
    pub fn begin_troubleshooting(&mut self, description: &str) -> Result<PendingSend, ControllerError> {
        if self.busy {
            return Err(ControllerError::Busy);
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(ControllerError::EmptyMessage);
        }
        tracing::info!("starting new troubleshooting session");
        self.end_session();
        self.begin_send(description, None)
    }

    /// Send the composer text together with any attached screenshot.
    pub fn begin_follow_up(&mut self, text: &str) -> Result<PendingSend, ControllerError> {
        let image = self.attached_image.clone();
        let pending = self.begin_send(text, image)?;
        self.attached_image = None;
        Ok(pending)
    }

    /// Admit one outbound turn: record it in the transcript and lend the
    /// session handle (created on first use) to the returned [`PendingSend`].
    pub fn begin_send(
        &mut self,
        text: &str,
        image_base64: Option<String>,
    ) -> Result<PendingSend, ControllerError> {
        if self.busy {
            tracing::debug!("rejecting send while another is in flight");
            return Err(ControllerError::Busy);
        }
        if text.trim().is_empty() && image_base64.is_none() {
            return Err(ControllerError::EmptyMessage);
        }

        let session = match self.session.take() {
            Some(session) => session,
            None => self.ai.start_session(),
        };

        self.busy = true;
        self.error = None;
        self.state = AppState::Analyzing;
        self.transcript
            .push(ChatMessage::user(text, image_base64.clone()));

        Ok(PendingSend {
            session,
            text: text.to_string(),
            image_base64,
            generation: self.generation,
        })
    }

    /// Record the result of a [`PendingSend`]. Results from a flow that has
    /// since ended are dropped.
    pub fn finish_send(&mut self, completed: CompletedSend) -> SendOutcome {
        if completed.generation != self.generation {
            tracing::warn!("discarding reply for an ended session");
            return SendOutcome::Discarded;
        }

        self.session = Some(completed.session);
        self.busy = false;

        match completed.result {
            Ok(reply) => {
                self.transcript.push(reply);
                self.state = AppState::Troubleshooting;
                SendOutcome::Replied
            }
            Err(err) => {
                let kind = classify(&err);
                tracing::warn!(error = %err, ?kind, "model request failed");
                self.error = Some(ErrorBanner::new(kind.user_message()));
                self.transcript.push(ChatMessage::model(kind.transcript_text()));
                self.state = AppState::Error;
                SendOutcome::Failed(kind)
            }
        }
    }

    pub async fn start_troubleshooting(&mut self, description: &str) -> Result<SendOutcome, ControllerError> {
        let pending = self.begin_troubleshooting(description)?;
        Ok(self.finish_send(pending.run().await))
    }

    pub async fn send_follow_up(&mut self, text: &str) -> Result<SendOutcome, ControllerError> {
        let pending = self.begin_follow_up(text)?;
        Ok(self.finish_send(pending.run().await))
    }

    pub async fn send_message(
        &mut self,
        text: &str,
        image_base64: Option<String>,
    ) -> Result<SendOutcome, ControllerError> {
        let pending = self.begin_send(text, image_base64)?;
        Ok(self.finish_send(pending.run().await))
    }

    /// Drop the session handle and everything tied to it, and return to idle.
    pub fn end_session(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.session = None;
        self.busy = false;
        self.transcript.clear();
        self.attached_image = None;
        self.error = None;
        self.state = AppState::Idle;
    }

    // ---------------
    // Error banner
    // ---------------

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(ErrorBanner::new(message));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn error_expired(&self, now: Instant) -> bool {
        self.error
            .as_ref()
            .is_some_and(|banner| banner.is_expired(now))
    }

    /// Clear the banner if it has been up for [`ERROR_BANNER_TTL`].
    pub fn dismiss_expired_error(&mut self, now: Instant) -> bool {
        if self.error_expired(now) {
            self.error = None;
            true
        } else {
            false
        }
    }

    // ---------------
    // Screenshots
    // ---------------

    pub fn attach_image(&mut self, image_base64: String) {
        self.attached_image = Some(image_base64);
    }

    pub fn remove_attachment(&mut self) {
        self.attached_image = None;
    }

    /// Apply the result of a screen grab. Media failures leave the chat usable
    /// and only raise an advisory.
    pub fn record_screenshot(
        &mut self,
        result: Result<Option<String>, CaptureError>,
    ) -> Option<String> {
        match result {
            Ok(Some(image)) => {
                self.error = None;
                self.attached_image = Some(image.clone());
                Some(image)
            }
            Ok(None) => {
                tracing::debug!("screen share produced no frame");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "screen sharing failed");
                self.set_error(MEDIA_DENIED_MESSAGE);
                None
            }
        }
    }

    pub async fn capture_screenshot(&mut self, share: &dyn ScreenShare) -> Option<String> {
        let result =
            capture::capture_screenshot(share, SETTLE_DELAY, self.capture_max_width).await;
        self.record_screenshot(result)
    }

    // ---------------
    // Voice input
    // ---------------

    /// Start or stop voice input. A started recognizer reports on `events`;
    /// feed what arrives to [`Controller::handle_speech_event`].
    pub fn toggle_listening(
        &mut self,
        recognizer: &mut dyn SpeechRecognizer,
        events: SpeechEventSender,
    ) {
        if self.listening {
            recognizer.stop();
            self.listening = false;
            return;
        }
        if !recognizer.is_supported() {
            self.set_error(SPEECH_UNSUPPORTED_MESSAGE);
            return;
        }
        match recognizer.start(events) {
            Ok(()) => self.listening = true,
            Err(SpeechError::Unsupported) => self.set_error(SPEECH_UNSUPPORTED_MESSAGE),
            Err(SpeechError::Recognition(code)) => {
                tracing::warn!(%code, "speech recognition failed to start");
                self.set_error(format!("Speech recognition error: {code}"));
            }
        }
    }

    /// Apply a recognizer event; returns the transcript to place in the input.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) -> Option<String> {
        match event {
            SpeechEvent::Started => {
                self.listening = true;
                None
            }
            SpeechEvent::Ended => {
                self.listening = false;
                None
            }
            SpeechEvent::Result(text) => Some(text),
            SpeechEvent::Error(code) => {
                tracing::warn!(%code, "speech recognition error");
                self.set_error(format!("Speech recognition error: {code}"));
                None
            }
        }
    }
}
