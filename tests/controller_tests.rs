//! Integration tests for the troubleshooting flow
//!
//! Drives the chat session and controller against a scripted transport.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tech_compass::ai::providers::{
    ChatTransport, Content, GroundingChunk, GroundingMetadata, Part, RawReply, SessionConfig,
    WebChunk,
};
use tech_compass::ai::{ChatError, ChatResult, CompassAI, FailureKind};
use tech_compass::controller::{
    Controller, ControllerError, ERROR_BANNER_TTL, MEDIA_DENIED_MESSAGE,
    SPEECH_UNSUPPORTED_MESSAGE, SendOutcome,
};
use tech_compass::types::{AppState, Role};

const TIMEOUT: Duration = Duration::from_millis(45_000);

enum Step {
    Reply(&'static str),
    Grounded(&'static str, &'static str),
    Api(u16, &'static str),
    Fail(&'static str),
    Slow(Duration, &'static str),
}

#[derive(Default)]
struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<Vec<Content>>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Vec<Content>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn generate(&self, _config: &SessionConfig, history: &[Content]) -> ChatResult<RawReply> {
        self.requests.lock().unwrap().push(history.to_vec());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request");
        let reply = |text: &str| RawReply {
            text: text.to_string(),
            grounding: None,
        };
        match step {
            Step::Reply(text) => Ok(reply(text)),
            Step::Grounded(text, uri) => Ok(RawReply {
                text: text.to_string(),
                grounding: Some(GroundingMetadata {
                    grounding_chunks: vec![GroundingChunk {
                        web: Some(WebChunk {
                            uri: Some(uri.to_string()),
                            title: None,
                        }),
                    }],
                }),
            }),
            Step::Api(status, message) => Err(ChatError::Api {
                status,
                message: message.to_string(),
            }),
            Step::Fail(message) => Err(ChatError::transport(message)),
            Step::Slow(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(reply(text))
            }
        }
    }
}

fn ai(transport: &Arc<ScriptedTransport>) -> CompassAI {
    let transport: Arc<dyn ChatTransport> = transport.clone();
    CompassAI::new(transport, "gemini-2.5-flash", TIMEOUT)
}

fn controller(transport: &Arc<ScriptedTransport>) -> Controller {
    Controller::new(ai(transport), 1280)
}

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_text_only_turn() {
        let transport = ScriptedTransport::new(vec![Step::Reply(
            "Is it plugged in?\nSuggestions: Yes, No, Not sure",
        )]);
        let mut session = ai(&transport).start_session();

        let reply = session.send_message("My printer is dead", None).await.unwrap();
        assert_eq!(reply.role, Role::Model);
        assert_eq!(reply.text, "Is it plugged in?");
        assert_eq!(
            reply.suggestions,
            Some(vec!["Yes".into(), "No".into(), "Not sure".into()])
        );
        assert_eq!(reply.sources, None);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], vec![Content::user(vec![Part::text("My printer is dead")])]);
        assert_eq!(session.history_len(), 2);
    }

    #[tokio::test]
    async fn test_image_turn_and_history() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply("Please share a screenshot."),
            Step::Grounded("That dialog is a driver prompt.", "https://support.example/drivers"),
        ]);
        let mut session = ai(&transport).start_session();

        session.send_message("Odd popup", None).await.unwrap();
        let reply = session.send_message("Here", Some("QUJD")).await.unwrap();
        assert_eq!(reply.sources.as_ref().unwrap()[0].title, "https://support.example/drivers");

        let requests = transport.requests();
        let second = &requests[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1], Content::model("Please share a screenshot."));
        assert_eq!(
            second[2],
            Content::user(vec![Part::text("Here"), Part::jpeg("QUJD")])
        );
        assert_eq!(session.history_len(), 4);
    }

    #[tokio::test]
    async fn test_failure_is_returned_unclassified_and_not_committed() {
        let transport = ScriptedTransport::new(vec![Step::Api(503, "UNAVAILABLE: overloaded")]);
        let mut session = ai(&transport).start_session();

        let err = session.send_message("hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::Api { status: 503, .. }));
        assert_eq!(session.history_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_is_discarded() {
        let transport = ScriptedTransport::new(vec![
            Step::Slow(Duration::from_millis(50_000), "too late"),
            Step::Reply("on time"),
        ]);
        let mut session = ai(&transport).start_session();

        let err = session.send_message("first", None).await.unwrap_err();
        assert!(matches!(err, ChatError::Timeout));
        assert_eq!(session.history_len(), 0);

        let reply = session.send_message("second", None).await.unwrap();
        assert_eq!(reply.text, "on time");
        // The abandoned turn never reaches the model's history.
        assert_eq!(transport.requests()[1].len(), 1);
    }
}

mod controller_tests {
    use super::*;

    #[tokio::test]
    async fn test_start_troubleshooting_happy_path() {
        let transport =
            ScriptedTransport::new(vec![Step::Reply("Is the light blinking?\nSuggestions: Yes, No")]);
        let mut controller = controller(&transport);
        assert_eq!(controller.state(), AppState::Idle);
        assert!(!controller.has_session());

        let outcome = controller
            .start_troubleshooting("  My wifi is down  ")
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(controller.state(), AppState::Troubleshooting);
        assert!(controller.has_session());
        assert!(!controller.is_busy());

        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].text, "My wifi is down");
        assert_eq!(transcript[1].text, "Is the light blinking?");
        assert_eq!(
            controller.last_suggestions(),
            Some(&["Yes".to_string(), "No".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_send_while_busy_is_rejected() {
        let transport = ScriptedTransport::new(vec![Step::Reply("First answer")]);
        let mut controller = controller(&transport);

        let pending = controller.begin_send("first", None).unwrap();
        assert!(controller.is_busy());
        assert_eq!(controller.state(), AppState::Analyzing);
        assert_eq!(controller.last_suggestions(), None);
        assert_eq!(controller.transcript().len(), 1);

        let rejected = controller.begin_send("second", None);
        assert!(matches!(rejected, Err(ControllerError::Busy)));
        let rejected = controller.begin_troubleshooting("new problem");
        assert!(matches!(rejected, Err(ControllerError::Busy)));
        assert_eq!(controller.transcript().len(), 1);

        let outcome = controller.finish_send(pending.run().await);
        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);

        assert!(matches!(
            controller.begin_send("   ", None),
            Err(ControllerError::EmptyMessage)
        ));
        assert!(matches!(
            controller.begin_troubleshooting(""),
            Err(ControllerError::EmptyMessage)
        ));
        assert!(controller.transcript().is_empty());
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_image_only_message_is_allowed() {
        let transport = ScriptedTransport::new(vec![Step::Reply("I see a printer queue.")]);
        let mut controller = controller(&transport);

        let outcome = controller
            .send_message("", Some("QUJD".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(controller.transcript()[0].image_base64.as_deref(), Some("QUJD"));
    }

    #[tokio::test]
    async fn test_failure_is_recorded_inline_and_in_banner() {
        let transport = ScriptedTransport::new(vec![
            Step::Fail("connection reset by peer"),
            Step::Reply("Let's try again."),
        ]);
        let mut controller = controller(&transport);

        let outcome = controller.start_troubleshooting("Slow computer").await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed(FailureKind::Generic));
        assert_eq!(controller.state(), AppState::Error);
        assert_eq!(
            controller.error(),
            Some("The assistant is having trouble responding. Please try again in a moment.")
        );
        let last = controller.transcript().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(
            last.text,
            "Sorry, I encountered an error. The assistant is having trouble responding. Please try again in a moment."
        );
        assert!(!controller.is_busy());

        let outcome = controller.send_follow_up("retry").await.unwrap();
        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(controller.state(), AppState::Troubleshooting);
        assert_eq!(controller.error(), None);
        assert_eq!(controller.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_permission_denied_message() {
        let transport = ScriptedTransport::new(vec![Step::Api(
            403,
            "PERMISSION_DENIED: API key not valid",
        )]);
        let mut controller = controller(&transport);

        let outcome = controller.start_troubleshooting("Printer").await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed(FailureKind::PermissionDenied));
        assert!(controller.error().unwrap().contains("Permission Denied"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_message() {
        let transport = ScriptedTransport::new(vec![Step::Slow(
            Duration::from_millis(50_000),
            "late",
        )]);
        let mut controller = controller(&transport);

        let outcome = controller.start_troubleshooting("Frozen screen").await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed(FailureKind::Timeout));
        assert_eq!(
            controller.error(),
            Some("The assistant is taking too long to respond. Please try again.")
        );
        assert_eq!(controller.transcript().len(), 2);
        assert!(controller.transcript().iter().all(|m| m.text != "late"));
    }

    #[tokio::test]
    async fn test_end_session_resets_everything() {
        let transport = ScriptedTransport::new(vec![Step::Fail("boom")]);
        let mut controller = controller(&transport);

        controller.start_troubleshooting("Files vanished").await.unwrap();
        controller.attach_image("QUJD".to_string());
        assert!(controller.error().is_some());
        assert!(controller.has_session());

        controller.end_session();
        assert_eq!(controller.state(), AppState::Idle);
        assert!(controller.transcript().is_empty());
        assert!(!controller.has_session());
        assert!(!controller.is_busy());
        assert_eq!(controller.error(), None);
        assert_eq!(controller.attached_image(), None);
    }

    #[tokio::test]
    async fn test_reply_after_end_session_is_discarded() {
        let transport = ScriptedTransport::new(vec![Step::Reply("stale"), Step::Reply("fresh")]);
        let mut controller = controller(&transport);

        let pending = controller.begin_troubleshooting("Old problem").unwrap();
        controller.end_session();

        let outcome = controller.finish_send(pending.run().await);
        assert_eq!(outcome, SendOutcome::Discarded);
        assert!(controller.transcript().is_empty());
        assert!(!controller.has_session());
        assert_eq!(controller.state(), AppState::Idle);

        controller.start_troubleshooting("New problem").await.unwrap();
        let texts: Vec<_> = controller.transcript().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["New problem", "fresh"]);
        // The fresh flow starts from an empty history.
        assert_eq!(transport.requests()[1].len(), 1);
    }

    #[tokio::test]
    async fn test_follow_up_consumes_attachment() {
        let transport = ScriptedTransport::new(vec![Step::Reply("Thanks, I see it.")]);
        let mut controller = controller(&transport);

        controller.attach_image("SU1H".to_string());
        controller.send_follow_up("Here is my screen").await.unwrap();
        assert_eq!(controller.attached_image(), None);

        let request = &transport.requests()[0];
        assert_eq!(
            request[0],
            Content::user(vec![Part::text("Here is my screen"), Part::jpeg("SU1H")])
        );
    }

    #[test]
    fn test_error_banner_expires() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);

        controller.set_error("Something odd");
        let now = Instant::now();
        assert!(!controller.dismiss_expired_error(now));
        assert_eq!(controller.error(), Some("Something odd"));

        assert!(controller.error_expired(now + ERROR_BANNER_TTL));
        assert!(controller.dismiss_expired_error(now + ERROR_BANNER_TTL));
        assert_eq!(controller.error(), None);
    }
}

mod screenshot_tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tech_compass::capture::{
        CaptureError, FrameSource, MediaStream, ScreenShare, StillFrame, UnsupportedScreenShare,
    };

    struct StillShare {
        frame: RgbaImage,
        stopped: Arc<AtomicBool>,
    }

    struct StillStream {
        frame: StillFrame,
        stopped: Arc<AtomicBool>,
    }

    impl FrameSource for StillStream {
        fn natural_size(&self) -> (u32, u32) {
            self.frame.natural_size()
        }

        fn draw(&self) -> Option<RgbaImage> {
            self.frame.draw()
        }
    }

    impl MediaStream for StillStream {
        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ScreenShare for StillShare {
        async fn request_stream(&self) -> Result<Box<dyn MediaStream>, CaptureError> {
            Ok(Box::new(StillStream {
                frame: StillFrame::new(self.frame.clone()),
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_attaches_image() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);
        let share = StillShare {
            frame: RgbaImage::from_pixel(1600, 900, Rgba([9, 9, 9, 255])),
            stopped: Arc::new(AtomicBool::new(false)),
        };

        let shot = controller.capture_screenshot(&share).await;
        assert!(shot.is_some());
        assert_eq!(controller.attached_image(), shot.as_deref());
        assert!(share.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_share_is_advisory_only() {
        let transport = ScriptedTransport::new(vec![Step::Reply("Text-only works too.")]);
        let mut controller = controller(&transport);
        controller.start_troubleshooting("Screen flickers").await.unwrap();

        let shot = controller.capture_screenshot(&UnsupportedScreenShare).await;
        assert_eq!(shot, None);
        assert_eq!(controller.error(), Some(MEDIA_DENIED_MESSAGE));
        assert_eq!(controller.state(), AppState::Troubleshooting);
        assert!(controller.has_session());
        assert_eq!(controller.transcript().len(), 2);
    }
}

mod speech_tests {
    use super::*;
    use tech_compass::speech::{
        NoSpeech, SpeechError, SpeechEvent, SpeechEventSender, SpeechRecognizer, speech_channel,
    };

    #[derive(Default)]
    struct FakeRecognizer {
        events: Option<SpeechEventSender>,
        fail_with: Option<&'static str>,
    }

    impl FakeRecognizer {
        fn running(&self) -> bool {
            self.events.is_some()
        }

        /// Finish the session with one final transcript.
        fn hear(&mut self, text: &str) {
            let events = self.events.take().expect("recognizer not started");
            events.send(SpeechEvent::Result(text.to_string())).unwrap();
            events.send(SpeechEvent::Ended).unwrap();
        }
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_supported(&self) -> bool {
            true
        }

        fn start(&mut self, events: SpeechEventSender) -> Result<(), SpeechError> {
            if let Some(code) = self.fail_with {
                return Err(SpeechError::Recognition(code.to_string()));
            }
            events.send(SpeechEvent::Started).unwrap();
            self.events = Some(events);
            Ok(())
        }

        fn stop(&mut self) {
            self.events = None;
        }
    }

    #[test]
    fn test_toggle_starts_and_stops() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);
        let mut recognizer = FakeRecognizer::default();

        controller.toggle_listening(&mut recognizer, speech_channel().0);
        assert!(controller.is_listening());
        assert!(recognizer.running());

        controller.toggle_listening(&mut recognizer, speech_channel().0);
        assert!(!controller.is_listening());
        assert!(!recognizer.running());
    }

    #[tokio::test]
    async fn test_transcript_arrives_through_channel() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);
        let mut recognizer = FakeRecognizer::default();
        let (events, mut received) = speech_channel();

        controller.toggle_listening(&mut recognizer, events);
        recognizer.hear("my printer says offline");

        let mut heard = Vec::new();
        while let Some(event) = received.recv().await {
            heard.extend(controller.handle_speech_event(event));
        }
        assert_eq!(heard, vec!["my printer says offline".to_string()]);
        assert!(!controller.is_listening());
    }

    #[test]
    fn test_unsupported_recognizer_sets_advisory() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);

        controller.toggle_listening(&mut NoSpeech, speech_channel().0);
        assert!(!controller.is_listening());
        assert_eq!(controller.error(), Some(SPEECH_UNSUPPORTED_MESSAGE));
    }

    #[test]
    fn test_start_failure_sets_advisory() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);
        let mut recognizer = FakeRecognizer {
            fail_with: Some("audio-capture"),
            ..Default::default()
        };

        controller.toggle_listening(&mut recognizer, speech_channel().0);
        assert!(!controller.is_listening());
        assert_eq!(
            controller.error(),
            Some("Speech recognition error: audio-capture")
        );
    }

    #[test]
    fn test_events() {
        let transport = ScriptedTransport::new(vec![]);
        let mut controller = controller(&transport);

        assert_eq!(controller.handle_speech_event(SpeechEvent::Started), None);
        assert!(controller.is_listening());
        assert_eq!(
            controller.handle_speech_event(SpeechEvent::Result("my mouse is frozen".into())),
            Some("my mouse is frozen".to_string())
        );
        assert_eq!(
            controller.handle_speech_event(SpeechEvent::Error("no-speech".into())),
            None
        );
        assert_eq!(controller.error(), Some("Speech recognition error: no-speech"));
        assert_eq!(controller.handle_speech_event(SpeechEvent::Ended), None);
        assert!(!controller.is_listening());
        assert_eq!(controller.state(), AppState::Idle);
    }
}
