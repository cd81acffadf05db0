use crate::capture::{SETTLE_DELAY, ScreenShare, capture_screenshot, platform_share};
use crate::controller::{Controller, ControllerError, PendingSend, SendOutcome};
use crate::speech::{NoSpeech, SpeechRecognizer, speech_channel};
use crate::types::{AppState, ChatMessage, Role};
use crate::views::shared::{format_message_timestamp, jpeg_data_uri, schedule_error_dismiss};
use dioxus::events::Key;
use dioxus::prelude::*;
use std::sync::Arc;

const PROBLEM_CATEGORIES: &[&str] = &[
    "Internet / Wi-Fi",
    "Printers & Scanners",
    "Files & Documents",
    "Slow Computer",
];

type Recognizer = Signal<Box<dyn SpeechRecognizer>>;

/// Run an admitted send in the background and record its result.
///
/// The task is owned by the root scope: admitting the first turn swaps the
/// problem form for the wizard, and the reply must outlive that switch.
fn dispatch(controller: Signal<Controller>, pending: Result<PendingSend, ControllerError>) {
    let mut controller = controller;
    match pending {
        Ok(pending) => {
            spawn_forever(async move {
                let completed = pending.run().await;
                let outcome = controller.with_mut(|c| c.finish_send(completed));
                if matches!(outcome, SendOutcome::Failed(_)) {
                    schedule_error_dismiss(controller);
                }
            });
        }
        Err(err) => tracing::debug!(error = %err, "send not admitted"),
    }
}

/// Start or stop voice input; a recognized transcript replaces `target`.
fn toggle_voice(controller: Signal<Controller>, recognizer: Recognizer, target: Signal<String>) {
    let mut controller = controller;
    let mut recognizer = recognizer;
    let mut target = target;
    let (events, mut received) = speech_channel();
    controller.with_mut(|c| recognizer.with_mut(|r| c.toggle_listening(r.as_mut(), events)));
    if controller.read().error().is_some() {
        schedule_error_dismiss(controller);
    }
    if !controller.read().is_listening() {
        return;
    }

    spawn(async move {
        while let Some(event) = received.recv().await {
            if let Some(text) = controller.with_mut(|c| c.handle_speech_event(event)) {
                target.set(text);
            }
            if controller.read().error().is_some() {
                schedule_error_dismiss(controller);
            }
        }
    });
}

fn mic_class(listening: bool) -> &'static str {
    if listening { "mic-btn listening" } else { "mic-btn" }
}

#[component]
pub fn TroubleshootView(controller: Signal<Controller>) -> Element {
    let recognizer: Recognizer = use_signal(|| Box::new(NoSpeech) as Box<dyn SpeechRecognizer>);

    if controller.read().state() == AppState::Idle {
        rsx! { ProblemInput { controller, recognizer } }
    } else {
        rsx! { WizardInterface { controller, recognizer } }
    }
}

#[component]
fn ProblemInput(controller: Signal<Controller>, recognizer: Recognizer) -> Element {
    let mut controller = controller;
    let mut description = use_signal(String::new);
    let mut show_other_input = use_signal(|| false);
    let speech_supported = recognizer.read().is_supported();
    let mic_class = mic_class(controller.read().is_listening());

    let mut start = move |text: String| {
        let pending = controller.with_mut(|c| c.begin_troubleshooting(&text));
        dispatch(controller, pending);
    };

    rsx! {
        div { class: "problem-input",
            h2 { class: "section-title", "How can I help you today?" }
            p { class: "text-muted", "Get immediate AI assistance with your computer problem." }

            if !show_other_input() {
                button {
                    class: "btn btn-primary btn-wide",
                    r#type: "button",
                    onclick: move |_| show_other_input.set(true),
                    "Describe Your Problem"
                }
                div { class: "category-grid",
                    for category in PROBLEM_CATEGORIES.iter().copied() {
                        button {
                            key: "{category}",
                            class: "category-card",
                            r#type: "button",
                            onclick: move |_| start(format!("I'm having a problem with: {category}")),
                            "{category}"
                        }
                    }
                }
            } else {
                div { class: "describe-form",
                    textarea {
                        rows: "5",
                        placeholder: "For example: 'My computer is making a strange noise and running very slow.'",
                        aria_label: "Describe your problem",
                        value: "{description}",
                        oninput: move |ev| description.set(ev.value()),
                    }
                    if speech_supported {
                        button {
                            class: mic_class,
                            r#type: "button",
                            title: "Use voice input",
                            onclick: move |_| toggle_voice(controller, recognizer, description),
                            "Mic"
                        }
                    }
                    div { class: "hstack",
                        button {
                            class: "btn",
                            r#type: "button",
                            onclick: move |_| show_other_input.set(false),
                            "Back"
                        }
                        button {
                            class: "btn btn-primary",
                            r#type: "button",
                            disabled: description().trim().is_empty(),
                            onclick: move |_| start(description()),
                            "Start Troubleshooting"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn WizardInterface(controller: Signal<Controller>, recognizer: Recognizer) -> Element {
    let mut controller = controller;
    let mut input = use_signal(String::new);
    let share = use_hook(|| Arc::<dyn ScreenShare>::from(platform_share()));
    let speech_supported = recognizer.read().is_supported();
    let capture_supported = share.is_supported();

    let (transcript, suggestions, error, attached, analyzing, listening) = {
        let c = controller.read();
        (
            c.transcript().to_vec(),
            c.last_suggestions().map(<[String]>::to_vec),
            c.error().map(str::to_string),
            c.attached_image().map(str::to_string),
            c.state() == AppState::Analyzing,
            c.is_listening(),
        )
    };
    let mic_class = mic_class(listening);
    let can_send = !analyzing && (!input().trim().is_empty() || attached.is_some());

    let mut send_text = move |text: String| {
        let pending = controller.with_mut(|c| c.begin_follow_up(&text));
        if pending.is_ok() {
            input.set(String::new());
        }
        dispatch(controller, pending);
    };

    let attach_screenshot = move |_: MouseEvent| {
        let mut controller = controller;
        let share = Arc::clone(&share);
        let max_width = controller.read().capture_max_width();
        spawn(async move {
            let result = capture_screenshot(share.as_ref(), SETTLE_DELAY, max_width).await;
            let attached = controller.with_mut(|c| c.record_screenshot(result));
            if attached.is_none() && controller.read().error().is_some() {
                schedule_error_dismiss(controller);
            }
        });
    };

    rsx! {
        div { class: "wizard",
            div { class: "wizard-header",
                h2 { class: "section-title", "AI Troubleshooter" }
                button {
                    class: "link-btn",
                    r#type: "button",
                    onclick: move |_| controller.with_mut(|c| c.end_session()),
                    "End Session"
                }
            }

            if let Some(message) = error {
                div { class: "error-banner", role: "alert", "{message}" }
            }

            div { class: "chat-list",
                for (i, msg) in transcript.into_iter().enumerate() {
                    MessageBubble { key: "{i}", message: msg }
                }
                if analyzing {
                    div { class: "message-row model",
                        div { class: "shimmer-line", span { class: "shimmer-text", "Analyzing…" } }
                    }
                }
            }

            div { class: "composer",
                if let Some(choices) = suggestions {
                    div { class: "suggestion-grid",
                        for (i, (label, choice)) in choices.into_iter().map(|c| (c.clone(), c)).enumerate() {
                            button {
                                key: "{i}",
                                class: "suggestion-btn",
                                r#type: "button",
                                onclick: move |_| send_text(choice.clone()),
                                "{label}"
                            }
                        }
                    }
                }

                if let Some(image) = attached {
                    div { class: "attachment-preview",
                        img { src: jpeg_data_uri(&image), alt: "Attached screenshot preview" }
                        button {
                            class: "attachment-remove",
                            r#type: "button",
                            onclick: move |_| controller.with_mut(|c| c.remove_attachment()),
                            "×"
                        }
                    }
                }

                div { class: "hstack",
                    textarea {
                        rows: "1",
                        placeholder: "Type your response...",
                        aria_label: "Chat message input",
                        value: "{input}",
                        disabled: analyzing,
                        oninput: move |ev| input.set(ev.value()),
                        onkeydown: move |ev| {
                            if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                ev.prevent_default();
                                send_text(input());
                            }
                        },
                    }
                    if speech_supported {
                        button {
                            class: mic_class,
                            r#type: "button",
                            title: "Use voice input",
                            onclick: move |_| toggle_voice(controller, recognizer, input),
                            "Mic"
                        }
                    }
                    if capture_supported {
                        button {
                            class: "btn",
                            r#type: "button",
                            title: "Attach screenshot",
                            disabled: analyzing,
                            onclick: attach_screenshot,
                            "Screenshot"
                        }
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: !can_send,
                        onclick: move |_| send_text(input()),
                        "Send"
                    }
                }
            }
        }
    }
}

#[component]
fn MessageBubble(message: ChatMessage) -> Element {
    let role_class = match message.role {
        Role::User => "user",
        Role::Model => "model",
    };
    let timestamp = format_message_timestamp(message.created_at);

    rsx! {
        div { class: "message-row {role_class}",
            div { class: "bubble {role_class}",
                p { class: "bubble-text", "{message.text}" }
                if let Some(image) = message.image_base64.as_deref() {
                    img { class: "bubble-image", src: jpeg_data_uri(image), alt: "User screenshot" }
                }
                if let Some(sources) = message.sources.as_ref() {
                    div { class: "bubble-sources",
                        h4 { "Sources:" }
                        for source in sources.iter() {
                            a {
                                key: "{source.uri}",
                                href: "{source.uri}",
                                target: "_blank",
                                rel: "noopener noreferrer",
                                "{source.title}"
                            }
                        }
                    }
                }
            }
            if let Some(ts) = timestamp {
                div { class: "message-meta", span { class: "message-timestamp", "{ts}" } }
            }
        }
    }
}
