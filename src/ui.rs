use crate::config::AppConfig;
use crate::controller::Controller;
use crate::views::TroubleshootView;
use dioxus::prelude::*;

const COMPASS_CSS: Asset = asset!("/assets/compass.css");

#[component]
pub fn App() -> Element {
    let config = use_context::<AppConfig>();
    let controller = use_signal(move || Controller::from_config(&config));

    rsx! {
        document::Link { rel: "stylesheet", href: COMPASS_CSS }
        AppHeader { controller }
        main { class: "main-container",
            TroubleshootView { controller }
        }
    }
}

#[component]
fn AppHeader(controller: Signal<Controller>) -> Element {
    let mut controller = controller;
    rsx! {
        div { class: "header",
            button {
                class: "header-home",
                r#type: "button",
                aria_label: "Go to Home Screen",
                onclick: move |_| controller.with_mut(|c| c.end_session()),
                h1 { class: "header-title", "Tech Compass" }
                p { class: "header-subtitle", "Your AI Ally" }
            }
        }
    }
}
