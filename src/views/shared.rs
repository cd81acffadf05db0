use crate::controller::Controller;
use dioxus::prelude::*;
use std::time::Instant;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

pub fn format_message_timestamp(timestamp: Option<OffsetDateTime>) -> Option<String> {
    let mut datetime = timestamp?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

pub fn jpeg_data_uri(image_base64: &str) -> String {
    format!("data:image/jpeg;base64,{image_base64}")
}

/// Clear the error banner once its time-to-live has passed.
pub fn schedule_error_dismiss(controller: Signal<Controller>) {
    let mut controller = controller;
    spawn_forever(async move {
        tokio::time::sleep(crate::controller::ERROR_BANNER_TTL).await;
        controller.with_mut(|c| c.dismiss_expired_error(Instant::now()));
    });
}
