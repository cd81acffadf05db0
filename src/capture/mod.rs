//! Screenshot capture for attaching to a chat turn.

mod frame;
#[cfg(feature = "desktop")]
mod monitor;
mod screen;

pub use frame::{FrameSource, JPEG_QUALITY, StillFrame, capture_frame, scaled_dimensions};
#[cfg(feature = "desktop")]
pub use monitor::MonitorShare;
pub use screen::{
    CaptureError, MediaStream, SETTLE_DELAY, ScreenShare, StreamGuard, UnsupportedScreenShare,
    capture_screenshot, platform_share,
};
