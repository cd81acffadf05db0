use super::frame::{FrameSource, capture_frame};
use async_trait::async_trait;
use std::time::Duration;

/// Time the platform share picker needs to get out of the way before a grab.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("screen sharing was denied: {0}")]
    Denied(String),

    #[error("screen sharing is not available on this platform")]
    Unsupported,
}

/// A granted monitor-level video stream.
pub trait MediaStream: FrameSource + Send {
    /// Stop every track of the stream.
    fn stop(&mut self);
}

/// Platform screen-share capability.
#[async_trait]
pub trait ScreenShare: Send + Sync {
    /// Whether a request can succeed at all on this platform.
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_stream(&self) -> Result<Box<dyn MediaStream>, CaptureError>;
}

/// Owns a stream for one grab and stops it on every exit path.
pub struct StreamGuard {
    stream: Box<dyn MediaStream>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &dyn MediaStream {
        &*self.stream
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stream.stop();
        tracing::debug!("screen share stopped");
    }
}

/// Acquire a stream, wait for the picker to settle, capture one frame and
/// release the stream.
///
/// `Ok(None)` means the stream was granted but produced no usable frame.
pub async fn capture_screenshot(
    share: &dyn ScreenShare,
    settle: Duration,
    max_width: u32,
) -> Result<Option<String>, CaptureError> {
    let stream = share.request_stream().await?;
    let guard = StreamGuard::new(stream);
    tokio::time::sleep(settle).await;
    Ok(capture_frame(guard.stream(), max_width))
}

/// Default capability for builds without a platform capture backend.
pub struct UnsupportedScreenShare;

#[async_trait]
impl ScreenShare for UnsupportedScreenShare {
    fn is_supported(&self) -> bool {
        false
    }

    async fn request_stream(&self) -> Result<Box<dyn MediaStream>, CaptureError> {
        Err(CaptureError::Unsupported)
    }
}

/// The screen-share backend compiled into this build.
pub fn platform_share() -> Box<dyn ScreenShare> {
    #[cfg(feature = "desktop")]
    {
        Box::new(super::monitor::MonitorShare)
    }

    #[cfg(not(feature = "desktop"))]
    {
        Box::new(UnsupportedScreenShare)
    }
}
