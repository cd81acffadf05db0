use super::frame::FrameSource;
use super::screen::{CaptureError, MediaStream, ScreenShare};
use async_trait::async_trait;
use image::RgbaImage;
use xcap::Monitor;

/// Shares the primary monitor through `xcap`.
pub struct MonitorShare;

fn primary_monitor() -> Result<Monitor, CaptureError> {
    let monitors = Monitor::all().map_err(|err| CaptureError::Denied(err.to_string()))?;
    let mut fallback = None;
    for monitor in monitors {
        if monitor.is_primary().unwrap_or(false) {
            return Ok(monitor);
        }
        fallback.get_or_insert(monitor);
    }
    fallback.ok_or(CaptureError::Unsupported)
}

#[async_trait]
impl ScreenShare for MonitorShare {
    async fn request_stream(&self) -> Result<Box<dyn MediaStream>, CaptureError> {
        // The OS enforces screen-recording permission on the first grab.
        let monitor = primary_monitor()?;
        monitor
            .capture_image()
            .map_err(|err| CaptureError::Denied(err.to_string()))?;
        Ok(Box::new(MonitorStream { stopped: false }))
    }
}

/// Live view of the primary monitor. Each draw grabs a fresh frame.
struct MonitorStream {
    stopped: bool,
}

impl FrameSource for MonitorStream {
    fn natural_size(&self) -> (u32, u32) {
        if self.stopped {
            return (0, 0);
        }
        primary_monitor()
            .ok()
            .and_then(|monitor| Some((monitor.width().ok()?, monitor.height().ok()?)))
            .unwrap_or((0, 0))
    }

    fn draw(&self) -> Option<RgbaImage> {
        if self.stopped {
            return None;
        }
        let frame = primary_monitor().ok()?.capture_image().ok()?;
        let (width, height) = frame.dimensions();
        RgbaImage::from_raw(width, height, frame.into_raw())
    }
}

impl MediaStream for MonitorStream {
    fn stop(&mut self) {
        self.stopped = true;
    }
}
