use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, RgbaImage};

pub const JPEG_QUALITY: u8 = 80;

/// A live picture source, such as a shared screen.
pub trait FrameSource {
    /// Natural pixel size; `(0, 0)` while nothing is measurable yet.
    fn natural_size(&self) -> (u32, u32);

    /// Draw the current frame at natural size. `None` when no drawing surface
    /// is available.
    fn draw(&self) -> Option<RgbaImage>;
}

/// A fixed image posing as a frame source.
pub struct StillFrame {
    image: RgbaImage,
}

impl StillFrame {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.to_rgba8())
    }
}

impl FrameSource for StillFrame {
    fn natural_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn draw(&self) -> Option<RgbaImage> {
        Some(self.image.clone())
    }
}

/// Output size for a capture: never upscaled, aspect preserved, floored.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    if width <= max_width {
        return Some((width, height));
    }
    let scaled_height = (u64::from(height) * u64::from(max_width) / u64::from(width)) as u32;
    Some((max_width, scaled_height))
}

/// Capture the current frame as a base64 JPEG payload without a data-URI prefix.
pub fn capture_frame<S>(source: &S, max_width: u32) -> Option<String>
where
    S: FrameSource + ?Sized,
{
    let (width, height) = source.natural_size();
    let (target_width, target_height) = scaled_dimensions(width, height, max_width)?;
    if target_width == 0 || target_height == 0 {
        tracing::warn!(width, height, "frame too small to capture");
        return None;
    }

    let frame = source.draw()?;
    let frame = if frame.dimensions() == (target_width, target_height) {
        frame
    } else {
        image::imageops::resize(&frame, target_width, target_height, FilterType::Triangle)
    };
    let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();

    let mut bytes = Vec::new();
    let encoded = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode(
        rgb.as_raw(),
        target_width,
        target_height,
        ExtendedColorType::Rgb8,
    );
    if let Err(err) = encoded {
        tracing::warn!(error = %err, "jpeg encoding failed");
        return None;
    }

    tracing::debug!(
        target_width,
        target_height,
        jpeg_bytes = bytes.len(),
        "captured frame"
    );
    Some(BASE64.encode(&bytes))
}
