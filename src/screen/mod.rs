//! On-demand screen snapshots
//!
//! Each capture is independent: no buffering, no cursor, nothing shared
//! between successive frames.

pub mod mock;
mod xcap_grabber;

pub use xcap_grabber::XcapGrabber;

use base64::Engine;
use image::{ImageEncoder, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error("no display available: {0}")]
    NoDisplay(String),
    #[error("screen capture failed: {0}")]
    Capture(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// One PNG-encoded frame of the active display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    pub timestamp_micros: u64,
}

impl Frame {
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

pub trait ScreenGrabber: Send + Sync {
    /// Capture exactly one frame.
    fn capture(&self) -> Result<Frame, ScreenError>;
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ScreenError> {
    let mut buffer = Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ScreenError::Encode(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encoded_png_has_signature() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));

        let png = encode_png(&image).unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn frame_base64_round_trips_bytes() {
        let frame = Frame {
            width: 1,
            height: 1,
            png: vec![0, 159, 255],
            timestamp_micros: 7,
        };

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(frame.base64())
            .unwrap();

        assert_eq!(decoded, frame.png);
    }
}
