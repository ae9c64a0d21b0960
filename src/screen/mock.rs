//! Screen grabbers for testing.

use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::SystemTime;

use super::{encode_png, Frame, ScreenError, ScreenGrabber};
use crate::capture::log::micros_since_epoch;

/// Produces solid frames whose colour changes on every capture.
pub struct SolidGrabber {
    width: u32,
    height: u32,
    captures: AtomicU32,
}

impl SolidGrabber {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            captures: AtomicU32::new(0),
        }
    }

    pub fn captures(&self) -> u32 {
        self.captures.load(Ordering::SeqCst)
    }
}

impl ScreenGrabber for SolidGrabber {
    fn capture(&self) -> Result<Frame, ScreenError> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst);
        let shade = (n % 256) as u8;
        let image = RgbaImage::from_pixel(self.width, self.height, Rgba([shade, 0, 255 - shade, 255]));

        Ok(Frame {
            width: self.width,
            height: self.height,
            png: encode_png(&image)?,
            timestamp_micros: micros_since_epoch(SystemTime::now()),
        })
    }
}

/// Always fails as if no display were attached.
#[derive(Debug, Default)]
pub struct NoDisplayGrabber;

impl ScreenGrabber for NoDisplayGrabber {
    fn capture(&self) -> Result<Frame, ScreenError> {
        Err(ScreenError::NoDisplay("headless session".to_string()))
    }
}
