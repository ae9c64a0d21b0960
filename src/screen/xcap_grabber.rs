//! Screen grabber backed by `xcap`, capturing the primary monitor

use std::time::SystemTime;
use xcap::Monitor;

use super::{encode_png, Frame, ScreenError, ScreenGrabber};
use crate::capture::log::micros_since_epoch;

#[derive(Debug, Default)]
pub struct XcapGrabber;

impl ScreenGrabber for XcapGrabber {
    fn capture(&self) -> Result<Frame, ScreenError> {
        let monitors = Monitor::all().map_err(|e| ScreenError::NoDisplay(e.to_string()))?;

        let primary = monitors
            .into_iter()
            .find(|m| m.is_primary())
            .ok_or_else(|| ScreenError::NoDisplay("no primary monitor found".to_string()))?;

        let taken_at = SystemTime::now();
        let image = primary
            .capture_image()
            .map_err(|e| ScreenError::Capture(e.to_string()))?;
        tracing::debug!("Captured {}x{} frame", image.width(), image.height());

        Ok(Frame {
            width: image.width(),
            height: image.height(),
            png: encode_png(&image)?,
            timestamp_micros: micros_since_epoch(taken_at),
        })
    }
}
