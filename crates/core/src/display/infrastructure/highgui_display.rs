use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::highgui;
use opencv::prelude::*;

use crate::display::domain::frame_display::{DisplayEvent, FrameDisplay};
use crate::shared::frame::Frame;

/// Key that closes the preview.
const QUIT_KEY: char = 'q';

/// Milliseconds `wait_key` blocks for; also lets highgui pump its events.
const KEY_POLL_MS: i32 = 1;

/// OpenCV highgui preview window.
pub struct HighguiDisplay {
    title: String,
    opened: bool,
}

impl HighguiDisplay {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            opened: false,
        }
    }
}

impl FrameDisplay for HighguiDisplay {
    fn show(&mut self, frame: &Frame) -> Result<DisplayEvent, Box<dyn std::error::Error>> {
        if !self.opened {
            highgui::named_window(&self.title, highgui::WINDOW_AUTOSIZE)?;
            self.opened = true;
        }

        let mut mat = Mat::new_rows_cols_with_default(
            frame.height() as i32,
            frame.width() as i32,
            CV_8UC3,
            Scalar::all(0.0),
        )?;
        mat.data_bytes_mut()?.copy_from_slice(&frame.to_bgr());
        highgui::imshow(&self.title, &mat)?;

        let key = highgui::wait_key(KEY_POLL_MS)?;
        Ok(key_event(key))
    }

    fn close(&mut self) {
        if !self.opened {
            return;
        }
        self.opened = false;
        if let Err(e) = highgui::destroy_all_windows() {
            log::warn!("Failed to close preview window: {e}");
        }
    }
}

/// Maps a `wait_key` result to a display event; `-1` means no key.
fn key_event(key: i32) -> DisplayEvent {
    if key < 0 {
        return DisplayEvent::Continue;
    }
    match char::from_u32((key & 0xFF) as u32) {
        Some(c) if c.to_ascii_lowercase() == QUIT_KEY => DisplayEvent::Quit,
        _ => DisplayEvent::Continue,
    }
}
