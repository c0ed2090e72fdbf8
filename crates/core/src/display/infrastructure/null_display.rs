use crate::display::domain::frame_display::{DisplayEvent, FrameDisplay};
use crate::shared::frame::Frame;

/// Display that shows nothing and never asks to quit.
///
/// Used for headless runs and in tests.
pub struct NullDisplay;

impl FrameDisplay for NullDisplay {
    fn show(&mut self, _frame: &Frame) -> Result<DisplayEvent, Box<dyn std::error::Error>> {
        Ok(DisplayEvent::Continue)
    }

    fn close(&mut self) {}
}
