use crate::shared::frame::Frame;

/// What the viewer asked for after a frame was shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayEvent {
    Continue,
    Quit,
}

/// Live preview of the capture stream.
pub trait FrameDisplay {
    /// Shows `frame` and polls for input without blocking for long.
    fn show(&mut self, frame: &Frame) -> Result<DisplayEvent, Box<dyn std::error::Error>>;

    /// Tears down any window. Safe to call more than once.
    fn close(&mut self);
}
