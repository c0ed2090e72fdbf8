use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

use super::capture_request::CaptureRequest;

/// Yields frames from a camera or recorded stream, one at a time.
///
/// Not `Send`: capture handles stay on the thread that opened them.
pub trait FrameSource {
    /// Opens the source and reports what was negotiated.
    fn open(&mut self, request: &CaptureRequest) -> Result<StreamInfo, Box<dyn std::error::Error>>;

    /// Blocks until the next frame is available.
    ///
    /// `Ok(None)` means the stream has ended.
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the device. Safe to call more than once.
    fn close(&mut self);
}
