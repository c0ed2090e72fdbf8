use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for object detection.
///
/// Implementations may hold mutable inference state, hence `&mut self`.
pub trait ObjectDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
