/// What the capture source actually negotiated when it was opened.
///
/// Devices are free to ignore the requested size, so the loop logs this
/// rather than trusting the request.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
    pub device: String,
}

impl std::fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}x{}", self.device, self.width, self.height)?;
        if self.fps > 0.0 {
            write!(f, " @ {:.1} fps", self.fps)?;
        }
        if !self.codec.is_empty() {
            write!(f, " ({})", self.codec)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(fps: f64, codec: &str) -> StreamInfo {
        StreamInfo {
            width: 1280,
            height: 720,
            fps,
            codec: codec.to_string(),
            device: "/dev/video0".to_string(),
        }
    }

    #[test]
    fn test_display_full() {
        assert_eq!(
            info(30.0, "mjpeg").to_string(),
            "/dev/video0 1280x720 @ 30.0 fps (mjpeg)"
        );
    }

    #[test]
    fn test_display_omits_unknown_rate_and_codec() {
        assert_eq!(info(0.0, "").to_string(), "/dev/video0 1280x720");
    }
}
