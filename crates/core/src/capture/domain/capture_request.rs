use crate::shared::constants::{DEFAULT_WEBCAM_HEIGHT, DEFAULT_WEBCAM_WIDTH};

/// What to open and at which size.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureRequest {
    /// Device name (`/dev/video0`, `0`, `video=...`) or a media file path.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub framerate: Option<u32>,
}

impl CaptureRequest {
    pub fn new(device: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            device: device.into(),
            width,
            height,
            framerate: None,
        }
    }

    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = Some(framerate);
        self
    }

    /// `WxH`, as libavdevice expects for `video_size`.
    pub fn video_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self::new(
            default_camera_device(),
            DEFAULT_WEBCAM_WIDTH,
            DEFAULT_WEBCAM_HEIGHT,
        )
    }
}

/// The first camera, named the way the platform's capture backend expects.
pub fn default_camera_device() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "/dev/video0"
    }
    #[cfg(target_os = "macos")]
    {
        "0"
    }
    #[cfg(target_os = "windows")]
    {
        "video=Integrated Camera"
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        "0"
    }
}
