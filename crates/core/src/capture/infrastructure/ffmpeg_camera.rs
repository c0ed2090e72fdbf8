use std::path::Path;

use thiserror::Error;

use crate::capture::domain::capture_request::CaptureRequest;
use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no camera capture backend for this platform")]
    UnsupportedPlatform,
    #[error("capture backend {0} is not available in this ffmpeg build")]
    FormatUnavailable(&'static str),
    #[error("no video stream in {0}")]
    NoVideoStream(String),
    #[error("{0} did not open as an input")]
    NotInput(String),
    #[error("camera not opened")]
    NotOpened,
}

/// Captures frames from a webcam through libavdevice, or from a media file.
///
/// Each decoded frame is converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegCamera {
    stream: Option<OpenStream>,
}

impl FfmpegCamera {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Default for FfmpegCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegCamera {
    fn open(&mut self, request: &CaptureRequest) -> Result<StreamInfo, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        self.close();

        let ictx = open_input(request)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| CaptureError::NoVideoStream(request.device.clone()))?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let info = StreamInfo {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            device: request.device.clone(),
        };

        self.stream = Some(OpenStream {
            ictx,
            decoder,
            scaler: None,
            stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        });

        Ok(info)
    }

    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        match self.stream.as_mut() {
            Some(stream) => stream.next_frame(),
            None => Err(CaptureError::NotOpened.into()),
        }
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Capture device released");
        }
    }
}

/// Opens either a regular media file or a platform capture device.
fn open_input(
    request: &CaptureRequest,
) -> Result<ffmpeg_next::format::context::Input, Box<dyn std::error::Error>> {
    if Path::new(&request.device).is_file() {
        return Ok(ffmpeg_next::format::input(&request.device)?);
    }

    let format_name = capture_format_name().ok_or(CaptureError::UnsupportedPlatform)?;
    let format =
        find_video_device(format_name).ok_or(CaptureError::FormatUnavailable(format_name))?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_size", &request.video_size());
    if let Some(fps) = request.framerate {
        options.set("framerate", &fps.to_string());
    }

    let ctx = ffmpeg_next::format::open_with(&request.device, &format, options)?;
    match ctx {
        ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
        ffmpeg_next::format::context::Context::Output(_) => {
            Err(CaptureError::NotInput(request.device.clone()).into())
        }
    }
}

/// Looks up a registered video input device by demuxer name.
///
/// The device iterator yields a null format when the build registers no
/// video devices, so iteration stops at the first null entry.
fn find_video_device(name: &str) -> Option<ffmpeg_next::format::Format> {
    ffmpeg_next::device::input::video()
        .take_while(|format| match format {
            ffmpeg_next::format::Format::Input(input) => unsafe { !input.as_ptr().is_null() },
            ffmpeg_next::format::Format::Output(_) => false,
        })
        .find(|format| format.name() == name)
}

/// libavdevice demuxer for the local platform's cameras.
fn capture_format_name() -> Option<&'static str> {
    if cfg!(target_os = "linux") {
        Some("v4l2")
    } else if cfg!(target_os = "macos") {
        Some("avfoundation")
    } else if cfg!(target_os = "windows") {
        Some("dshow")
    } else {
        None
    }
}

/// Decoder state for an opened input.
struct OpenStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    /// Built from the first decoded frame; MJPEG webcams only report their
    /// pixel format once decoding starts.
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl OpenStream {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(frame) = self.try_receive()? {
                    return Ok(Some(frame));
                }
                self.done = true;
                return Ok(None);
            };

            if stream.index() != self.stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
                continue;
            }

            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let width = decoded.width();
        let height = decoded.height();
        if self.scaler.is_none() {
            self.scaler = Some(ffmpeg_next::software::scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(&decoded, &mut rgb_frame)?;
        }

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

/// Copies pixel data from an ffmpeg frame into a tightly-packed RGB buffer,
/// dropping any per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes a short MPEG-4 clip of flat gray frames.
    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        for i in 0..num_frames {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
            );
            let value = ((i * 40) % 256) as u8;
            rgb_frame.data_mut(0).fill(value);

            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));

            encoder.send_frame(&yuv_frame).unwrap();

            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(&mut octx).unwrap();
            }
        }

        encoder.send_eof().unwrap();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(&mut octx).unwrap();
        }

        octx.write_trailer().unwrap();
    }

    fn recorded(dir: &Path, frames: usize) -> CaptureRequest {
        let path = dir.join("clip.mp4");
        create_test_video(&path, frames, 160, 120, 30);
        CaptureRequest::new(path.to_string_lossy(), 1280, 720)
    }

    #[test]
    fn test_open_file_reports_stream_info() {
        let dir = tempfile::tempdir().unwrap();
        let request = recorded(dir.path(), 3);

        let mut camera = FfmpegCamera::new();
        let info = camera.open(&request).unwrap();
        assert_eq!(info.width, 160);
        assert_eq!(info.height, 120);
        assert!(info.fps > 0.0);
        assert_eq!(info.device, request.device);
    }

    #[test]
    fn test_reads_every_frame_then_none() {
        let dir = tempfile::tempdir().unwrap();
        let request = recorded(dir.path(), 5);

        let mut camera = FfmpegCamera::new();
        camera.open(&request).unwrap();

        let mut frames = Vec::new();
        while let Some(frame) = camera.read().unwrap() {
            frames.push(frame);
        }
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
        // stays ended
        assert!(camera.read().unwrap().is_none());
    }

    #[test]
    fn test_read_without_open_errors() {
        let mut camera = FfmpegCamera::new();
        assert!(camera.read().is_err());
    }

    #[test]
    fn test_open_missing_device_errors() {
        let mut camera = FfmpegCamera::new();
        let request = CaptureRequest::new("/nonexistent/video99", 640, 480);
        assert!(camera.open(&request).is_err());
    }

    #[test]
    fn test_close_releases_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let request = recorded(dir.path(), 1);

        let mut camera = FfmpegCamera::new();
        camera.open(&request).unwrap();
        camera.close();
        camera.close();
        assert!(camera.read().is_err());
    }

    #[test]
    fn test_capture_format_known_on_desktop_platforms() {
        if cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows")) {
            assert!(capture_format_name().is_some());
        }
    }

    #[test]
    fn test_find_video_device_unknown_name_is_none() {
        ffmpeg_next::init().unwrap();
        assert!(find_video_device("no-such-demuxer").is_none());
    }

    #[test]
    fn test_find_video_device_returns_matching_name() {
        ffmpeg_next::init().unwrap();
        if let Some(format) = capture_format_name().and_then(find_video_device) {
            assert_eq!(Some(format.name()), capture_format_name());
        }
    }
}
