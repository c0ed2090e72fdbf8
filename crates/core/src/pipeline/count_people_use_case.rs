use std::time::{Duration, Instant};

use crate::capture::domain::capture_request::CaptureRequest;
use crate::capture::domain::frame_source::FrameSource;
use crate::counting::domain::clock::{Clock, SystemClock};
use crate::counting::domain::count_sink::CountSink;
use crate::counting::domain::detection_gate::DetectionGate;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::domain::person_counter::PersonCounter;
use crate::display::domain::frame_display::{DisplayEvent, FrameDisplay};

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Why the capture loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The source yielded no frame, or failed to read one.
    EndOfStream,
    /// The viewer pressed the quit key.
    QuitRequested,
    /// The source could not be opened; the loop never ran.
    SourceUnavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub detections: usize,
    pub last_count: Option<usize>,
    pub end_reason: EndReason,
}

impl RunSummary {
    fn new(end_reason: EndReason) -> Self {
        Self {
            frames: 0,
            detections: 0,
            last_count: None,
            end_reason,
        }
    }
}

/// Polls a camera, counts people every `interval`, and previews every frame.
///
/// Capture, detection and display all block the calling thread. The source
/// and display are released on every exit path.
pub struct CountPeopleUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn ObjectDetector>,
    counter: PersonCounter,
    sink: Box<dyn CountSink>,
    display: Box<dyn FrameDisplay>,
    interval: Duration,
    clock: Box<dyn Clock>,
    logger: Box<dyn PipelineLogger>,
}

impl CountPeopleUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn ObjectDetector>,
        counter: PersonCounter,
        sink: Box<dyn CountSink>,
        display: Box<dyn FrameDisplay>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            detector,
            counter,
            sink,
            display,
            interval,
            clock: Box::new(SystemClock),
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Runs until the stream ends or the viewer quits.
    ///
    /// Failing to open or read the source ends the run quietly; detector and
    /// sink failures are returned as errors.
    pub fn execute(
        &mut self,
        request: &CaptureRequest,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        match self.source.open(request) {
            Ok(info) => self.logger.info(&format!("Capturing from {info}")),
            Err(e) => {
                log::warn!("Could not open camera {}: {e}", request.device);
                return Ok(RunSummary::new(EndReason::SourceUnavailable));
            }
        }

        let result = self.run_loop();
        self.source.close();
        self.display.close();
        self.logger.summary();
        result
    }

    fn run_loop(&mut self) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let mut gate = DetectionGate::new(self.interval, self.clock.now());
        let mut summary = RunSummary::new(EndReason::EndOfStream);

        loop {
            let t0 = Instant::now();
            let frame = match self.source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.logger.info("Capture stream ended");
                    break;
                }
                Err(e) => {
                    log::warn!("Frame acquisition failed, stopping: {e}");
                    break;
                }
            };
            self.logger.timing("capture", elapsed_ms(t0));
            self.logger.frame(frame.index());
            summary.frames += 1;

            if gate.poll(self.clock.now()) {
                let t0 = Instant::now();
                let detections = self.detector.detect(&frame)?;
                self.logger.timing("detect", elapsed_ms(t0));

                let count = self.counter.count(&detections);
                self.sink.record(count)?;
                self.logger.metric("people", count as f64);
                self.logger.info(&format!(
                    "frame {}: {count} people among {} detections",
                    frame.index(),
                    detections.len()
                ));

                summary.detections += 1;
                summary.last_count = Some(count);
            }

            let t0 = Instant::now();
            let event = self.display.show(&frame)?;
            self.logger.timing("display", elapsed_ms(t0));
            if event == DisplayEvent::Quit {
                self.logger.info("Quit requested");
                summary.end_reason = EndReason::QuitRequested;
                break;
            }
        }

        Ok(summary)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
