use std::collections::HashMap;
use std::time::Instant;

/// Observer for capture-loop events.
///
/// Keeps the loop free of output concerns; the CLI logs through the `log`
/// crate and tests discard everything.
pub trait PipelineLogger {
    /// Called once per captured frame.
    fn frame(&mut self, index: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. people in view).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame(&mut self, _index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count, sum and max of a stream of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            max: f64::MIN,
        }
    }
}

/// Logs through the `log` facade and accumulates per-stage timings and
/// metrics for a summary at shutdown. Only aggregates are kept, so memory
/// stays flat however long the feed runs.
///
/// A heartbeat line goes out every `heartbeat_frames` frames at debug level,
/// since a live feed has no total to report progress against.
pub struct LogPipelineLogger {
    heartbeat_frames: usize,
    timings: HashMap<String, Aggregate>,
    metrics: HashMap<String, Aggregate>,
    start_time: Instant,
    frames: usize,
}

impl LogPipelineLogger {
    pub fn new(heartbeat_frames: usize) -> Self {
        Self {
            heartbeat_frames: heartbeat_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = vec![format!(
            "Run summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let timing = &self.timings[stage];
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  total {:7.0}ms  ({} runs)",
                timing.mean(),
                timing.sum,
                timing.count
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            let metric = &self.metrics[name];
            lines.push(format!(
                "  {name}: avg {:.1}  max {:.0}",
                metric.mean(),
                metric.max
            ));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&Aggregate> {
        self.timings.get(stage)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&Aggregate> {
        self.metrics.get(name)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(300)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn frame(&mut self, index: usize) {
        self.frames += 1;
        if (index + 1) % self.heartbeat_frames == 0 {
            log::debug!("Captured {} frames", index + 1);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
