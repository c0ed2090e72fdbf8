use std::time::{Duration, Instant};

/// Decides whether enough time has passed to run the detector again.
///
/// The timer starts when the gate is created, so the first detection
/// happens one full interval into the run.
#[derive(Clone, Debug)]
pub struct DetectionGate {
    interval: Duration,
    last_fired: Instant,
}

impl DetectionGate {
    pub fn new(interval: Duration, started_at: Instant) -> Self {
        Self {
            interval,
            last_fired: started_at,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true, and restarts the timer at `now`, once `interval` has
    /// elapsed since the last time it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_fired) >= self.interval {
            self.last_fired = now;
            true
        } else {
            false
        }
    }
}
