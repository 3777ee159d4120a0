use std::fmt;
use std::time::{Duration, Instant};

/// Start/stop stopwatch accumulating elapsed time across runs.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl Timer {
    /// A timer that is already running.
    pub fn started() -> Self {
        let mut timer = Self::default();
        timer.start();
        timer
    }

    pub fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) -> Duration {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
        self.accumulated
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated
            + self
                .running_since
                .map_or(Duration::ZERO, |since| since.elapsed())
    }

    pub fn formatted(&self) -> Elapsed {
        Elapsed(self.elapsed())
    }
}

/// Human-readable duration: `0.123s`, `2m05s` or `1h02m03s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        if secs < 60 {
            return write!(f, "{:.3}s", self.0.as_secs_f64());
        }
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h == 0 {
            write!(f, "{m}m{s:02}s")
        } else {
            write!(f, "{h}h{m:02}m{s:02}s")
        }
    }
}
