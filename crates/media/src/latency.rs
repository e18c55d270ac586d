//! Rolling-window timing instrumentation.
//!
//! A [LatencyTracker] keeps the last [WINDOW_LEN] durations it was given and
//! logs their mean every time the window fills back up. It's purely
//! observational: nothing here changes what the code being timed does.

use std::fmt::{self, Display, Formatter};
use std::time::{Duration, Instant};

/// How many samples a [LatencyWindow] holds (and how often the mean is logged).
pub const WINDOW_LEN: usize = 10;

/// A fixed-size ring buffer of durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencyWindow {
    samples: [Duration; WINDOW_LEN],
    recorded: u64,
}

impl LatencyWindow {
    /// Insert a sample, overwriting the oldest one once the window is full.
    pub fn push(&mut self, sample: Duration) {
        self.samples[(self.recorded % WINDOW_LEN as u64) as usize] = sample;
        self.recorded += 1;
    }

    /// The mean of the samples currently in the window ([None] if there aren't
    /// any yet).
    pub fn mean(&self) -> Option<Duration> {
        let held = self.recorded.min(WINDOW_LEN as u64) as u32;
        if held == 0 {
            return None;
        }

        let sum: Duration = self.samples[..held as usize].iter().sum();
        Some(sum / held)
    }

    /// Whether the latest sample completed a full round of the window.
    pub fn just_filled(&self) -> bool {
        self.recorded != 0 && self.recorded % WINDOW_LEN as u64 == 0
    }

    /// The total number of samples ever pushed.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }
}

/// Times operations and logs a rolling mean every [WINDOW_LEN] samples.
///
/// Trackers are plain owned values. Give each loop that needs timing its own.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    label: String,
    window: LatencyWindow,
}

impl LatencyTracker {
    /// Create a tracker whose log lines are prefixed with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            window: LatencyWindow::default(),
        }
    }

    /// Run `operation`, record how long it took, and return its result.
    pub fn track<T>(&mut self, operation: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = operation();
        self.record(start.elapsed());
        result
    }

    /// Record a sample. Every [WINDOW_LEN]th sample the window's mean is logged
    /// and returned.
    pub fn record(&mut self, sample: Duration) -> Option<Duration> {
        self.window.push(sample);

        if !self.window.just_filled() {
            return None;
        }

        let mean = self.window.mean()?;
        log::info!("{self}: {mean:?}");
        Some(mean)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The mean of the most recent samples.
    pub fn mean(&self) -> Option<Duration> {
        self.window.mean()
    }

    pub fn samples_recorded(&self) -> u64 {
        self.window.recorded()
    }
}

impl Display for LatencyTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} latency", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn mean_is_reported_every_tenth_sample() {
        let mut tracker = LatencyTracker::new("decode");

        for i in 1..WINDOW_LEN as u64 {
            assert_eq!(tracker.record(ms(i)), None);
        }
        // 1 + 2 + ... + 10 = 55
        assert_eq!(tracker.record(ms(10)), Some(Duration::from_micros(5_500)));

        for _ in 1..WINDOW_LEN {
            assert_eq!(tracker.record(ms(20)), None);
        }
        assert_eq!(tracker.record(ms(20)), Some(ms(20)));
        assert_eq!(tracker.samples_recorded(), 20);
    }

    #[test]
    fn window_only_keeps_the_latest_samples() {
        let mut window = LatencyWindow::default();
        assert_eq!(window.mean(), None);

        window.push(ms(4));
        window.push(ms(8));
        assert_eq!(window.mean(), Some(ms(6)));

        for _ in 0..WINDOW_LEN {
            window.push(ms(1));
        }
        assert_eq!(window.mean(), Some(ms(1)));
        assert!(!window.just_filled());
    }

    #[test]
    fn track_returns_the_operation_result() {
        let mut tracker = LatencyTracker::new("presentation");

        assert_eq!(tracker.track(|| 6 * 7), 42);
        assert_eq!(tracker.samples_recorded(), 1);
        assert!(tracker.mean().is_some());
        assert_eq!(tracker.to_string(), "presentation latency");
    }
}
