//! Command throughput statistics

use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Counts device commands and reports commands per second over one-second windows.
#[derive(Debug, Clone)]
pub struct CommandStats {
    window_start: Instant,
    window_count: u32,
    total: u64,
    failures: u64,
    rate: f32,
}

impl Default for CommandStats {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl CommandStats {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            window_count: 0,
            total: 0,
            failures: 0,
            rate: 0.0,
        }
    }

    pub fn record_sent(&mut self) {
        self.window_count += 1;
        self.total += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Close the window once a second has passed. Returns true when the rate changed.
    pub fn update(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < WINDOW {
            return false;
        }
        self.rate = self.window_count as f32 / elapsed.as_secs_f32();
        self.window_count = 0;
        self.window_start = now;
        true
    }

    /// Commands per second over the last closed window
    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rate_over_window() {
        let start = Instant::now();
        let mut stats = CommandStats::new(start);
        for _ in 0..5 {
            stats.record_sent();
        }
        assert!(!stats.update(start + Duration::from_millis(500)));
        assert!(stats.update(start + Duration::from_secs(1)));
        assert_relative_eq!(stats.rate(), 5.0);
        assert_eq!(stats.total(), 5);
    }

    #[test]
    fn test_window_resets() {
        let start = Instant::now();
        let mut stats = CommandStats::new(start);
        stats.record_sent();
        stats.update(start + Duration::from_secs(1));
        stats.update(start + Duration::from_secs(2));
        assert_eq!(stats.rate(), 0.0);
        assert_eq!(stats.total(), 1);
    }
}
