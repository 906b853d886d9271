//! Time utilities for the fixed-step simulation

use std::time::{Duration, Instant};

/// Server tick counter. Wire records carry ticks as `i32` and `-1` means "never".
pub type Tick = i32;

/// Default simulation rate
pub const DEFAULT_TICK_SPEED: i32 = 50; // 50 ticks per second

/// Convert milliseconds into whole ticks (truncating)
pub fn ms_to_ticks(ms: i32, tick_speed: i32) -> Tick {
    ms * tick_speed / 1000
}

/// Convert seconds into whole ticks (truncating)
pub fn secs_to_ticks(secs: f32, tick_speed: i32) -> Tick {
    (tick_speed as f32 * secs) as Tick
}

/// Wall-clock length of one simulation tick
pub fn tick_duration(tick_speed: i32) -> Duration {
    Duration::from_micros(1_000_000 / tick_speed.max(1) as u64)
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_window_of_125ms_is_six_ticks_at_50hz() {
        assert_eq!(ms_to_ticks(125, 50), 6);
        assert_eq!(ms_to_ticks(500, 50), 25);
    }

    #[test]
    fn fractional_seconds_truncate() {
        assert_eq!(secs_to_ticks(0.1, 50), 5);
        assert_eq!(secs_to_ticks(0.02, 50), 1);
        assert_eq!(secs_to_ticks(2.0, 50), 100);
    }

    #[test]
    fn tick_duration_never_divides_by_zero() {
        assert_eq!(tick_duration(50), Duration::from_millis(20));
        assert_eq!(tick_duration(0), Duration::from_secs(1));
    }
}
