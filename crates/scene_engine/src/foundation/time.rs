//! Time management utilities
//!
//! Process timeouts are measured against a [`Clock`], which the engine samples
//! once per frame and forwards to the supervisor as a time-updated signal.
//! Times are seconds as `f64`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of a monotonically advancing time value in seconds
pub trait Clock {
    /// Current time in seconds
    fn now(&self) -> f64;
}

/// Wall clock measuring seconds since construction
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven clock
///
/// Clones share the same time value, so a test can keep one handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Rc<Cell<f64>>,
}

impl ManualClock {
    /// Create a clock at the given time
    pub fn new(start: f64) -> Self {
        Self {
            time: Rc::new(Cell::new(start)),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, time: f64) {
        self.time.set(time);
    }

    /// Move the clock forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.time.set(self.time.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}

/// Frame timer built on top of a [`Clock`]
pub struct Timer {
    last_frame: f64,
    delta_time: f64,
    frame_count: u64,
}

impl Timer {
    /// Create a timer whose first frame starts at `now`
    pub fn new(now: f64) -> Self {
        Self {
            last_frame: now,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self, now: f64) {
        self.delta_time = (now - self.last_frame).max(0.0);
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(0.0);
        let engine_side = clock.clone();

        clock.advance(0.5);
        assert!((engine_side.now() - 0.5).abs() < f64::EPSILON);

        clock.set(10.0);
        assert!((engine_side.now() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_timer_delta() {
        let mut timer = Timer::new(1.0);
        timer.update(1.25);
        assert!((timer.delta_time() - 0.25).abs() < 1e-9);
        assert_eq!(timer.frame_count(), 1);

        // A clock that goes backwards never yields a negative delta
        timer.update(1.0);
        assert!(timer.delta_time().abs() < f64::EPSILON);
    }
}
