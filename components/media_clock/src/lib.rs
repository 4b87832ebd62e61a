//! # mediacore-clock
//!
//! `RealTimeClock`: a monotonic wall-clock with pause/resume and a speed
//! ratio, the single source of truth for playback position (spec.md §4.1).
//!
//! Generalizes the teacher's `AVSyncController` clock field — a passive
//! `RwLock<Duration>` recording the last-displayed video timestamp — into
//! an active clock that advances on its own between samples and can be
//! paused, reset, force-updated, and sped up or slowed down.

#![warn(missing_docs)]
#![deny(unsafe_code)]

use mediacore_types::Ticks;
use parking_lot::Mutex;
use std::time::Instant;

#[derive(Debug)]
struct ClockState {
    /// Logical position as of `last_sample`.
    position: Ticks,
    /// Wall-clock instant `position` was last committed at.
    last_sample: Instant,
    /// Whether the clock is currently advancing.
    running: bool,
    /// Playback speed multiplier, always `> 0`.
    speed_ratio: f64,
}

impl ClockState {
    /// Position the clock would report right now, without mutating state.
    fn extrapolate(&self, now: Instant) -> Ticks {
        if !self.running {
            return self.position;
        }
        let elapsed = now.saturating_duration_since(self.last_sample);
        self.position + Ticks::from_secs_f64(elapsed.as_secs_f64() * self.speed_ratio)
    }

    /// Freezes the extrapolated position into `position`/`last_sample`.
    fn commit(&mut self, now: Instant) {
        self.position = self.extrapolate(now);
        self.last_sample = now;
    }
}

/// Monotonic playback clock with pause/resume and speed control.
///
/// All operations are serialized under a single internal mutex; the only
/// suspension point is that mutex's acquisition (spec.md §4.1).
#[derive(Debug)]
pub struct RealTimeClock {
    state: Mutex<ClockState>,
}

impl RealTimeClock {
    /// Creates a new, stopped clock positioned at zero with `speed_ratio`
    /// 1.0.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                position: Ticks::ZERO,
                last_sample: Instant::now(),
                running: false,
                speed_ratio: 1.0,
            }),
        }
    }

    /// Starts (or resumes) the clock advancing from its current position.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if !state.running {
            state.last_sample = Instant::now();
            state.running = true;
        }
    }

    /// Pauses the clock, freezing its current extrapolated position.
    pub fn pause(&self) {
        let mut state = self.state.lock();
        if state.running {
            state.commit(Instant::now());
            state.running = false;
        }
    }

    /// Resets the position to zero, preserving the running state.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.position = Ticks::ZERO;
        state.last_sample = Instant::now();
    }

    /// Atomically sets the position to `position`, preserving whether the
    /// clock is running.
    pub fn update(&self, position: Ticks) {
        let mut state = self.state.lock();
        state.position = position;
        state.last_sample = Instant::now();
    }

    /// Returns the current extrapolated position. Monotonic between
    /// `reset` calls while running.
    pub fn read_position(&self) -> Ticks {
        let state = self.state.lock();
        state.extrapolate(Instant::now())
    }

    /// Whether the clock is currently advancing.
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Current speed ratio.
    pub fn speed_ratio(&self) -> f64 {
        self.state.lock().speed_ratio
    }

    /// Sets the speed ratio. `r` must be `> 0`; the current position is
    /// committed first so the change never causes a jump.
    pub fn set_speed_ratio(&self, r: f64) {
        assert!(r > 0.0, "speed_ratio must be positive, got {r}");
        let mut state = self.state.lock();
        state.commit(Instant::now());
        state.speed_ratio = r;
    }
}

impl Default for RealTimeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn starts_stopped_at_zero() {
        let clock = RealTimeClock::new();
        assert!(!clock.is_running());
        assert_eq!(clock.read_position(), Ticks::ZERO);
    }

    #[test]
    fn advances_only_while_running() {
        let clock = RealTimeClock::new();
        sleep(Duration::from_millis(20));
        assert_eq!(clock.read_position(), Ticks::ZERO);

        clock.start();
        sleep(Duration::from_millis(30));
        assert!(clock.read_position() > Ticks::ZERO);
    }

    #[test]
    fn pause_freezes_position() {
        let clock = RealTimeClock::new();
        clock.start();
        sleep(Duration::from_millis(20));
        clock.pause();
        let frozen = clock.read_position();
        sleep(Duration::from_millis(20));
        assert_eq!(clock.read_position(), frozen);
    }

    #[test]
    fn update_preserves_run_state() {
        let clock = RealTimeClock::new();
        clock.start();
        clock.update(Ticks::from_secs_f64(5.0));
        assert!(clock.is_running());
        assert!(clock.read_position() >= Ticks::from_secs_f64(5.0));

        clock.pause();
        clock.update(Ticks::from_secs_f64(1.0));
        assert!(!clock.is_running());
        assert_eq!(clock.read_position(), Ticks::from_secs_f64(1.0));
    }

    #[test]
    fn reset_zeroes_position_but_keeps_running() {
        let clock = RealTimeClock::new();
        clock.start();
        clock.update(Ticks::from_secs_f64(3.0));
        clock.reset();
        assert!(clock.is_running());
        let pos = clock.read_position();
        assert!(pos >= Ticks::ZERO && pos < Ticks::from_secs_f64(0.1));
    }

    #[test]
    fn speed_ratio_scales_advancement() {
        let clock = RealTimeClock::new();
        clock.set_speed_ratio(4.0);
        clock.start();
        sleep(Duration::from_millis(50));
        let fast = clock.read_position();
        assert!(fast.as_secs_f64() > 0.15);
    }

    #[test]
    #[should_panic]
    fn speed_ratio_rejects_non_positive() {
        let clock = RealTimeClock::new();
        clock.set_speed_ratio(0.0);
    }
}
