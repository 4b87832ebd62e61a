//! 100-nanosecond tick arithmetic
//!
//! All times in the engine — packet, frame, and block timestamps, the wall
//! clock, seek targets — are expressed in signed 100-ns ticks rather than
//! `std::time::Duration`, because the underlying container/codec timebases
//! are native integer rationals and converting at every boundary would lose
//! precision and add noise to the hot path.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// One second, in ticks.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// One millisecond, in ticks.
pub const TICKS_PER_MILLISECOND: i64 = TICKS_PER_SECOND / 1_000;

/// A signed playback timestamp or duration, in 100-ns units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub i64);

impl Ticks {
    /// The zero tick, used as the default start-of-stream position.
    pub const ZERO: Ticks = Ticks(0);

    /// A sentinel meaning "no meaningful value" (e.g. an unset start time).
    pub const MIN: Ticks = Ticks(i64::MIN);

    /// Builds a tick value from whole milliseconds.
    pub const fn from_millis(ms: i64) -> Self {
        Ticks(ms * TICKS_PER_MILLISECOND)
    }

    /// Builds a tick value from a floating-point second count.
    pub fn from_secs_f64(secs: f64) -> Self {
        Ticks((secs * TICKS_PER_SECOND as f64).round() as i64)
    }

    /// Returns the value as floating-point seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / TICKS_PER_SECOND as f64
    }

    /// Returns the value as whole milliseconds (truncating).
    pub fn as_millis(self) -> i64 {
        self.0 / TICKS_PER_MILLISECOND
    }

    /// Saturating subtraction; never panics on overflow.
    pub fn saturating_sub(self, rhs: Ticks) -> Ticks {
        Ticks(self.0.saturating_sub(rhs.0))
    }

    /// Saturating addition; never panics on overflow.
    pub fn saturating_add(self, rhs: Ticks) -> Ticks {
        Ticks(self.0.saturating_add(rhs.0))
    }

    /// Absolute value of the tick span.
    pub fn abs(self) -> Ticks {
        Ticks(self.0.abs())
    }
}

impl Add for Ticks {
    type Output = Ticks;
    fn add(self, rhs: Ticks) -> Ticks {
        Ticks(self.0 + rhs.0)
    }
}

impl AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Ticks) {
        self.0 += rhs.0;
    }
}

impl Sub for Ticks {
    type Output = Ticks;
    fn sub(self, rhs: Ticks) -> Ticks {
        Ticks(self.0 - rhs.0)
    }
}

impl SubAssign for Ticks {
    fn sub_assign(&mut self, rhs: Ticks) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}
