//! Cached aggregates recomputed after every [`crate::BlockBuffer`] mutation

use mediacore_types::Ticks;

/// Summary statistics over a buffer's playback window, refreshed on every
/// mutation so readers never recompute them.
#[derive(Debug, Clone, Copy)]
pub struct Aggregates {
    /// Start time of the earliest playback block.
    pub range_start: Ticks,
    /// End time of the latest playback block.
    pub range_end: Ticks,
    /// Midpoint of `[range_start, range_end]`.
    pub range_mid: Ticks,
    /// `range_end - range_start`.
    pub range_duration: Ticks,
    /// Bits per second over the playback window, `0` when fewer than two
    /// blocks are present.
    pub range_bitrate: f64,
    /// Fraction of `capacity` currently filled, in `[0, 1]`.
    pub capacity_percent: f64,
    /// Whether the playback window is at capacity.
    pub is_full: bool,
    /// Whether every playback block shares the same duration.
    pub is_monotonic: bool,
    /// The shared duration when `is_monotonic`, else `Ticks::ZERO`.
    pub monotonic_duration: Ticks,
    /// Mean block duration across the playback window.
    pub average_block_duration: Ticks,
}

impl Default for Aggregates {
    fn default() -> Self {
        Self {
            range_start: Ticks::ZERO,
            range_end: Ticks::ZERO,
            range_mid: Ticks::ZERO,
            range_duration: Ticks::ZERO,
            range_bitrate: 0.0,
            capacity_percent: 0.0,
            is_full: false,
            is_monotonic: false,
            monotonic_duration: Ticks::ZERO,
            average_block_duration: Ticks::ZERO,
        }
    }
}
