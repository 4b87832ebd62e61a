//! Pool + sorted playback window of presentation blocks (spec §3, §4.4)

use crate::aggregates::Aggregates;
use crate::error::BufferError;
use mediacore_types::{
    BlockState, DecodeError, FrameMaterializer, MediaBlock, MediaFrame, MediaType, Ticks,
    TICKS_PER_MILLISECOND,
};
use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded collection of `capacity` blocks of a single media type: a FIFO
/// pool of free blocks plus a `start_time`-sorted playback window.
///
/// Generalizes the ring buffer's capacity-bounded reuse (wraparound writes
/// over a fixed allocation) from a byte stream into a pool of
/// pre-allocated, reusable block slots, and the frame cache's
/// last-accessed-entry tracking into the single `(last_query_ticks,
/// last_index)` lookup cache.
#[derive(Debug)]
pub struct BlockBuffer {
    media_type: MediaType,
    capacity: usize,
    pool: VecDeque<MediaBlock>,
    playback: Vec<MediaBlock>,
    aggregates: Aggregates,
    last_query: Option<(Ticks, usize)>,
}

impl BlockBuffer {
    /// Creates a buffer of `media_type` with `capacity` pre-allocated,
    /// pooled blocks.
    pub fn new(media_type: MediaType, capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let pool = (0..capacity).map(|_| MediaBlock::new_pooled(media_type)).collect();
        Ok(Self {
            media_type,
            capacity,
            pool,
            playback: Vec::with_capacity(capacity),
            aggregates: Aggregates::default(),
            last_query: None,
        })
    }

    /// The media type every block in this buffer carries.
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Total capacity (`|pool| + |playback|`, always).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of filled (playback) blocks.
    pub fn len(&self) -> usize {
        self.playback.len()
    }

    /// True if no blocks are filled.
    pub fn is_empty(&self) -> bool {
        self.playback.is_empty()
    }

    /// True if the playback window is at capacity.
    pub fn is_full(&self) -> bool {
        self.aggregates.is_full
    }

    /// True if every playback block shares the same duration.
    pub fn is_monotonic(&self) -> bool {
        self.aggregates.is_monotonic
    }

    /// The shared duration when [`Self::is_monotonic`], else zero.
    pub fn monotonic_duration(&self) -> Ticks {
        self.aggregates.monotonic_duration
    }

    /// Mean block duration across the playback window.
    pub fn average_block_duration(&self) -> Ticks {
        self.aggregates.average_block_duration
    }

    /// Start time of the earliest playback block, `Ticks::ZERO` if empty.
    pub fn range_start(&self) -> Ticks {
        self.aggregates.range_start
    }

    /// End time of the latest playback block, `Ticks::ZERO` if empty.
    pub fn range_end(&self) -> Ticks {
        self.aggregates.range_end
    }

    /// Midpoint of `[range_start, range_end]`.
    pub fn range_mid(&self) -> Ticks {
        self.aggregates.range_mid
    }

    /// `range_end - range_start`.
    pub fn range_duration(&self) -> Ticks {
        self.aggregates.range_duration
    }

    /// `8 * sum(compressed_size) / range_duration_seconds` when more than
    /// one block is present, else `0`.
    pub fn range_bitrate(&self) -> f64 {
        self.aggregates.range_bitrate
    }

    /// Fraction of `capacity` currently filled, in `[0, 1]`.
    pub fn capacity_percent(&self) -> f64 {
        self.aggregates.capacity_percent
    }

    /// The playback window, sorted by `start_time`.
    pub fn playback(&self) -> &[MediaBlock] {
        &self.playback
    }

    /// Converts `frame` into a block via `materializer`, obtaining a target
    /// block from the pool (recycling the earliest playback block if the
    /// pool is empty), inserts it in sorted order, and refreshes aggregates.
    ///
    /// Returns the block's index within the playback window.
    pub fn add(&mut self, frame: &MediaFrame, materializer: &dyn FrameMaterializer) -> Result<usize, DecodeError> {
        let mut block = self.take_target_block();

        let materialized = {
            let mut payload = block.payload.write();
            materializer.materialize(frame, &mut payload)
        };

        if let Err(err) = materialized {
            block.recycle();
            self.pool.push_back(block);
            return Err(err);
        }

        block.start_time = frame.start_time;
        block.duration = frame.duration;
        block.compressed_size = frame.compressed_size;
        block.state = BlockState::Playback;

        let insert_at = self
            .playback
            .binary_search_by(|b| b.start_time.cmp(&block.start_time))
            .unwrap_or_else(|i| i);
        self.playback.insert(insert_at, block);

        self.recompute_aggregates();
        self.last_query = None;

        Ok(insert_at)
    }

    fn take_target_block(&mut self) -> MediaBlock {
        if let Some(block) = self.pool.pop_front() {
            return block;
        }
        self.playback.remove(0)
    }

    /// Locates the playback index covering (or nearest to) `ticks`:
    /// `0` if `ticks < range_start`, `len - 1` if `ticks > range_end`,
    /// `-1` if empty.
    pub fn index_of(&mut self, ticks: Ticks) -> isize {
        if self.playback.is_empty() {
            self.last_query = None;
            return -1;
        }
        if ticks < self.aggregates.range_start {
            self.last_query = Some((ticks, 0));
            return 0;
        }
        if ticks > self.aggregates.range_end {
            let idx = self.playback.len() - 1;
            self.last_query = Some((ticks, idx));
            return idx as isize;
        }
        if let Some((last_ticks, last_idx)) = self.last_query {
            if last_ticks == ticks {
                return last_idx as isize;
            }
        }
        let idx = match self.playback.binary_search_by(|b| b.start_time.cmp(&ticks)) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        let idx = idx.min(self.playback.len() - 1);
        self.last_query = Some((ticks, idx));
        idx as isize
    }

    /// True if `ticks` falls within `[range_start, range_end]` of a
    /// non-empty buffer.
    pub fn is_in_range(&self, ticks: Ticks) -> bool {
        !self.playback.is_empty() && ticks >= self.aggregates.range_start && ticks <= self.aggregates.range_end
    }

    /// Position of `ticks` within the range as a fraction in `[0, 1]`.
    pub fn get_range_percent(&self, ticks: Ticks) -> f64 {
        let duration_secs = self.aggregates.range_duration.as_secs_f64();
        if duration_secs <= 0.0 {
            return 0.0;
        }
        ((ticks - self.aggregates.range_start).as_secs_f64() / duration_secs).clamp(0.0, 1.0)
    }

    /// Returns the block covering `ticks` (clamped to the window ends), if
    /// any blocks are present.
    pub fn block_at(&mut self, ticks: Ticks) -> Option<&MediaBlock> {
        let idx = self.index_of(ticks);
        if idx < 0 {
            None
        } else {
            self.playback.get(idx as usize)
        }
    }

    /// Returns `(previous, next, current)` relative to `position`.
    pub fn neighbors(&mut self, position: Ticks) -> (Option<&MediaBlock>, Option<&MediaBlock>, Option<&MediaBlock>) {
        let idx = self.index_of(position);
        if idx < 0 {
            return (None, None, None);
        }
        let idx = idx as usize;
        let previous = if idx > 0 { self.playback.get(idx - 1) } else { None };
        let next = self.playback.get(idx + 1);
        let current = self.playback.get(idx);
        (previous, next, current)
    }

    fn index_of_identity(&self, block: &MediaBlock) -> Option<usize> {
        self.playback.iter().position(|b| Arc::ptr_eq(&b.payload, &block.payload))
    }

    /// The playback-order successor of `block`, if any.
    pub fn next(&self, block: &MediaBlock) -> Option<&MediaBlock> {
        let idx = self.index_of_identity(block)?;
        self.playback.get(idx + 1)
    }

    /// The playback-order predecessor of `block`, if any.
    pub fn previous(&self, block: &MediaBlock) -> Option<&MediaBlock> {
        let idx = self.index_of_identity(block)?;
        idx.checked_sub(1).and_then(|i| self.playback.get(i))
    }

    /// Like [`Self::next`], but only when the gap between `block.end_time()`
    /// and the successor's `start_time` does not exceed `block.duration / 2`
    /// (when [`Self::is_monotonic`]) or `1ms` otherwise.
    pub fn continuous_next(&self, block: &MediaBlock) -> Option<&MediaBlock> {
        let next = self.next(block)?;
        let gap = next.start_time - block.end_time();
        let threshold = if self.aggregates.is_monotonic {
            Ticks(block.duration.0 / 2)
        } else {
            Ticks(TICKS_PER_MILLISECOND)
        };
        if gap <= threshold {
            Some(next)
        } else {
            None
        }
    }

    /// Returns every playback block to the pool.
    pub fn clear(&mut self) {
        for mut block in self.playback.drain(..) {
            block.recycle();
            self.pool.push_back(block);
        }
        self.aggregates = Aggregates::default();
        self.last_query = None;
    }

    fn recompute_aggregates(&mut self) {
        if self.playback.is_empty() {
            self.aggregates = Aggregates::default();
            return;
        }

        let range_start = self.playback.first().unwrap().start_time;
        let range_end = self.playback.last().unwrap().end_time();
        let range_duration = range_end - range_start;
        let range_mid = range_start + Ticks(range_duration.0 / 2);

        let total_compressed: usize = self.playback.iter().map(|b| b.compressed_size).sum();
        let range_bitrate = if self.playback.len() > 1 && range_duration.as_secs_f64() > 0.0 {
            8.0 * total_compressed as f64 / range_duration.as_secs_f64()
        } else {
            0.0
        };

        let first_duration = self.playback.first().unwrap().duration;
        let is_monotonic = self.playback.iter().all(|b| b.duration == first_duration);
        let monotonic_duration = if is_monotonic { first_duration } else { Ticks::ZERO };

        let total_duration: i64 = self.playback.iter().map(|b| b.duration.0).sum();
        let average_block_duration = Ticks(total_duration / self.playback.len() as i64);

        self.aggregates = Aggregates {
            range_start,
            range_end,
            range_mid,
            range_duration,
            range_bitrate,
            capacity_percent: self.playback.len() as f64 / self.capacity as f64,
            is_full: self.playback.len() >= self.capacity,
            is_monotonic,
            monotonic_duration,
            average_block_duration,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediacore_types::BlockPayload;

    struct IdentityMaterializer;

    impl FrameMaterializer for IdentityMaterializer {
        fn materialize(&self, frame: &MediaFrame, out: &mut BlockPayload) -> Result<(), DecodeError> {
            *out = BlockPayload::Data {
                bytes: vec![0u8; frame.compressed_size],
            };
            Ok(())
        }
    }

    struct FailingMaterializer;

    impl FrameMaterializer for FailingMaterializer {
        fn materialize(&self, _frame: &MediaFrame, _out: &mut BlockPayload) -> Result<(), DecodeError> {
            Err(DecodeError("boom".into()))
        }
    }

    fn frame_at(secs: f64, duration_secs: f64) -> MediaFrame {
        MediaFrame {
            stream_index: 0,
            media_type: MediaType::Video,
            start_time: Ticks::from_secs_f64(secs),
            duration: Ticks::from_secs_f64(duration_secs),
            has_valid_start_time: true,
            compressed_size: 1_000,
            extra: mediacore_types::FrameExtra::Data,
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(BlockBuffer::new(MediaType::Video, 0).unwrap_err(), BufferError::ZeroCapacity);
    }

    #[test]
    fn add_inserts_in_sorted_order_regardless_of_decode_order() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 4).unwrap();
        buffer.add(&frame_at(2.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(0.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(1.0, 1.0), &IdentityMaterializer).unwrap();

        let starts: Vec<f64> = buffer.playback().iter().map(|b| b.start_time.as_secs_f64()).collect();
        assert_eq!(starts, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn recycles_earliest_block_when_pool_exhausted() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 2).unwrap();
        buffer.add(&frame_at(0.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(1.0, 1.0), &IdentityMaterializer).unwrap();
        assert!(buffer.is_full());

        buffer.add(&frame_at(2.0, 1.0), &IdentityMaterializer).unwrap();
        let starts: Vec<f64> = buffer.playback().iter().map(|b| b.start_time.as_secs_f64()).collect();
        assert_eq!(starts, vec![1.0, 2.0]);
    }

    #[test]
    fn failed_materialize_returns_block_to_pool() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 1).unwrap();
        let result = buffer.add(&frame_at(0.0, 1.0), &FailingMaterializer);
        assert!(result.is_err());
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
    }

    #[test]
    fn index_of_clamps_outside_range_and_caches_last_query() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 4).unwrap();
        buffer.add(&frame_at(0.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(1.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(2.0, 1.0), &IdentityMaterializer).unwrap();

        assert_eq!(buffer.index_of(Ticks::from_secs_f64(-1.0)), 0);
        assert_eq!(buffer.index_of(Ticks::from_secs_f64(10.0)), 2);
        assert_eq!(buffer.index_of(Ticks::from_secs_f64(1.2)), 1);
        assert_eq!(buffer.index_of(Ticks::from_secs_f64(1.2)), 1);
    }

    #[test]
    fn empty_buffer_reports_no_index_and_not_in_range() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 2).unwrap();
        assert_eq!(buffer.index_of(Ticks::ZERO), -1);
        assert!(!buffer.is_in_range(Ticks::ZERO));
    }

    #[test]
    fn neighbors_reports_prev_next_current() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 4).unwrap();
        buffer.add(&frame_at(0.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(1.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(2.0, 1.0), &IdentityMaterializer).unwrap();

        let (previous, next, current) = buffer.neighbors(Ticks::from_secs_f64(1.2));
        assert_eq!(previous.unwrap().start_time, Ticks::from_secs_f64(0.0));
        assert_eq!(current.unwrap().start_time, Ticks::from_secs_f64(1.0));
        assert_eq!(next.unwrap().start_time, Ticks::from_secs_f64(2.0));
    }

    #[test]
    fn continuous_next_respects_monotonic_gap_threshold() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 4).unwrap();
        buffer.add(&frame_at(0.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(1.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(3.0, 1.0), &IdentityMaterializer).unwrap();

        assert!(buffer.is_monotonic());
        let first = buffer.playback()[0].clone();
        let second = buffer.playback()[1].clone();
        assert!(buffer.continuous_next(&first).is_some());
        assert!(buffer.continuous_next(&second).is_none());
    }

    #[test]
    fn clear_returns_all_blocks_to_pool() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 2).unwrap();
        buffer.add(&frame_at(0.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.add(&frame_at(1.0, 1.0), &IdentityMaterializer).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.range_start(), Ticks::ZERO);
        assert_eq!(buffer.capacity_percent(), 0.0);
    }

    #[test]
    fn range_bitrate_zero_below_two_blocks() {
        let mut buffer = BlockBuffer::new(MediaType::Video, 4).unwrap();
        buffer.add(&frame_at(0.0, 1.0), &IdentityMaterializer).unwrap();
        assert_eq!(buffer.range_bitrate(), 0.0);
        buffer.add(&frame_at(1.0, 1.0), &IdentityMaterializer).unwrap();
        assert!(buffer.range_bitrate() > 0.0);
    }
}
