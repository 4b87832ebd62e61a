//! Per-component packet queue (spec.md §5 "single-writer (reader) /
//! single-reader (decoder) plus clearer (coordinator under pause)")

use mediacore_types::{MediaPacket, Ticks};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A packet queue shared between exactly one reader (writer) and exactly
/// one decoder (reader), with the command coordinator able to clear it
/// while workers are paused.
#[derive(Debug, Default)]
pub struct PacketQueue {
    inner: Mutex<VecDeque<MediaPacket>>,
}

impl PacketQueue {
    /// Builds an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `packet` to the back of the queue.
    pub fn push(&self, packet: MediaPacket) {
        self.inner.lock().push_back(packet);
    }

    /// Pops the oldest packet, if any.
    pub fn pop(&self) -> Option<MediaPacket> {
        self.inner.lock().pop_front()
    }

    /// Drops every queued packet.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True if no packets are queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// `(count, duration)` across packets that count toward buffer-fill
    /// thresholds (spec.md §4.3 `has_enough_packets`). `duration_in_stream_timebase`
    /// is treated as already expressed in ticks for this bookkeeping purpose;
    /// true timebase rescaling happens once a packet reaches the decoder.
    pub fn buffered_count_and_duration(&self) -> (usize, Ticks) {
        let queue = self.inner.lock();
        let mut count = 0;
        let mut duration = 0i64;
        for packet in queue.iter() {
            if packet.counts_toward_buffer() {
                count += 1;
                duration += packet.duration_in_stream_timebase;
            }
        }
        (count, Ticks(duration))
    }
}
