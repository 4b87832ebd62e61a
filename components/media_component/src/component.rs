//! Per-stream `MediaComponent` (spec.md §3, §4.3)

use crate::packet_queue::PacketQueue;
use mediacore_types::{ComponentDecoder, DecodeError, FrameMaterializer, MediaFrame, MediaPacket, MediaType, PacketClass, Ticks};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Decoder-side state machine driven by flush/empty packets
/// (spec.md §4.3 "State machine (decoder)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Normal operation.
    Fresh,
    /// An empty (end-of-stream) packet has been fed; draining remaining
    /// buffered frames with no new input.
    Draining,
}

/// A single demuxed stream's queue, decoder handle, and buffering policy.
///
/// The packet queue is written by the reader and read by the decoder from
/// different threads, so it carries its own lock; the decoder handle and
/// state machine are touched only by the decode worker but are still kept
/// behind a lock so a `MediaComponent` can be shared via `Arc` the way a
/// `ComponentSet` does.
pub struct MediaComponent {
    decoder: Mutex<Box<dyn ComponentDecoder>>,
    materializer: Box<dyn FrameMaterializer>,
    media_type: MediaType,
    stream_index: usize,
    codec_id: String,
    start_time: Ticks,
    duration: Option<Ticks>,
    is_attached_pic: bool,
    queue: PacketQueue,
    buffer_count_threshold: usize,
    buffer_duration_threshold: Ticks,
    decoder_state: Mutex<DecoderState>,
    eof_reached: AtomicBool,
    read_aborted: AtomicBool,
}

impl std::fmt::Debug for MediaComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaComponent")
            .field("stream_index", &self.stream_index)
            .field("codec_id", &self.codec_id)
            .field("start_time", &self.start_time)
            .field("duration", &self.duration)
            .field("is_attached_pic", &self.is_attached_pic)
            .field("decoder_state", &*self.decoder_state.lock())
            .finish()
    }
}

impl MediaComponent {
    /// Builds a component for one demuxed stream.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        decoder: Box<dyn ComponentDecoder>,
        materializer: Box<dyn FrameMaterializer>,
        media_type: MediaType,
        stream_index: usize,
        codec_id: String,
        start_time: Ticks,
        duration: Option<Ticks>,
        is_attached_pic: bool,
        buffer_count_threshold: usize,
        buffer_duration_threshold: Ticks,
    ) -> Self {
        Self {
            decoder: Mutex::new(decoder),
            materializer,
            media_type,
            stream_index,
            codec_id,
            start_time,
            duration,
            is_attached_pic,
            queue: PacketQueue::new(),
            buffer_count_threshold,
            buffer_duration_threshold,
            decoder_state: Mutex::new(DecoderState::Fresh),
            eof_reached: AtomicBool::new(false),
            read_aborted: AtomicBool::new(false),
        }
    }

    /// Media type of this component's stream.
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// The container stream index this component services.
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Backend codec identifier.
    pub fn codec_id(&self) -> &str {
        &self.codec_id
    }

    /// Stream start time.
    pub fn start_time(&self) -> Ticks {
        self.start_time
    }

    /// Stream duration, if known.
    pub fn duration(&self) -> Option<Ticks> {
        self.duration
    }

    /// True if this is a still-image "attached picture" video stream.
    pub fn is_attached_pic(&self) -> bool {
        self.is_attached_pic
    }

    /// Current decoder state-machine state.
    pub fn decoder_state(&self) -> DecoderState {
        *self.decoder_state.lock()
    }

    /// Marks that the container has reached end-of-stream for this
    /// component's underlying stream.
    pub fn set_eof_reached(&self, value: bool) {
        self.eof_reached.store(value, Ordering::Release);
    }

    /// True once end-of-stream has been observed.
    pub fn eof_reached(&self) -> bool {
        self.eof_reached.load(Ordering::Acquire)
    }

    /// Marks that reads have been aborted (e.g. mid-direct-command).
    pub fn set_read_aborted(&self, value: bool) {
        self.read_aborted.store(value, Ordering::Release);
    }

    /// True if reads have been aborted.
    pub fn read_aborted(&self) -> bool {
        self.read_aborted.load(Ordering::Acquire)
    }

    /// Queues a normal packet; flush packets drop everything previously
    /// sent to the decoder and reset its state; empty packets are queued
    /// normally and flip the decoder to `Draining` once consumed.
    pub fn send_packet(&self, packet: MediaPacket) {
        debug_assert_eq!(packet.stream_index, self.stream_index);
        match packet.class {
            PacketClass::Flush => self.flush(),
            PacketClass::Normal | PacketClass::Empty => {
                self.queue.push(packet);
            }
        }
    }

    /// Drops every queued packet and resets the decoder to `Fresh` without
    /// going through a flush packet (spec.md §4.7 step 3, executed by the
    /// seek engine directly on every installed component).
    pub fn flush(&self) {
        self.queue.clear();
        self.decoder.lock().flush();
        *self.decoder_state.lock() = DecoderState::Fresh;
    }

    /// Feeds queued packets to the decoder until a frame emerges or no more
    /// packets can be supplied this call.
    pub fn receive_next_frame(&self) -> Result<Option<MediaFrame>, DecodeError> {
        let mut decoder = self.decoder.lock();
        loop {
            if let Some(frame) = decoder.receive_frame()? {
                return Ok(Some(frame));
            }
            let Some(packet) = self.queue.pop() else {
                return Ok(None);
            };
            if packet.class == PacketClass::Empty {
                *self.decoder_state.lock() = DecoderState::Draining;
            }
            decoder.send_packet(&packet)?;
        }
    }

    /// Converts a decoded frame into a block payload via this component's
    /// materializer (pixel conversion for video, resample for audio,
    /// markup stripping for subtitles).
    pub fn materialize_frame(&self, frame: &MediaFrame, out: &mut mediacore_types::BlockPayload) -> Result<(), DecodeError> {
        self.materializer.materialize(frame, out)
    }

    /// True when this component needs no more packets before the decoder
    /// can keep making progress: it's an attached picture, EOF has been
    /// reached, reads were aborted, or both buffer thresholds are met.
    pub fn has_enough_packets(&self) -> bool {
        if self.is_attached_pic || self.eof_reached() || self.read_aborted() {
            return true;
        }
        let (count, duration) = self.queue.buffered_count_and_duration();
        duration >= self.buffer_duration_threshold && count >= self.buffer_count_threshold
    }

    /// Current queued packet count and buffered duration.
    pub fn buffer_state(&self) -> (usize, Ticks) {
        self.queue.buffered_count_and_duration()
    }
}

impl FrameMaterializer for MediaComponent {
    /// Delegates to this component's own materializer, letting a
    /// `MediaComponent` stand in directly wherever a `FrameMaterializer` is
    /// expected (e.g. `BlockBuffer::add`).
    fn materialize(&self, frame: &MediaFrame, out: &mut mediacore_types::BlockPayload) -> Result<(), DecodeError> {
        self.materialize_frame(frame, out)
    }
}
