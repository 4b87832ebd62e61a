//! Presentation-ready blocks pooled and served by a `BlockBuffer`

use crate::frame::ClosedCaptionPacket;
use crate::media_type::MediaType;
use crate::ticks::Ticks;
use parking_lot::RwLock;
use std::sync::Arc;

/// Which of a `BlockBuffer`'s two collections a block currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Free, in the pool, awaiting reuse.
    Pooled,
    /// Filled with decoded content, in the sorted playback window.
    Playback,
}

/// Per-media-type decoded payload and metadata carried by a block.
///
/// This is the data a renderer reads and a decoder overwrites; it lives
/// behind the block's own reader-writer lock (see [`MediaBlock::payload`])
/// so the decoder can materialize one block while the renderer concurrently
/// reads a different one without contending on the `BlockBuffer`'s lock.
#[derive(Debug, Clone, Default)]
pub enum BlockPayload {
    /// No content yet (a freshly pooled block).
    #[default]
    Empty,
    /// Decoded video picture.
    Video {
        /// Pixel width.
        width: u32,
        /// Pixel height.
        height: u32,
        /// Display pixel-aspect ratio (numerator/denominator).
        pixel_aspect_ratio: (u32, u32),
        /// Row stride in bytes.
        stride: usize,
        /// Display order picture number.
        display_picture_number: i64,
        /// Decode order picture number.
        coded_picture_number: i64,
        /// SMPTE timecode, if present.
        smpte_timecode: Option<String>,
        /// Whether this picture was produced by a hardware decoder.
        hardware_decoded: bool,
        /// Closed-caption packets attached to this picture.
        closed_captions: Vec<ClosedCaptionPacket>,
        /// Raw pixel buffer.
        data: Vec<u8>,
    },
    /// Decoded, resampled/interleaved audio.
    Audio {
        /// Sample rate in Hz.
        sample_rate: u32,
        /// Channel count.
        channels: u16,
        /// Samples per channel in this block.
        samples_per_channel: usize,
        /// Interleaved 16-bit PCM sample buffer.
        samples: Vec<i16>,
    },
    /// Stripped-for-display subtitle text.
    Subtitle {
        /// Markup-stripped text lines, ready to render.
        text_lines: Vec<String>,
        /// Original (tagged) subtitle text.
        original_text: String,
        /// Format tag the text was stripped from (e.g. "ass", "srt").
        format_tag: String,
    },
    /// Opaque data-stream payload.
    Data {
        /// Raw bytes.
        bytes: Vec<u8>,
    },
}

/// A pooled, time-indexed presentation unit belonging to exactly one
/// `BlockBuffer`.
///
/// Invariant: `start_time <= end_time`; `duration = end_time - start_time`.
#[derive(Debug, Clone)]
pub struct MediaBlock {
    /// Media type of the owning buffer.
    pub media_type: MediaType,
    /// Current pool/playback state.
    pub state: BlockState,
    /// Presentation start time. Meaningless while `Pooled`.
    pub start_time: Ticks,
    /// Duration. Meaningless while `Pooled`.
    pub duration: Ticks,
    /// Compressed size of the source packet(s), for bitrate estimation.
    pub compressed_size: usize,
    /// Decoded payload, behind its own reader-writer lock so a writer
    /// (decode) and readers (render) never coexist on the same block, while
    /// different blocks in the same buffer can be accessed concurrently.
    pub payload: Arc<RwLock<BlockPayload>>,
}

impl MediaBlock {
    /// Builds a fresh, empty, pooled block of the given media type.
    pub fn new_pooled(media_type: MediaType) -> Self {
        Self {
            media_type,
            state: BlockState::Pooled,
            start_time: Ticks::ZERO,
            duration: Ticks::ZERO,
            compressed_size: 0,
            payload: Arc::new(RwLock::new(BlockPayload::Empty)),
        }
    }

    /// End time, derived from `start_time + duration`.
    pub fn end_time(&self) -> Ticks {
        self.start_time + self.duration
    }

    /// True if `ticks` falls within `[start_time, end_time]` inclusive.
    pub fn contains(&self, ticks: Ticks) -> bool {
        self.state == BlockState::Playback && ticks >= self.start_time && ticks <= self.end_time()
    }

    /// Resets a block back to its pristine pooled state, dropping payload.
    pub fn recycle(&mut self) {
        self.state = BlockState::Pooled;
        self.start_time = Ticks::ZERO;
        self.duration = Ticks::ZERO;
        self.compressed_size = 0;
        *self.payload.write() = BlockPayload::Empty;
    }
}
