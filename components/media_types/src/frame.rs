//! Decoded frames produced by the codec backend

use crate::media_type::MediaType;
use crate::ticks::Ticks;

/// A decoded closed-caption packet carried alongside a video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedCaptionPacket {
    /// Raw CC triplet/field bytes, opaque to the core.
    pub data: Vec<u8>,
}

/// Extra, per-media-type fields carried by a [`MediaFrame`].
#[derive(Debug, Clone)]
pub enum FrameExtra {
    /// Video-specific frame metadata.
    Video {
        /// Picture coding type (I/P/B/…), opaque label from the backend.
        picture_type: char,
        /// Display order picture number.
        display_picture_number: i64,
        /// Decode order picture number.
        coded_picture_number: i64,
        /// SMPTE timecode, if the stream carries one.
        smpte_timecode: Option<String>,
        /// True if this frame came off a hardware decoder.
        hardware_decoded: bool,
        /// Closed-caption packets attached to this frame.
        closed_captions: Vec<ClosedCaptionPacket>,
    },
    /// Audio-specific frame metadata.
    Audio {
        /// Source sample rate in Hz.
        sample_rate: u32,
        /// Channel count.
        channels: u16,
    },
    /// Subtitle-specific frame metadata.
    Subtitle {
        /// Original (possibly markup-tagged) subtitle text.
        original_text: String,
        /// Format tag (e.g. "ass", "srt") describing how to strip markup.
        format_tag: String,
    },
    /// Opaque data-stream payload.
    Data,
}

/// A raw decoded frame handed up from the codec backend.
///
/// Owned by whoever obtained it from the decoder; converted into a
/// [`crate::block::MediaBlock`] by [`crate::ports::FrameMaterializer`] and
/// then released.
#[derive(Debug, Clone)]
pub struct MediaFrame {
    /// Index of the container stream this frame was decoded from.
    pub stream_index: usize,
    /// Media type of the owning stream.
    pub media_type: MediaType,
    /// Presentation start time.
    pub start_time: Ticks,
    /// Frame duration.
    pub duration: Ticks,
    /// Whether `start_time` is trustworthy (some encoders emit frames with
    /// no usable timestamp, particularly right after a seek).
    pub has_valid_start_time: bool,
    /// Compressed size of the packet(s) that produced this frame, carried
    /// through so the owning [`crate::block::MediaBlock`] can contribute to
    /// `range_bitrate`.
    pub compressed_size: usize,
    /// Per-media-type extra fields.
    pub extra: FrameExtra,
}

impl MediaFrame {
    /// End time, derived from `start_time + duration`.
    pub fn end_time(&self) -> Ticks {
        self.start_time + self.duration
    }
}
