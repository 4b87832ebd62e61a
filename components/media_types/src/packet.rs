//! Compressed packets produced by the container

use crate::media_type::MediaType;

/// Classification of a [`MediaPacket`], driving decoder-state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketClass {
    /// An ordinary compressed unit to be fed to the decoder.
    Normal,
    /// Signals the decoder to flush its internal buffers (a seek boundary).
    Flush,
    /// Signals end-of-stream; the decoder should drain without new input.
    Empty,
}

/// An opaque handle to a compressed unit read from the demuxer.
///
/// Owns its backing buffer; the codec backend is responsible for freeing
/// whatever native resource `data` wraps when the packet is dropped (the
/// core's obligation is only to route it to exactly one component and
/// consume it exactly once).
#[derive(Debug, Clone)]
pub struct MediaPacket {
    /// Index of the container stream this packet belongs to.
    pub stream_index: usize,
    /// Media type of that stream, cached so components don't need to
    /// re-query the container on every packet.
    pub media_type: MediaType,
    /// Compressed payload size in bytes (used for bitrate bookkeeping).
    pub size: usize,
    /// Duration of this packet expressed in the stream's own timebase
    /// (not yet rescaled to engine ticks — that happens at decode time,
    /// once the decoder knows the output frame's real duration).
    pub duration_in_stream_timebase: i64,
    /// Packet classification.
    pub class: PacketClass,
}

impl MediaPacket {
    /// Builds a normal data-carrying packet.
    pub fn normal(stream_index: usize, media_type: MediaType, size: usize, duration: i64) -> Self {
        Self {
            stream_index,
            media_type,
            size,
            duration_in_stream_timebase: duration,
            class: PacketClass::Normal,
        }
    }

    /// Builds a flush marker packet for the given stream.
    pub fn flush(stream_index: usize, media_type: MediaType) -> Self {
        Self {
            stream_index,
            media_type,
            size: 0,
            duration_in_stream_timebase: 0,
            class: PacketClass::Flush,
        }
    }

    /// Builds an end-of-stream marker packet for the given stream.
    pub fn empty(stream_index: usize, media_type: MediaType) -> Self {
        Self {
            stream_index,
            media_type,
            size: 0,
            duration_in_stream_timebase: 0,
            class: PacketClass::Empty,
        }
    }

    /// True for packets that should be counted toward buffer-fill thresholds.
    pub fn counts_toward_buffer(&self) -> bool {
        matches!(self.class, PacketClass::Normal)
    }
}

/// Outcome of a single [`crate::ports::MediaContainer::read`] call.
#[derive(Debug, Clone)]
pub enum PacketOrEndOfStream {
    /// A packet was read.
    Packet(MediaPacket),
    /// The demuxer has reached end of stream.
    EndOfStream,
}
