//! Narrow trait boundaries to out-of-scope external collaborators
//! (spec.md §1, §6, §9: "dynamic dispatch ... capability interfaces with
//! vtable-style polymorphism").
//!
//! None of these traits decode pixels, demux containers, or paint pixels to
//! a screen themselves — they are the seams a host crate plugs a real codec
//! backend and platform renderer into. This workspace's own test suite
//! implements them with small in-memory fakes.

use crate::block::{BlockPayload, MediaBlock};
use crate::config::ContainerOptions;
use crate::errors::{Aspect, DecodeError, MediaError, OpenError, ReadError, SeekError};
use crate::frame::MediaFrame;
use crate::media_type::MediaType;
use crate::packet::PacketOrEndOfStream;
use crate::ticks::Ticks;
use async_trait::async_trait;
use std::collections::HashMap;

/// A chapter marker reported by the container.
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Chapter start time.
    pub start: Ticks,
    /// Chapter end time.
    pub end: Ticks,
    /// Chapter title, if present.
    pub title: Option<String>,
}

/// A program (grouping of streams), as reported by multi-program
/// containers (e.g. MPEG-TS).
#[derive(Debug, Clone)]
pub struct Program {
    /// Program identifier.
    pub id: u32,
    /// Indices of streams belonging to this program.
    pub stream_indices: Vec<usize>,
}

/// Per-stream metadata reported at `open` time.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Container stream index.
    pub index: usize,
    /// Media type of the stream.
    pub media_type: MediaType,
    /// Backend codec identifier (opaque name, e.g. `"h264"`, `"aac"`).
    pub codec_id: String,
    /// Stream start time.
    pub start_time: Ticks,
    /// Stream duration, if known.
    pub duration: Option<Ticks>,
    /// Nominal bitrate, if known.
    pub bitrate: Option<u64>,
    /// True if this is a still-image "attached picture" video stream.
    pub is_attached_pic: bool,
}

/// Media info returned by [`MediaContainer::open`].
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Detected/forced container format name.
    pub format_name: String,
    /// All streams exposed by the container.
    pub streams: Vec<StreamInfo>,
    /// Chapter markers.
    pub chapters: Vec<Chapter>,
    /// Programs, if the container is program-multiplexed.
    pub programs: Vec<Program>,
    /// Overall duration, if known.
    pub duration: Option<Ticks>,
    /// Overall bitrate, if known.
    pub bitrate: Option<u64>,
    /// Backend-recommended best stream index per media type.
    pub best_streams_by_type: HashMap<MediaType, usize>,
    /// Whether the source is live (non-seekable, growing).
    pub is_live: bool,
    /// Whether the source supports seeking at all.
    pub is_seekable: bool,
}

/// Direction for [`InputStream::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekWhence {
    /// Relative to the start of the stream.
    Start,
    /// Relative to the current position.
    Current,
    /// Relative to the end of the stream.
    End,
}

/// Caller-supplied random-access byte source (spec.md §6 `InputStream`).
pub trait InputStream: Send {
    /// Reads up to `buf.len()` bytes, returning the number actually read
    /// (`0` at end of stream).
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    /// Repositions the stream, returning the new absolute offset.
    fn seek(&mut self, offset: i64, whence: SeekWhence) -> std::io::Result<u64>;
    /// Total length in bytes, if known in advance.
    fn length(&self) -> Option<u64>;
    /// A caller-facing URI/name used for diagnostics.
    fn stream_uri(&self) -> &str;
}

/// Source handed to [`MediaContainer::open`].
pub enum MediaSource {
    /// A URL the backend resolves and opens itself.
    Url(String),
    /// A caller-supplied random-access byte stream.
    Stream(Box<dyn InputStream>),
}

/// Façade over the out-of-scope codec backend (spec.md §4.2).
///
/// Implementations own the demuxer state; the core never touches container
/// internals beyond this interface.
#[async_trait]
pub trait MediaContainer: Send {
    /// Opens `source`, returning stream/metadata info or a fatal
    /// [`OpenError`].
    async fn open(&mut self, source: MediaSource, options: &ContainerOptions) -> Result<MediaInfo, OpenError>;

    /// Reads the next packet, or signals end of stream.
    fn read(&mut self) -> Result<PacketOrEndOfStream, ReadError>;

    /// Repositions the demuxer as close as possible to `target` (at or
    /// before it), invalidating packet/decoder state, and returns the
    /// first post-seek frame of any stream, if one was immediately
    /// available.
    fn seek(&mut self, target: Ticks) -> Result<Option<MediaFrame>, SeekError>;

    /// Causes any blocked [`MediaContainer::read`] call to return promptly.
    fn signal_abort_reads(&mut self);

    /// Releases demuxer resources. Idempotent.
    fn close(&mut self);
}

/// Per-stream decoder handle from the codec backend (spec.md §3
/// `MediaComponent` "decoder handle"; mirrors the send-packet/receive-frame
/// shape real decoder backends expose).
pub trait ComponentDecoder: Send {
    /// Feeds one packet into the decoder's internal buffer.
    fn send_packet(&mut self, packet: &crate::packet::MediaPacket) -> Result<(), DecodeError>;
    /// Pulls the next fully decoded frame, if the decoder has buffered
    /// enough input to produce one.
    fn receive_frame(&mut self) -> Result<Option<MediaFrame>, DecodeError>;
    /// Drops any buffered input/output state (on a flush packet or a seek).
    fn flush(&mut self);
}

/// Converts a raw decoded [`MediaFrame`] into a [`BlockPayload`]
/// (spec.md §4.3 `materialize_frame`): pixel-format conversion/scaling for
/// video, resample/interleave-to-16-bit for audio, markup stripping for
/// subtitles.
pub trait FrameMaterializer: Send + Sync {
    /// Writes the materialized payload for `frame` into `out`.
    fn materialize(&self, frame: &MediaFrame, out: &mut BlockPayload) -> Result<(), DecodeError>;
}

/// Per-media-type presentation sink (spec.md §6 `Renderer interface`).
pub trait Renderer: Send {
    /// Blocks until the renderer's backing surface/device is ready.
    fn wait_for_ready_state(&mut self);
    /// Resumes active presentation.
    fn play(&mut self);
    /// Pauses active presentation.
    fn pause(&mut self);
    /// Stops presentation and releases transient resources.
    fn stop(&mut self);
    /// Releases renderer resources. Idempotent.
    fn close(&mut self);
    /// Invalidates any renderer-side caches tied to the pre-seek timeline.
    fn seek(&mut self);
    /// Called once per render tick regardless of whether a new block was
    /// selected, so the renderer can, e.g., interpolate.
    fn update(&mut self, wall_clock: Ticks);
    /// Presents `block` at `wall_clock`.
    fn render(&mut self, block: &MediaBlock, wall_clock: Ticks);
}

/// Presentation-thread invoker priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiPriority {
    /// Deliver as soon as the presentation thread is idle.
    Normal,
    /// Deliver ahead of normal-priority work.
    High,
}

/// Minimal platform surface the engine needs from its host
/// (spec.md §6 `Platform interface`); the legacy byte-copy/DLL-path members
/// of the original interface have no Rust-native equivalent and are not
/// part of this trait — see DESIGN.md.
pub trait PlatformOps: Send + Sync {
    /// Marshals `action` onto the presentation thread.
    fn ui_invoke(&self, priority: UiPriority, action: Box<dyn FnOnce() + Send>);

    /// Creates a renderer for the given media type.
    fn create_renderer(&self, media_type: MediaType) -> Box<dyn Renderer>;

    /// Whether the host is running in a design-time/preview context, where
    /// some failures (e.g. resource-leak detection) are tolerated.
    fn is_in_design_time(&self) -> bool {
        false
    }
}

/// Log level accompanying a [`Connector::on_message_logged`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Fine-grained diagnostic detail.
    Trace,
    /// Debugging detail.
    Debug,
    /// Notable but expected events.
    Info,
    /// Recovered-from problems.
    Warn,
    /// Unrecoverable problems.
    Error,
}

/// Host event sink (spec.md §4.8, §6 `Connector interface`).
///
/// All methods have empty default bodies: a host implements only the
/// events it cares about. The engine swallows any panic raised by a
/// listener rather than letting it propagate into the pipeline (spec.md
/// §7 "Listener exceptions are swallowed").
#[allow(unused_variables)]
pub trait Connector: Send + Sync {
    /// Allows the host to adjust container configuration before `open`.
    fn on_media_initializing(&self, options: &mut ContainerOptions, url: &str) {}
    /// Allows the host to change media/selection options and pick streams.
    fn on_media_opening(&self, selection: &mut crate::config::SelectionOptions, info: &MediaInfo) {}
    /// The source finished opening successfully.
    fn on_media_opened(&self) {}
    /// A `change_media` command started.
    fn on_media_changing(&self) {}
    /// A `change_media` command completed successfully.
    fn on_media_changed(&self) {}
    /// The source was closed.
    fn on_media_closed(&self) {}
    /// A fatal error occurred.
    fn on_media_failed(&self, error: &MediaError) {}
    /// Playback reached the end of the media.
    fn on_media_ended(&self) {}
    /// Sync-buffering started.
    fn on_buffering_started(&self) {}
    /// Sync-buffering ended.
    fn on_buffering_ended(&self) {}
    /// A seek command started executing.
    fn on_seeking_started(&self) {}
    /// A seek command finished executing.
    fn on_seeking_ended(&self) {}
    /// The observable playback position changed.
    fn on_position_changed(&self, ticks: Ticks) {}
    /// An observable property changed.
    fn on_property_changed(&self, name: crate::state::EngineProperty) {}
    /// A structured log message was emitted.
    fn on_message_logged(&self, level: LogLevel, aspect: Aspect, text: &str) {}
}
