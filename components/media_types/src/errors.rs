//! Error kinds (spec.md §7)

use thiserror::Error;

/// Logging/error "aspect" a message or failure is attributed to, matching
/// the host-visible `MessageLogged(level, aspect, text)` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    /// Command coordinator activity.
    EngineCommands,
    /// Reader worker activity.
    EngineReading,
    /// Decoder worker activity.
    EngineDecoding,
    /// Renderer worker activity.
    EngineRendering,
    /// Container (demuxer facade) activity.
    Container,
    /// Per-component container activity.
    ContainerComponent,
    /// Resource-counting activity (open handle tracking at close).
    ReferenceCounter,
}

impl Aspect {
    /// Stable string form used in `tracing` targets and connector events.
    pub fn as_str(self) -> &'static str {
        match self {
            Aspect::EngineCommands => "Engine.Commands",
            Aspect::EngineReading => "Engine.Reading",
            Aspect::EngineDecoding => "Engine.Decoding",
            Aspect::EngineRendering => "Engine.Rendering",
            Aspect::Container => "Container",
            Aspect::ContainerComponent => "Container.Component",
            Aspect::ReferenceCounter => "ReferenceCounter",
        }
    }
}

/// Failure opening a container/source. Fatal for the `Open` command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpenError {
    /// I/O failure reaching or reading the source.
    #[error("io error opening source: {0}")]
    Io(String),
    /// The source could not be demuxed as any known container format.
    #[error("unrecognized container format: {0}")]
    Format(String),
    /// The container opened but exposed no usable streams.
    #[error("no streams found in source")]
    NoStreams,
    /// Opening was aborted (e.g. by a superseding direct command).
    #[error("open aborted")]
    Aborted,
}

/// Transient failure reading the next packet. Never fatal by itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("read error: {0}")]
pub struct ReadError(pub String);

/// Per-packet decode failure. Never fatal unless no component can produce
/// frames within the read-timeout window.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("decode error: {0}")]
pub struct DecodeError(pub String);

/// Seek failure, recovered by clamping or restoring the pre-seek position.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("seek error: {0}")]
pub struct SeekError(pub String);

/// Failure during `change_media`; state reverts to `Paused`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("change media error: {0}")]
pub struct ChangeError(pub String);

/// The unified error type surfaced by the engine's public API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    /// See [`OpenError`].
    #[error(transparent)]
    Open(#[from] OpenError),
    /// See [`ReadError`].
    #[error(transparent)]
    Read(#[from] ReadError),
    /// See [`DecodeError`].
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// See [`SeekError`].
    #[error(transparent)]
    Seek(#[from] SeekError),
    /// See [`ChangeError`].
    #[error(transparent)]
    Change(#[from] ChangeError),
    /// A catastrophic resource leak was detected at close.
    #[error("resource leak detected: {0} handle(s) outstanding")]
    ResourceLeak(usize),
    /// An invalid parameter was supplied to a public API call.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The requested operation does not apply to the engine's current state.
    #[error("invalid operation in current state: {0}")]
    InvalidState(String),
}

impl MediaError {
    /// The aspect this error should be logged/dispatched under.
    pub fn aspect(&self) -> Aspect {
        match self {
            MediaError::Open(_) => Aspect::Container,
            MediaError::Read(_) => Aspect::EngineReading,
            MediaError::Decode(_) => Aspect::EngineDecoding,
            MediaError::Seek(_) => Aspect::EngineCommands,
            MediaError::Change(_) => Aspect::EngineCommands,
            MediaError::ResourceLeak(_) => Aspect::ReferenceCounter,
            MediaError::InvalidParameter(_) | MediaError::InvalidState(_) => Aspect::EngineCommands,
        }
    }

    /// True for failures that must surface as `MediaFailed` to the host
    /// (as opposed to being trapped and logged).
    pub fn is_fatal(&self) -> bool {
        matches!(self, MediaError::Open(_) | MediaError::ResourceLeak(_))
    }
}

/// Outcome of a mutating command future (spec.md §6, §9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command completed normally.
    Ok,
    /// The command was superseded/cancelled before it ran, or the engine
    /// was already disposed.
    Cancelled,
    /// The command ran but failed.
    Failed(MediaError),
}

impl CommandOutcome {
    /// True if this outcome is `Ok`.
    pub fn is_ok(&self) -> bool {
        matches!(self, CommandOutcome::Ok)
    }
}
