//! # mediacore-types
//!
//! Data model, error kinds, and external trait boundaries shared by every
//! other `mediacore-*` crate: ticks, media/packet/frame/block types,
//! configuration, and the `MediaContainer` / `Renderer` / `Connector` /
//! `PlatformOps` / `InputStream` port traits.
//!
//! Nothing in this crate decodes media or touches a real container format —
//! see `ports` for the boundary a host/codec-backend crate implements.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod block;
mod config;
mod errors;
mod frame;
mod media_type;
mod packet;
mod ports;
mod state;
mod ticks;

pub use block::{BlockPayload, BlockState, MediaBlock};
pub use config::{
    AutoBehavior, ContainerOptions, ControllerDefaults, EngineConfig, EngineTuning, LowResMode,
    SelectionOptions,
};
pub use errors::{Aspect, ChangeError, CommandOutcome, DecodeError, MediaError, OpenError, ReadError, SeekError};
pub use frame::{ClosedCaptionPacket, FrameExtra, MediaFrame};
pub use media_type::MediaType;
pub use packet::{MediaPacket, PacketClass, PacketOrEndOfStream};
pub use ports::{
    Chapter, ComponentDecoder, Connector, FrameMaterializer, InputStream, LogLevel, MediaContainer,
    MediaInfo, MediaSource, PlatformOps, Program, Renderer, SeekWhence, StreamInfo, UiPriority,
};
pub use state::{EngineProperty, EngineState, MediaMetadata, MediaStateKind};
pub use ticks::{Ticks, TICKS_PER_MILLISECOND, TICKS_PER_SECOND};
