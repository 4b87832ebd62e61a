//! # mediacore-pipeline
//!
//! The reader/decoder/renderer worker triplet (spec.md §4.5), the
//! [`CommandCoordinator`] that admits and orders Direct/Priority/Seek
//! commands across them (spec.md §4.6), and the [`SeekEngine`] the decode
//! worker delegates to (spec.md §4.7).
//!
//! Each worker's `run_cycle` returns a small fact-only report — frames
//! decoded, buffering transitions, sampled position, and so on. Mutating
//! `EngineState` and dispatching `Connector` events from those facts, and
//! driving the actual background threads/timer that call these cycles, is
//! the `mediacore-engine` crate's job; this crate only provides the
//! mechanism.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod blocks;
mod command;
mod decode_worker;
mod flags;
mod read_worker;
mod render_worker;
mod renderers;
mod seek;

pub use blocks::BlockBufferSet;
pub use command::{
    CommandCoordinator, CycleGate, DirectCommandGuard, DirectCommandKind, PriorityCommand, SeekMode, SeekRequest,
};
pub use decode_worker::{DecodeCycleReport, DecodePipeline, DecodeWorker};
pub use flags::PipelineFlags;
pub use read_worker::{ReadCycleOutcome, ReadWorker};
pub use render_worker::{RenderContext, RenderTickReport, RenderWorker};
pub use renderers::RendererSet;
pub use seek::{SeekEngine, SeekReport};
