//! # media_engine Component
//!
//! Top-level integration crate: the public [`Engine`] type that drives
//! open/close/play/pause/seek against a single playback session, backed by
//! `mediacore-pipeline`'s reader/decoder/render workers.
//!
//! # Overview
//!
//! This crate is the presentation-facing layer that ties together:
//!
//! - **Playback Orchestration**: using `mediacore-pipeline` for the
//!   command coordinator, block buffers, and worker cycles
//! - **Clocking**: using `mediacore-clock`'s `RealTimeClock` for wall-clock
//!   position tracking across sessions
//! - **Component Selection**: using `mediacore-component` to build the
//!   per-stream decode/materialize pipeline for a newly opened source
//! - **Host Integration**: dispatching [`mediacore_types::Connector`]
//!   events through an injected [`mediacore_types::PlatformOps`]
//!   presentation-thread invoker
//!
//! The container demuxer and codec decoders are out of scope for this
//! workspace; hosts supply them via [`ContainerFactory`]/[`DecoderFactory`]
//! closures at construction time.
//!
//! # Examples
//!
//! ```no_run
//! use mediacore_engine::Engine;
//! use mediacore_types::{EngineConfig, MediaSource};
//!
//! # async fn run(
//! #     platform: std::sync::Arc<dyn mediacore_types::PlatformOps>,
//! #     connector: std::sync::Arc<dyn mediacore_types::Connector>,
//! #     container_factory: mediacore_engine::ContainerFactory,
//! #     decoder_factory: mediacore_engine::DecoderFactory,
//! # ) {
//! let engine = Engine::new(platform, connector, container_factory, decoder_factory, EngineConfig::default());
//! engine.open(MediaSource::Url("https://example.com/video.mp4".into())).await;
//! engine.play().await;
//! engine.request_seek(mediacore_types::Ticks::from_secs_f64(30.0)).await;
//! engine.pause().await;
//! engine.dispose().await;
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod dispatcher;
mod engine;
mod factories;
mod session;

pub use engine::Engine;
pub use factories::{ContainerFactory, DecoderFactory};
