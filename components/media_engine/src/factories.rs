//! Construction-time injected factories.
//!
//! The container/decoder backend is out of scope for this workspace
//! (spec.md §1), and neither factory is part of the fixed, spec-enumerated
//! `PlatformOps` method list (spec.md §6), so they are plain constructor
//! closures rather than additional port-trait methods: the host supplies one
//! of each when building an [`crate::Engine`], the same way it supplies a
//! [`mediacore_types::Connector`] and [`mediacore_types::PlatformOps`].

use mediacore_types::{
    ComponentDecoder, FrameMaterializer, MediaContainer, OpenError, SelectionOptions, StreamInfo,
};
use std::sync::Arc;

/// Builds a fresh container instance for one `open()` call.
///
/// A new container is constructed per open so that a prior session's demuxer
/// state never leaks into the next one.
pub type ContainerFactory = Arc<dyn Fn() -> Box<dyn MediaContainer> + Send + Sync>;

/// Builds the decoder handle and frame materializer for one selected stream.
pub type DecoderFactory = Arc<
    dyn Fn(&StreamInfo, &SelectionOptions) -> Result<(Box<dyn ComponentDecoder>, Box<dyn FrameMaterializer>), OpenError>
        + Send
        + Sync,
>;
