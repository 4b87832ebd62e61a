//! # mediacore-component
//!
//! Per-stream [`MediaComponent`] (packet queue, decoder handle, frame
//! materializer) and [`ComponentSet`] (the at-most-one-per-media-type
//! grouping that elects the synchronization reference stream).

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod component;
mod component_set;
mod packet_queue;

pub use component::{DecoderState, MediaComponent};
pub use component_set::{ComponentSet, PacketBufferState};
pub use packet_queue::PacketQueue;
