//! Error types for block-buffer management

use thiserror::Error;

/// Errors that can occur while constructing or mutating a [`crate::BlockBuffer`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A buffer was asked to hold zero blocks.
    #[error("block buffer capacity must be at least 1")]
    ZeroCapacity,
}
