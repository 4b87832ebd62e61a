//! Cross-worker boolean flags shared without going through the command
//! coordinator's locks (spec.md §4.5)

use std::sync::atomic::{AtomicBool, Ordering};

macro_rules! flag_accessor {
    ($field:ident, $getter:ident, $setter:ident) => {
        /// Current value of this flag.
        pub fn $getter(&self) -> bool {
            self.$field.load(Ordering::Acquire)
        }
        /// Sets this flag.
        pub fn $setter(&self, value: bool) {
            self.$field.store(value, Ordering::Release);
        }
    };
}

/// Lock-free booleans read and written across the reader, decoder, and
/// render workers. Each worker only ever writes the flags it owns, but all
/// three may read any of them, so plain atomics are enough — no cycle ever
/// needs to observe more than one flag transition atomically together.
#[derive(Debug, Default)]
pub struct PipelineFlags {
    stopping: AtomicBool,
    read_aborted: AtomicBool,
    at_eof: AtomicBool,
    ended: AtomicBool,
    is_live: AtomicBool,
    is_sync_buffering: AtomicBool,
}

impl PipelineFlags {
    /// Builds a fresh flag set, all `false`.
    pub fn new() -> Self {
        Self::default()
    }

    flag_accessor!(stopping, is_stopping, set_stopping);
    flag_accessor!(read_aborted, is_read_aborted, set_read_aborted);
    flag_accessor!(at_eof, is_at_eof, set_at_eof);
    flag_accessor!(ended, is_ended, set_ended);
    flag_accessor!(is_live, is_live, set_is_live);
    flag_accessor!(is_sync_buffering, is_sync_buffering, set_sync_buffering);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_start_false_and_round_trip() {
        let flags = PipelineFlags::new();
        assert!(!flags.is_at_eof());
        flags.set_at_eof(true);
        assert!(flags.is_at_eof());
        flags.set_at_eof(false);
        assert!(!flags.is_at_eof());
    }
}
