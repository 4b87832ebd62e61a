//! Per-media-type [`BlockBuffer`] trio (spec.md §3: one `BlockBuffer` per
//! media type)

use mediacore_buffer::BlockBuffer;
use mediacore_types::{EngineTuning, MediaType};
use parking_lot::Mutex;

/// Owns the three [`BlockBuffer`]s (video/audio/subtitle), each behind its
/// own lock so the decode and render workers never contend across media
/// types for an unrelated one.
pub struct BlockBufferSet {
    video: Mutex<BlockBuffer>,
    audio: Mutex<BlockBuffer>,
    subtitle: Mutex<BlockBuffer>,
}

impl BlockBufferSet {
    /// Builds a buffer set sized per `tuning`.
    pub fn new(tuning: &EngineTuning) -> Self {
        Self {
            video: Mutex::new(BlockBuffer::new(MediaType::Video, tuning.max_video_blocks).expect("nonzero capacity")),
            audio: Mutex::new(BlockBuffer::new(MediaType::Audio, tuning.max_audio_blocks).expect("nonzero capacity")),
            subtitle: Mutex::new(
                BlockBuffer::new(MediaType::Subtitle, tuning.max_subtitle_blocks).expect("nonzero capacity"),
            ),
        }
    }

    /// The buffer for `media_type`, if it is one of the three backed types.
    pub fn get(&self, media_type: MediaType) -> Option<&Mutex<BlockBuffer>> {
        match media_type {
            MediaType::Video => Some(&self.video),
            MediaType::Audio => Some(&self.audio),
            MediaType::Subtitle => Some(&self.subtitle),
            MediaType::Data | MediaType::None => None,
        }
    }

    /// Clears every buffer, returning all blocks to their pools.
    pub fn clear_all(&self) {
        self.video.lock().clear();
        self.audio.lock().clear();
        self.subtitle.lock().clear();
    }
}
