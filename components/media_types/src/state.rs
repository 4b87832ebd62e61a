//! Observable engine state (spec.md §3 `EngineState`)

use crate::ticks::Ticks;

/// Coarse playback/lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStateKind {
    /// No source loaded, nothing in progress.
    Idle,
    /// A direct `Open` command is in flight.
    Opening,
    /// Opened and ready, not yet playing.
    Ready,
    /// Actively playing.
    Playing,
    /// Paused.
    Paused,
    /// Stopped (includes the post-`MediaEnded` resting state).
    Stopped,
    /// Reached end of stream (transient; followed by `Stopped`).
    Ended,
    /// A direct `Close` command is in flight.
    Closing,
    /// Sync-buffering or any other state where the clock is held by the
    /// decoder rather than the command coordinator.
    Manual,
    /// An unrecoverable error occurred; the engine remains usable for a
    /// subsequent `open`.
    Failed,
}

/// Codec/track metadata surfaced for UI binding.
#[derive(Debug, Clone, Default)]
pub struct MediaMetadata {
    /// Format/container name.
    pub format_name: Option<String>,
    /// Media title, if present in container metadata.
    pub title: Option<String>,
    /// Video codec name, if a video component is active.
    pub video_codec: Option<String>,
    /// Audio codec name, if an audio component is active.
    pub audio_codec: Option<String>,
    /// Reported or measured frame rate.
    pub frame_rate: Option<f64>,
    /// Pixel width, if a video component is active.
    pub video_width: Option<u32>,
    /// Pixel height, if a video component is active.
    pub video_height: Option<u32>,
}

/// The engine's observable projection: everything a property-binding host
/// would subscribe to.
///
/// Mutations are funneled through [`EngineState::set`]-style methods that
/// return whether the value actually changed, so the caller knows whether a
/// `PropertyChanged` notification is owed.
#[derive(Debug, Clone)]
pub struct EngineState {
    /// Current lifecycle/playback state.
    pub media_state: MediaStateKind,
    /// Last-observed playback position.
    pub position: Ticks,
    /// Natural (container-reported) duration, if known.
    pub natural_duration: Option<Ticks>,
    /// Whether a source is currently open.
    pub is_open: bool,
    /// Whether the source is a live, non-seekable stream.
    pub is_live: bool,
    /// Whether a seek is currently executing.
    pub is_seeking: bool,
    /// Whether the decoder is sync-buffering.
    pub is_buffering: bool,
    /// Buffering progress in `[0, 1]`.
    pub buffering_progress: f64,
    /// Download/read progress in `[0, 1]`.
    pub download_progress: f64,
    /// Codec/track metadata.
    pub metadata: MediaMetadata,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            media_state: MediaStateKind::Idle,
            position: Ticks::ZERO,
            natural_duration: None,
            is_open: false,
            is_live: false,
            is_seeking: false,
            is_buffering: false,
            buffering_progress: 0.0,
            download_progress: 0.0,
            metadata: MediaMetadata::default(),
        }
    }
}

/// A single observed property mutation, used to drive
/// `Connector::on_property_changed` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineProperty {
    /// `media_state` changed.
    MediaState,
    /// `position` changed.
    Position,
    /// `natural_duration` changed.
    NaturalDuration,
    /// `is_open` changed.
    IsOpen,
    /// `is_live` changed.
    IsLive,
    /// `is_seeking` changed.
    IsSeeking,
    /// `is_buffering` changed.
    IsBuffering,
    /// `buffering_progress` changed.
    BufferingProgress,
    /// `download_progress` changed.
    DownloadProgress,
    /// `metadata` changed.
    Metadata,
}

impl EngineState {
    /// Sets `media_state`, returning the property tag iff it changed.
    pub fn set_media_state(&mut self, value: MediaStateKind) -> Option<EngineProperty> {
        if self.media_state == value {
            return None;
        }
        self.media_state = value;
        Some(EngineProperty::MediaState)
    }

    /// Sets `position`, returning the property tag iff it changed.
    pub fn set_position(&mut self, value: Ticks) -> Option<EngineProperty> {
        if self.position == value {
            return None;
        }
        self.position = value;
        Some(EngineProperty::Position)
    }

    /// Sets `is_buffering`, returning the property tag iff it changed.
    pub fn set_is_buffering(&mut self, value: bool) -> Option<EngineProperty> {
        if self.is_buffering == value {
            return None;
        }
        self.is_buffering = value;
        Some(EngineProperty::IsBuffering)
    }

    /// Sets `is_seeking`, returning the property tag iff it changed.
    pub fn set_is_seeking(&mut self, value: bool) -> Option<EngineProperty> {
        if self.is_seeking == value {
            return None;
        }
        self.is_seeking = value;
        Some(EngineProperty::IsSeeking)
    }

    /// Sets `is_open`, returning the property tag iff it changed.
    pub fn set_is_open(&mut self, value: bool) -> Option<EngineProperty> {
        if self.is_open == value {
            return None;
        }
        self.is_open = value;
        Some(EngineProperty::IsOpen)
    }

    /// Sets `is_live`, returning the property tag iff it changed.
    pub fn set_is_live(&mut self, value: bool) -> Option<EngineProperty> {
        if self.is_live == value {
            return None;
        }
        self.is_live = value;
        Some(EngineProperty::IsLive)
    }

    /// Sets `natural_duration`, returning the property tag iff it changed.
    pub fn set_natural_duration(&mut self, value: Option<Ticks>) -> Option<EngineProperty> {
        if self.natural_duration == value {
            return None;
        }
        self.natural_duration = value;
        Some(EngineProperty::NaturalDuration)
    }

    /// Sets `buffering_progress`, returning the property tag iff it changed.
    pub fn set_buffering_progress(&mut self, value: f64) -> Option<EngineProperty> {
        if self.buffering_progress == value {
            return None;
        }
        self.buffering_progress = value;
        Some(EngineProperty::BufferingProgress)
    }

    /// Sets `download_progress`, returning the property tag iff it changed.
    pub fn set_download_progress(&mut self, value: f64) -> Option<EngineProperty> {
        if self.download_progress == value {
            return None;
        }
        self.download_progress = value;
        Some(EngineProperty::DownloadProgress)
    }

    /// Replaces `metadata` unconditionally, always reporting a change: the
    /// metadata struct has no cheap equality check worth maintaining.
    pub fn set_metadata(&mut self, value: MediaMetadata) -> EngineProperty {
        self.metadata = value;
        EngineProperty::Metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_report_change_only_once() {
        let mut state = EngineState::default();
        assert_eq!(
            state.set_media_state(MediaStateKind::Playing),
            Some(EngineProperty::MediaState)
        );
        assert_eq!(state.set_media_state(MediaStateKind::Playing), None);
    }

    #[test]
    fn default_state_is_idle_and_closed() {
        let state = EngineState::default();
        assert_eq!(state.media_state, MediaStateKind::Idle);
        assert!(!state.is_open);
        assert_eq!(state.position, Ticks::ZERO);
    }
}
