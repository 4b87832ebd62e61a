//! Groups the (at most) one Audio/Video/Subtitle component and elects the
//! synchronization reference (spec.md §3 `ComponentSet`)

use crate::component::MediaComponent;
use mediacore_types::{MediaType, Ticks};

/// Aggregated packet-buffering posture across the set's audio/video
/// components (spec.md §3 `PacketBufferState`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketBufferState {
    /// Combined buffered duration.
    pub length: Ticks,
    /// Combined buffered packet count.
    pub count: usize,
    /// Combined count threshold.
    pub count_threshold: usize,
    /// Whether every considered component reports `has_enough_packets`.
    pub has_enough: bool,
}

/// Holds at most one component per media type and exposes the
/// synchronization-reference ("main") stream.
#[derive(Default)]
pub struct ComponentSet {
    video: Option<MediaComponent>,
    audio: Option<MediaComponent>,
    subtitle: Option<MediaComponent>,
}

impl ComponentSet {
    /// Builds an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the video component.
    pub fn set_video(&mut self, component: MediaComponent) {
        self.video = Some(component);
    }

    /// Installs the audio component.
    pub fn set_audio(&mut self, component: MediaComponent) {
        self.audio = Some(component);
    }

    /// Installs the subtitle component.
    pub fn set_subtitle(&mut self, component: MediaComponent) {
        self.subtitle = Some(component);
    }

    /// The video component, if present.
    pub fn video(&self) -> Option<&MediaComponent> {
        self.video.as_ref()
    }

    /// The audio component, if present.
    pub fn audio(&self) -> Option<&MediaComponent> {
        self.audio.as_ref()
    }

    /// The subtitle component, if present.
    pub fn subtitle(&self) -> Option<&MediaComponent> {
        self.subtitle.as_ref()
    }

    /// The component for `media_type`, if present.
    pub fn get(&self, media_type: MediaType) -> Option<&MediaComponent> {
        match media_type {
            MediaType::Video => self.video(),
            MediaType::Audio => self.audio(),
            MediaType::Subtitle => self.subtitle(),
            MediaType::Data | MediaType::None => None,
        }
    }

    /// Drops every installed component.
    pub fn clear(&mut self) {
        self.video = None;
        self.audio = None;
        self.subtitle = None;
    }

    /// The synchronization-reference media type: Video (not attached-pic) >
    /// Audio > Video (attached-pic) > Subtitle.
    pub fn main(&self) -> Option<MediaType> {
        match &self.video {
            Some(video) if !video.is_attached_pic() => return Some(MediaType::Video),
            _ => {}
        }
        if self.audio.is_some() {
            return Some(MediaType::Audio);
        }
        if self.video.is_some() {
            return Some(MediaType::Video);
        }
        if self.subtitle.is_some() {
            return Some(MediaType::Subtitle);
        }
        None
    }

    /// Earliest `start_time` across installed components.
    pub fn playback_start_time(&self) -> Ticks {
        [self.video(), self.audio(), self.subtitle()]
            .into_iter()
            .flatten()
            .map(MediaComponent::start_time)
            .min()
            .unwrap_or(Ticks::ZERO)
    }

    /// Longest known `duration` across installed components, `None` if no
    /// installed component reports one.
    pub fn playback_duration(&self) -> Option<Ticks> {
        [self.video(), self.audio(), self.subtitle()]
            .into_iter()
            .flatten()
            .filter_map(MediaComponent::duration)
            .max()
    }

    /// Aggregated buffer state across the audio and video components (the
    /// streams the reader paces against); `None` if neither is installed.
    pub fn packet_buffer_state(&self, count_threshold_each: usize) -> Option<PacketBufferState> {
        let mut considered = [self.video(), self.audio()].into_iter().flatten().peekable();
        considered.peek()?;

        let mut length = Ticks::ZERO;
        let mut count = 0usize;
        let mut has_enough = true;
        let mut seen = 0usize;
        for component in considered {
            let (component_count, component_duration) = component.buffer_state();
            length += component_duration;
            count += component_count;
            has_enough &= component.has_enough_packets();
            seen += 1;
        }

        Some(PacketBufferState {
            length,
            count,
            count_threshold: count_threshold_each * seen,
            has_enough,
        })
    }

    /// The smaller of the audio/video buffered durations, `Ticks::ZERO` if
    /// neither is installed.
    pub fn least_buffered_duration(&self) -> Ticks {
        [self.video(), self.audio()]
            .into_iter()
            .flatten()
            .map(|component| component.buffer_state().1)
            .min()
            .unwrap_or(Ticks::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::MediaComponent;
    use mediacore_types::{BlockPayload, ComponentDecoder, DecodeError, FrameMaterializer, MediaFrame, MediaPacket};

    struct StubDecoder;
    impl ComponentDecoder for StubDecoder {
        fn send_packet(&mut self, _packet: &MediaPacket) -> Result<(), DecodeError> {
            Ok(())
        }
        fn receive_frame(&mut self) -> Result<Option<MediaFrame>, DecodeError> {
            Ok(None)
        }
        fn flush(&mut self) {}
    }

    struct NoopMaterializer;
    impl FrameMaterializer for NoopMaterializer {
        fn materialize(&self, _frame: &MediaFrame, out: &mut BlockPayload) -> Result<(), DecodeError> {
            *out = BlockPayload::Empty;
            Ok(())
        }
    }

    fn component(media_type: MediaType, start: f64, is_attached_pic: bool) -> MediaComponent {
        MediaComponent::new(
            Box::new(StubDecoder),
            Box::new(NoopMaterializer),
            media_type,
            0,
            "codec".into(),
            Ticks::from_secs_f64(start),
            Some(Ticks::from_secs_f64(10.0)),
            is_attached_pic,
            1,
            Ticks::from_secs_f64(1.0),
        )
    }

    #[test]
    fn main_prefers_video_over_audio() {
        let mut set = ComponentSet::new();
        set.set_video(component(MediaType::Video, 0.0, false));
        set.set_audio(component(MediaType::Audio, 0.0, false));
        assert_eq!(set.main(), Some(MediaType::Video));
    }

    #[test]
    fn main_prefers_audio_over_attached_pic_video() {
        let mut set = ComponentSet::new();
        set.set_video(component(MediaType::Video, 0.0, true));
        set.set_audio(component(MediaType::Audio, 0.0, false));
        assert_eq!(set.main(), Some(MediaType::Audio));
    }

    #[test]
    fn main_falls_back_to_attached_pic_video_without_audio() {
        let mut set = ComponentSet::new();
        set.set_video(component(MediaType::Video, 0.0, true));
        assert_eq!(set.main(), Some(MediaType::Video));
    }

    #[test]
    fn main_falls_back_to_subtitle_when_nothing_else_installed() {
        let mut set = ComponentSet::new();
        set.set_subtitle(component(MediaType::Subtitle, 0.0, false));
        assert_eq!(set.main(), Some(MediaType::Subtitle));
    }

    #[test]
    fn empty_set_has_no_main() {
        assert_eq!(ComponentSet::new().main(), None);
    }

    #[test]
    fn playback_start_time_is_the_minimum_across_components() {
        let mut set = ComponentSet::new();
        set.set_video(component(MediaType::Video, 2.0, false));
        set.set_audio(component(MediaType::Audio, 0.5, false));
        assert_eq!(set.playback_start_time(), Ticks::from_secs_f64(0.5));
    }

    #[test]
    fn packet_buffer_state_none_without_audio_or_video() {
        let mut set = ComponentSet::new();
        set.set_subtitle(component(MediaType::Subtitle, 0.0, false));
        assert!(set.packet_buffer_state(1).is_none());
    }
}
