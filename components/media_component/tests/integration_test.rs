use mediacore_component::{ComponentSet, MediaComponent};
use mediacore_types::{
    BlockPayload, ComponentDecoder, DecodeError, FrameExtra, FrameMaterializer, MediaFrame, MediaPacket, MediaType,
    Ticks,
};

struct CountingDecoder {
    pending: Vec<MediaFrame>,
}

impl ComponentDecoder for CountingDecoder {
    fn send_packet(&mut self, packet: &MediaPacket) -> Result<(), DecodeError> {
        self.pending.push(MediaFrame {
            stream_index: packet.stream_index,
            media_type: packet.media_type,
            start_time: Ticks::from_secs_f64(self.pending.len() as f64),
            duration: Ticks::from_secs_f64(1.0),
            has_valid_start_time: true,
            compressed_size: packet.size,
            extra: FrameExtra::Data,
        });
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<MediaFrame>, DecodeError> {
        Ok(self.pending.pop())
    }

    fn flush(&mut self) {
        self.pending.clear();
    }
}

struct PassthroughMaterializer;
impl FrameMaterializer for PassthroughMaterializer {
    fn materialize(&self, frame: &MediaFrame, out: &mut BlockPayload) -> Result<(), DecodeError> {
        *out = BlockPayload::Data {
            bytes: vec![0u8; frame.compressed_size],
        };
        Ok(())
    }
}

fn build_component(media_type: MediaType, is_attached_pic: bool) -> MediaComponent {
    MediaComponent::new(
        Box::new(CountingDecoder { pending: Vec::new() }),
        Box::new(PassthroughMaterializer),
        media_type,
        0,
        "test-codec".into(),
        Ticks::ZERO,
        Some(Ticks::from_secs_f64(10.0)),
        is_attached_pic,
        2,
        Ticks::from_secs_f64(1.0),
    )
}

#[test]
fn component_set_elects_video_main_over_audio_and_subtitle() {
    let mut set = ComponentSet::new();
    set.set_video(build_component(MediaType::Video, false));
    set.set_audio(build_component(MediaType::Audio, false));
    set.set_subtitle(build_component(MediaType::Subtitle, false));

    assert_eq!(set.main(), Some(MediaType::Video));
    assert!(set.video().is_some());
    assert!(set.audio().is_some());
    assert!(set.subtitle().is_some());
}

#[test]
fn attached_pic_video_without_audio_is_still_main() {
    let mut set = ComponentSet::new();
    set.set_video(build_component(MediaType::Video, true));

    assert_eq!(set.main(), Some(MediaType::Video));
}

#[test]
fn packet_feed_drains_into_frames_in_lifo_decode_order() {
    let component = build_component(MediaType::Video, false);
    for i in 0..3 {
        component.send_packet(MediaPacket::normal(0, MediaType::Video, 10 + i, 1));
    }

    let mut seen = 0;
    while let Some(frame) = component.receive_next_frame().unwrap() {
        assert_eq!(frame.stream_index, 0);
        seen += 1;
    }
    assert_eq!(seen, 3);
}

#[test]
fn clearing_the_set_drops_every_component() {
    let mut set = ComponentSet::new();
    set.set_video(build_component(MediaType::Video, false));
    set.set_audio(build_component(MediaType::Audio, false));
    set.clear();

    assert!(set.video().is_none());
    assert!(set.audio().is_none());
    assert_eq!(set.main(), None);
}

#[test]
fn packet_buffer_state_aggregates_audio_and_video_only() {
    let mut set = ComponentSet::new();
    let video = build_component(MediaType::Video, false);
    video.send_packet(MediaPacket::normal(0, MediaType::Video, 10, Ticks::from_secs_f64(0.5).0));
    set.set_video(video);

    let audio = build_component(MediaType::Audio, false);
    audio.send_packet(MediaPacket::normal(0, MediaType::Audio, 10, Ticks::from_secs_f64(0.5).0));
    set.set_audio(audio);

    set.set_subtitle(build_component(MediaType::Subtitle, false));

    let state = set.packet_buffer_state(2).unwrap();
    assert_eq!(state.count, 2);
    assert_eq!(state.count_threshold, 4);
    assert!(!state.has_enough);
}
