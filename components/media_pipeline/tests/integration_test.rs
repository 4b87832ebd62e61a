use async_trait::async_trait;
use mediacore_buffer::BlockBuffer;
use mediacore_clock::RealTimeClock;
use mediacore_component::{ComponentSet, MediaComponent};
use mediacore_pipeline::{
    BlockBufferSet, CommandCoordinator, DecodePipeline, DecodeWorker, PriorityCommand, ReadWorker, RenderContext,
    RenderWorker, RendererSet, SeekMode, SeekRequest,
};
use mediacore_types::{
    BlockPayload, ComponentDecoder, ContainerOptions, DecodeError, EngineTuning, FrameExtra, FrameMaterializer,
    MediaContainer, MediaFrame, MediaInfo, MediaPacket, MediaSource, MediaType, OpenError, PacketClass,
    PacketOrEndOfStream, ReadError, Renderer, SeekError, Ticks,
};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A scripted, in-memory container: yields a fixed sequence of video
/// packets, then end-of-stream. `seek` always "succeeds" by handing back
/// no immediate frame, leaving the hunt loop to read further packets.
struct ScriptedContainer {
    queue: VecDeque<MediaPacket>,
    next_start: i64,
}

impl ScriptedContainer {
    fn with_video_packets(count: usize) -> Self {
        let mut queue = VecDeque::new();
        for _ in 0..count {
            queue.push_back(MediaPacket::normal(0, MediaType::Video, 1_000, Ticks::from_secs_f64(1.0).0));
        }
        Self { queue, next_start: 0 }
    }
}

#[async_trait]
impl MediaContainer for ScriptedContainer {
    async fn open(&mut self, _source: MediaSource, _options: &ContainerOptions) -> Result<MediaInfo, OpenError> {
        unimplemented!("not exercised by pipeline-level tests")
    }

    fn read(&mut self) -> Result<PacketOrEndOfStream, ReadError> {
        match self.queue.pop_front() {
            Some(packet) => Ok(PacketOrEndOfStream::Packet(packet)),
            None => Ok(PacketOrEndOfStream::EndOfStream),
        }
    }

    fn seek(&mut self, target: Ticks) -> Result<Option<MediaFrame>, SeekError> {
        self.next_start = target.as_secs_f64().max(0.0) as i64;
        self.queue.clear();
        for i in 0..8 {
            self.queue.push_back(MediaPacket::normal(
                0,
                MediaType::Video,
                1_000,
                Ticks::from_secs_f64(1.0).0,
            ));
            let _ = i;
        }
        Ok(None)
    }

    fn signal_abort_reads(&mut self) {}

    fn close(&mut self) {
        self.queue.clear();
    }
}

struct CountingDecoder {
    pending: Vec<MediaFrame>,
    next_start_secs: f64,
}

impl ComponentDecoder for CountingDecoder {
    fn send_packet(&mut self, packet: &MediaPacket) -> Result<(), DecodeError> {
        if packet.class == PacketClass::Normal {
            self.pending.push(MediaFrame {
                stream_index: packet.stream_index,
                media_type: packet.media_type,
                start_time: Ticks::from_secs_f64(self.next_start_secs),
                duration: Ticks::from_secs_f64(1.0),
                has_valid_start_time: true,
                compressed_size: packet.size,
                extra: FrameExtra::Data,
            });
            self.next_start_secs += 1.0;
        }
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

#[derive(Default)]
struct CountingRenderer {
    render_calls: usize,
    update_calls: usize,
    seek_calls: usize,
}

impl Renderer for CountingRenderer {
    fn wait_for_ready_state(&mut self) {}
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn stop(&mut self) {}
    fn close(&mut self) {}
    fn seek(&mut self) {
        self.seek_calls += 1;
    }
    fn update(&mut self, _wall_clock: Ticks) {
        self.update_calls += 1;
    }
    fn render(&mut self, _block: &mediacore_types::MediaBlock, _wall_clock: Ticks) {
        self.render_calls += 1;
    }
}

fn build_video_component() -> MediaComponent {
    MediaComponent::new(
        Box::new(CountingDecoder {
            pending: Vec::new(),
            next_start_secs: 0.0,
        }),
        Box::new(PassthroughMaterializer),
        MediaType::Video,
        0,
        "test-codec".into(),
        Ticks::ZERO,
        Some(Ticks::from_secs_f64(30.0)),
        false,
        1,
        Ticks::from_secs_f64(0.1),
    )
}

struct Harness {
    container: Mutex<Box<dyn MediaContainer>>,
    components: Mutex<ComponentSet>,
    blocks: BlockBufferSet,
    renderers: RendererSet,
    coordinator: CommandCoordinator,
    flags: mediacore_pipeline::PipelineFlags,
    tuning: EngineTuning,
    clock: RealTimeClock,
}

impl Harness {
    fn new(packet_count: usize) -> Self {
        let mut components = ComponentSet::new();
        components.set_video(build_video_component());

        Self {
            container: Mutex::new(Box::new(ScriptedContainer::with_video_packets(packet_count))),
            components: Mutex::new(components),
            blocks: BlockBufferSet::new(&EngineTuning::default()),
            renderers: RendererSet::new(),
            coordinator: CommandCoordinator::new(),
            flags: mediacore_pipeline::PipelineFlags::new(),
            tuning: EngineTuning::default(),
            clock: RealTimeClock::new(),
        }
    }

    fn pipeline(&self) -> DecodePipeline<'_> {
        DecodePipeline {
            clock: &self.clock,
            container: &self.container,
            components: &self.components,
            blocks: &self.blocks,
            renderers: &self.renderers,
            coordinator: &self.coordinator,
            flags: &self.flags,
            tuning: &self.tuning,
        }
    }

    fn render_ctx(&self) -> RenderContext<'_> {
        RenderContext {
            clock: &self.clock,
            blocks: &self.blocks,
            renderers: &self.renderers,
            coordinator: &self.coordinator,
            flags: &self.flags,
        }
    }
}

#[test]
fn read_then_decode_cycle_produces_a_block() {
    let harness = Harness::new(3);

    let outcome = ReadWorker::run_cycle(&harness.container, &harness.components, &harness.flags, &harness.coordinator);
    assert!(outcome.packet_routed);

    let report = DecodeWorker::run_cycle(harness.pipeline());
    assert_eq!(report.frames_decoded, 1);

    let video_buffer = harness.blocks.get(MediaType::Video).unwrap();
    assert_eq!(video_buffer.lock().len(), 1);
}

#[test]
fn play_command_starts_the_clock_and_renderers() {
    let harness = Harness::new(0);
    harness.renderers.install(MediaType::Video, Box::new(CountingRenderer::default()));

    harness.coordinator.submit_priority(PriorityCommand::Play, None);
    let report = DecodeWorker::run_cycle(harness.pipeline());

    assert_eq!(report.command_processed, Some(PriorityCommand::Play));
    assert!(harness.clock.is_running());
}

#[test]
fn end_to_end_reads_decodes_and_renders_a_frame() {
    let harness = Harness::new(5);
    harness.renderers.install(MediaType::Video, Box::new(CountingRenderer::default()));
    harness.coordinator.submit_priority(PriorityCommand::Play, None);

    // Drain one priority command, then feed frames through several
    // read+decode cycles.
    DecodeWorker::run_cycle(harness.pipeline());
    for _ in 0..5 {
        ReadWorker::run_cycle(&harness.container, &harness.components, &harness.flags, &harness.coordinator);
        DecodeWorker::run_cycle(harness.pipeline());
    }

    let video_buffer = harness.blocks.get(MediaType::Video).unwrap();
    assert!(video_buffer.lock().len() > 0);

    let tick = RenderWorker::run_cycle(harness.render_ctx());
    assert!(!tick.skipped);
}

#[test]
fn stop_command_clears_buffers_and_resets_clock() {
    let harness = Harness::new(2);
    harness.coordinator.submit_priority(PriorityCommand::Play, None);
    DecodeWorker::run_cycle(harness.pipeline());

    ReadWorker::run_cycle(&harness.container, &harness.components, &harness.flags, &harness.coordinator);
    DecodeWorker::run_cycle(harness.pipeline());
    assert!(harness.blocks.get(MediaType::Video).unwrap().lock().len() > 0);

    harness.coordinator.submit_priority(PriorityCommand::Stop, None);
    DecodeWorker::run_cycle(harness.pipeline());

    assert_eq!(harness.blocks.get(MediaType::Video).unwrap().lock().len(), 0);
    assert!(!harness.clock.is_running());
    assert_eq!(harness.clock.read_position(), Ticks::ZERO);
}

#[test]
fn seek_request_is_admitted_and_executed_by_the_decode_worker() {
    let harness = Harness::new(4);
    harness.coordinator.submit_priority(PriorityCommand::Play, None);
    DecodeWorker::run_cycle(harness.pipeline());

    for _ in 0..4 {
        ReadWorker::run_cycle(&harness.container, &harness.components, &harness.flags, &harness.coordinator);
        DecodeWorker::run_cycle(harness.pipeline());
    }

    harness.coordinator.submit_seek(
        SeekRequest {
            mode: SeekMode::Absolute(Ticks::from_secs_f64(10.0)),
        },
        None,
    );
    let report = DecodeWorker::run_cycle(harness.pipeline());

    assert!(report.seek_report.is_some());
    assert!(report.seek_report.unwrap().new_position.is_some());
}

#[test]
fn seek_rejected_while_another_seek_is_already_pending_is_coalesced_not_queued_twice() {
    let coordinator = CommandCoordinator::new();
    coordinator.submit_seek(
        SeekRequest {
            mode: SeekMode::Absolute(Ticks::from_secs_f64(1.0)),
        },
        None,
    );
    coordinator.submit_seek(
        SeekRequest {
            mode: SeekMode::Absolute(Ticks::from_secs_f64(2.0)),
        },
        None,
    );

    let (request, _) = coordinator.take_seek_command().unwrap();
    match request.mode {
        SeekMode::Absolute(target) => assert_eq!(target, Ticks::from_secs_f64(2.0)),
        _ => panic!("expected absolute seek"),
    }
    assert!(coordinator.take_seek_command().is_none());
}
