//! Integration tests for the single-session [`Engine`], against fake
//! `MediaContainer`/`ComponentDecoder`/`FrameMaterializer`/`Renderer`/
//! `PlatformOps`/`Connector` implementations in the style of
//! `mediacore-pipeline`'s own integration test harness.

use async_trait::async_trait;
use mediacore_engine::{ContainerFactory, DecoderFactory, Engine};
use mediacore_types::{
    CommandOutcome, Connector, ContainerOptions, DecodeError, EngineConfig, EngineProperty, MediaBlock,
    MediaContainer, MediaError, MediaFrame, MediaInfo, MediaPacket, MediaSource, MediaStateKind, MediaType,
    OpenError, PacketOrEndOfStream, PlatformOps, ReadError, Renderer, SeekError, SelectionOptions, StreamInfo,
    Ticks, UiPriority,
};
use mediacore_types::{BlockPayload, ComponentDecoder, FrameMaterializer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Append-only event log shared between a fake and its test assertions.
#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    fn contains(&self, event: &str) -> bool {
        self.events.lock().iter().any(|e| e == event)
    }

    fn contains_prefix(&self, prefix: &str) -> bool {
        self.events.lock().iter().any(|e| e.starts_with(prefix))
    }
}

/// A container that always yields one video stream and immediately signals
/// end of stream on every `read`, so no decode work ever actually happens
/// (the engine-level tests exercise command plumbing, not decode throughput
/// — that belongs to `mediacore-pipeline`'s own test suite).
struct FakeContainer {
    fail_open: bool,
}

#[async_trait]
impl MediaContainer for FakeContainer {
    async fn open(&mut self, _source: MediaSource, _options: &ContainerOptions) -> Result<MediaInfo, OpenError> {
        if self.fail_open {
            return Err(OpenError::Format("unrecognized test format".into()));
        }
        Ok(MediaInfo {
            format_name: "fake".into(),
            streams: vec![StreamInfo {
                index: 0,
                media_type: MediaType::Video,
                codec_id: "fake-codec".into(),
                start_time: Ticks::ZERO,
                duration: Some(Ticks::from_secs_f64(10.0)),
                bitrate: None,
                is_attached_pic: false,
            }],
            chapters: Vec::new(),
            programs: Vec::new(),
            duration: Some(Ticks::from_secs_f64(10.0)),
            bitrate: None,
            best_streams_by_type: HashMap::new(),
            is_live: false,
            is_seekable: true,
        })
    }

    fn read(&mut self) -> Result<PacketOrEndOfStream, ReadError> {
        Ok(PacketOrEndOfStream::EndOfStream)
    }

    fn seek(&mut self, _target: Ticks) -> Result<Option<MediaFrame>, SeekError> {
        Ok(None)
    }

    fn signal_abort_reads(&mut self) {}

    fn close(&mut self) {}
}

struct FakeDecoder;
impl ComponentDecoder for FakeDecoder {
    fn send_packet(&mut self, _packet: &MediaPacket) -> Result<(), DecodeError> {
        Ok(())
    }
    fn receive_frame(&mut self) -> Result<Option<MediaFrame>, DecodeError> {
        Ok(None)
    }
    fn flush(&mut self) {}
}

struct FakeMaterializer;
impl FrameMaterializer for FakeMaterializer {
    fn materialize(&self, _frame: &MediaFrame, _out: &mut BlockPayload) -> Result<(), DecodeError> {
        Ok(())
    }
}

struct FakeRenderer {
    media_type: MediaType,
    log: Arc<EventLog>,
}

impl Renderer for FakeRenderer {
    fn wait_for_ready_state(&mut self) {}
    fn play(&mut self) {
        self.log.push(format!("renderer_play:{}", self.media_type.label()));
    }
    fn pause(&mut self) {
        self.log.push(format!("renderer_pause:{}", self.media_type.label()));
    }
    fn stop(&mut self) {
        self.log.push(format!("renderer_stop:{}", self.media_type.label()));
    }
    fn close(&mut self) {}
    fn seek(&mut self) {}
    fn update(&mut self, _wall_clock: Ticks) {}
    fn render(&mut self, _block: &MediaBlock, _wall_clock: Ticks) {}
}

struct FakePlatform {
    renderer_log: Arc<EventLog>,
}

impl PlatformOps for FakePlatform {
    fn ui_invoke(&self, _priority: UiPriority, action: Box<dyn FnOnce() + Send>) {
        action();
    }

    fn create_renderer(&self, media_type: MediaType) -> Box<dyn Renderer> {
        Box::new(FakeRenderer { media_type, log: self.renderer_log.clone() })
    }
}

struct FakeConnector {
    log: Arc<EventLog>,
}

impl Connector for FakeConnector {
    fn on_media_opened(&self) {
        self.log.push("media_opened");
    }
    fn on_media_changed(&self) {
        self.log.push("media_changed");
    }
    fn on_media_closed(&self) {
        self.log.push("media_closed");
    }
    fn on_media_failed(&self, error: &MediaError) {
        self.log.push(format!("media_failed:{error}"));
    }
    fn on_media_ended(&self) {
        self.log.push("media_ended");
    }
    fn on_seeking_started(&self) {
        self.log.push("seeking_started");
    }
    fn on_seeking_ended(&self) {
        self.log.push("seeking_ended");
    }
    fn on_position_changed(&self, ticks: Ticks) {
        self.log.push(format!("position_changed:{}", ticks.as_millis()));
    }
    fn on_property_changed(&self, name: EngineProperty) {
        self.log.push(format!("property_changed:{name:?}"));
    }
}

fn container_factory(fail_open: bool) -> ContainerFactory {
    Arc::new(move || Box::new(FakeContainer { fail_open }) as Box<dyn MediaContainer>)
}

fn decoder_factory() -> DecoderFactory {
    Arc::new(|_stream: &StreamInfo, _selection: &SelectionOptions| {
        Ok((Box::new(FakeDecoder) as Box<dyn ComponentDecoder>, Box::new(FakeMaterializer) as Box<dyn FrameMaterializer>))
    })
}

struct Harness {
    engine: Engine,
    connector_log: Arc<EventLog>,
    renderer_log: Arc<EventLog>,
}

fn build_engine(fail_open: bool) -> Harness {
    let connector_log = Arc::new(EventLog::default());
    let renderer_log = Arc::new(EventLog::default());
    let platform = Arc::new(FakePlatform { renderer_log: renderer_log.clone() });
    let connector = Arc::new(FakeConnector { log: connector_log.clone() });
    let engine = Engine::new(platform, connector, container_factory(fail_open), decoder_factory(), EngineConfig::default());
    Harness { engine, connector_log, renderer_log }
}

#[tokio::test]
async fn open_builds_ready_session_and_dispatches_media_opened() {
    let h = build_engine(false);
    let outcome = h.engine.open(MediaSource::Url("fake://video".into())).await;
    assert!(outcome.is_ok());

    let state = h.engine.state();
    assert!(state.is_open);
    assert_eq!(state.media_state, MediaStateKind::Stopped);
    assert_eq!(state.natural_duration, Some(Ticks::from_secs_f64(10.0)));
    assert!(h.connector_log.contains("media_opened"));

    h.engine.dispose().await;
}

#[tokio::test]
async fn open_failure_dispatches_media_failed_and_sets_failed_state() {
    let h = build_engine(true);
    let outcome = h.engine.open(MediaSource::Url("fake://bad".into())).await;
    assert!(matches!(outcome, CommandOutcome::Failed(_)));
    assert_eq!(h.engine.state().media_state, MediaStateKind::Failed);
    assert!(h.connector_log.contains_prefix("media_failed:"));
    h.engine.dispose().await;
}

#[tokio::test]
async fn play_before_open_is_rejected() {
    let h = build_engine(false);
    let outcome = h.engine.play().await;
    assert!(matches!(outcome, CommandOutcome::Failed(MediaError::InvalidState(_))));
}

#[tokio::test]
async fn play_then_pause_drives_renderers_and_media_state() {
    let h = build_engine(false);
    h.engine.open(MediaSource::Url("fake://video".into())).await;

    let outcome = h.engine.play().await;
    assert!(outcome.is_ok());
    assert_eq!(h.engine.state().media_state, MediaStateKind::Playing);
    assert!(h.renderer_log.contains("renderer_play:video"));

    let outcome = h.engine.pause().await;
    assert!(outcome.is_ok());
    assert_eq!(h.engine.state().media_state, MediaStateKind::Paused);
    assert!(h.renderer_log.contains("renderer_pause:video"));

    h.engine.dispose().await;
}

#[tokio::test]
async fn stop_transitions_to_stopped() {
    let h = build_engine(false);
    h.engine.open(MediaSource::Url("fake://video".into())).await;
    h.engine.play().await;

    let outcome = h.engine.stop().await;
    assert!(outcome.is_ok());
    assert_eq!(h.engine.state().media_state, MediaStateKind::Stopped);

    h.engine.dispose().await;
}

#[tokio::test]
async fn close_resets_observable_state() {
    let h = build_engine(false);
    h.engine.open(MediaSource::Url("fake://video".into())).await;

    let outcome = h.engine.close().await;
    assert!(outcome.is_ok());
    let state = h.engine.state();
    assert!(!state.is_open);
    assert_eq!(state.media_state, MediaStateKind::Idle);
    assert_eq!(state.position, Ticks::ZERO);
    assert!(h.connector_log.contains("media_closed"));
}

#[tokio::test]
async fn seek_before_open_is_rejected() {
    let h = build_engine(false);
    let outcome = h.engine.request_seek(Ticks::from_secs_f64(5.0)).await;
    assert!(matches!(outcome, CommandOutcome::Failed(MediaError::InvalidState(_))));
}

#[tokio::test]
async fn seek_after_open_dispatches_seeking_started_and_ended() {
    let h = build_engine(false);
    h.engine.open(MediaSource::Url("fake://video".into())).await;

    let outcome = h.engine.request_seek(Ticks::from_secs_f64(3.0)).await;
    assert!(outcome.is_ok());
    assert!(h.connector_log.contains("seeking_started"));
    assert!(h.connector_log.contains("seeking_ended"));

    h.engine.dispose().await;
}

#[tokio::test]
async fn dispose_cancels_subsequent_commands() {
    let h = build_engine(false);
    h.engine.open(MediaSource::Url("fake://video".into())).await;
    h.engine.dispose().await;
    assert!(h.engine.is_disposed());

    assert_eq!(h.engine.open(MediaSource::Url("fake://again".into())).await, CommandOutcome::Cancelled);
    assert_eq!(h.engine.play().await, CommandOutcome::Cancelled);
}

#[test]
fn set_volume_validates_range() {
    let h = build_engine(false);
    assert!(h.engine.set_volume(0.5).is_ok());
    assert!(matches!(h.engine.set_volume(1.5), Err(MediaError::InvalidParameter(_))));
    assert!(matches!(h.engine.set_volume(-0.1), Err(MediaError::InvalidParameter(_))));
}

#[test]
fn set_balance_validates_range() {
    let h = build_engine(false);
    assert!(h.engine.set_balance(-0.5).is_ok());
    assert!(matches!(h.engine.set_balance(1.5), Err(MediaError::InvalidParameter(_))));
}

#[test]
fn set_speed_ratio_rejects_non_positive() {
    let h = build_engine(false);
    assert!(h.engine.set_speed_ratio(2.0).is_ok());
    assert!(matches!(h.engine.set_speed_ratio(0.0), Err(MediaError::InvalidParameter(_))));
    assert!(matches!(h.engine.set_speed_ratio(-1.0), Err(MediaError::InvalidParameter(_))));
}
