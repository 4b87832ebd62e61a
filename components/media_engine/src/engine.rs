//! The public, single-session [`Engine`] (spec.md §6 "Programmatic API")

use crate::dispatcher::EventDispatcher;
use crate::factories::{ContainerFactory, DecoderFactory};
use crate::session::SessionResources;
use mediacore_clock::RealTimeClock;
use mediacore_component::{ComponentSet, MediaComponent};
use mediacore_pipeline::{CommandCoordinator, DirectCommandKind, PriorityCommand, SeekMode, SeekRequest};
use mediacore_types::{
    AutoBehavior, CommandOutcome, Connector, ContainerOptions, ControllerDefaults, EngineConfig, EngineState,
    EngineTuning, MediaError, MediaInfo, MediaMetadata, MediaSource, MediaStateKind, MediaType, OpenError,
    PlatformOps, SelectionOptions, StreamInfo, Ticks,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// One media element: open/close/play/pause/seek plus the observable
/// [`EngineState`] it drives (spec.md §6).
///
/// Unlike a host that multiplexes many independent media elements, this
/// type owns a single playback session at a time; a second `open()` call
/// implicitly tears down whatever session preceded it. `clock` and
/// `coordinator` live for the whole engine, not per-session, so
/// direct-command mutual exclusion and (after `change_media`) wall-clock
/// continuity hold across sessions.
pub struct Engine {
    platform: Arc<dyn PlatformOps>,
    connector: Arc<dyn Connector>,
    dispatcher: Arc<EventDispatcher>,
    container_factory: ContainerFactory,
    decoder_factory: DecoderFactory,
    clock: Arc<RealTimeClock>,
    coordinator: Arc<CommandCoordinator>,
    state: Arc<RwLock<EngineState>>,
    tuning: EngineTuning,
    container_options: Mutex<ContainerOptions>,
    selection_options: Mutex<SelectionOptions>,
    controller: Mutex<ControllerDefaults>,
    session: Mutex<Option<SessionResources>>,
    disposed: AtomicBool,
}

impl Engine {
    /// Builds an idle engine. `container_factory`/`decoder_factory` are
    /// invoked once per `open`/`change_media` to construct a fresh demuxer
    /// and per-stream decoder handles (spec.md §1: the codec backend is out
    /// of scope).
    pub fn new(
        platform: Arc<dyn PlatformOps>,
        connector: Arc<dyn Connector>,
        container_factory: ContainerFactory,
        decoder_factory: DecoderFactory,
        config: EngineConfig,
    ) -> Self {
        Self {
            dispatcher: Arc::new(EventDispatcher::new(platform.clone(), connector.clone())),
            platform,
            connector,
            container_factory,
            decoder_factory,
            clock: Arc::new(RealTimeClock::new()),
            coordinator: Arc::new(CommandCoordinator::new()),
            state: Arc::new(RwLock::new(EngineState::default())),
            tuning: config.tuning,
            container_options: Mutex::new(config.container),
            selection_options: Mutex::new(config.selection),
            controller: Mutex::new(config.controller),
            session: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// A snapshot of the current observable state.
    pub fn state(&self) -> EngineState {
        self.state.read().clone()
    }

    /// True once [`Self::dispose`] has been called; every command returns
    /// `Cancelled` afterward.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Opens `source` as a direct command (spec.md §4.6, §6 `open`):
    /// cancels any pending priority/seek command, waits for the worker
    /// cycles to go idle, tears down any existing session, then builds and
    /// spawns a new one.
    pub async fn open(&self, source: MediaSource) -> CommandOutcome {
        if self.disposed.load(Ordering::Acquire) {
            return CommandOutcome::Cancelled;
        }
        let _guard = self.coordinator.begin_direct(DirectCommandKind::Open);

        if let Some(session) = self.session.lock().take() {
            session.shutdown();
        }
        self.set_media_state(MediaStateKind::Opening);

        let url = match &source {
            MediaSource::Url(url) => url.clone(),
            MediaSource::Stream(stream) => stream.stream_uri().to_string(),
        };

        let mut container_options = self.container_options.lock().clone();
        self.connector.on_media_initializing(&mut container_options, &url);

        let mut container = (self.container_factory)();
        let info = match container.open(source, &container_options).await {
            Ok(info) => info,
            Err(err) => return self.fail_open(MediaError::Open(err)),
        };

        let mut selection = self.selection_options.lock().clone();
        self.connector.on_media_opening(&mut selection, &info);

        let components = match self.build_components(&info, &selection) {
            Ok(components) => components,
            Err(err) => return self.fail_open(MediaError::Open(err)),
        };

        let installed_types: Vec<MediaType> = MediaType::KNOWN
            .into_iter()
            .filter(|&media_type| components.get(media_type).is_some())
            .collect();

        let session = SessionResources::spawn(
            container,
            components,
            self.tuning,
            self.clock.clone(),
            self.coordinator.clone(),
            self.state.clone(),
            self.dispatcher.clone(),
        );
        for media_type in installed_types {
            session.renderers.install(media_type, self.platform.create_renderer(media_type));
        }

        self.clock.pause();
        self.clock.reset();
        *self.session.lock() = Some(session);

        {
            let mut state = self.state.write();
            state.set_is_open(true);
            state.set_is_live(info.is_live);
            state.set_natural_duration(info.duration);
            state.set_metadata(self.build_metadata(&info));
            state.set_media_state(MediaStateKind::Stopped);
        }
        self.dispatcher.media_opened();

        self.apply_loaded_behavior();

        CommandOutcome::Ok
    }

    /// Switches to a different source in place (spec.md §6 `change_media`).
    ///
    /// Retains the current wall-clock position across the switch: if the
    /// new source is seekable, playback resumes from the same position it
    /// left off at; otherwise it starts fresh from the new source's start.
    pub async fn change_media(&self, source: MediaSource) -> CommandOutcome {
        if self.disposed.load(Ordering::Acquire) {
            return CommandOutcome::Cancelled;
        }
        let _guard = self.coordinator.begin_direct(DirectCommandKind::Change);
        self.dispatcher.media_changing();

        let retained_position = self.clock.read_position();
        if let Some(session) = self.session.lock().take() {
            session.shutdown();
        }

        let url = match &source {
            MediaSource::Url(url) => url.clone(),
            MediaSource::Stream(stream) => stream.stream_uri().to_string(),
        };
        let mut container_options = self.container_options.lock().clone();
        self.connector.on_media_initializing(&mut container_options, &url);

        let mut container = (self.container_factory)();
        let info = match container.open(source, &container_options).await {
            Ok(info) => info,
            Err(err) => return self.fail_open(MediaError::Open(err)),
        };

        let mut selection = self.selection_options.lock().clone();
        self.connector.on_media_opening(&mut selection, &info);

        let components = match self.build_components(&info, &selection) {
            Ok(components) => components,
            Err(err) => return self.fail_open(MediaError::Open(err)),
        };

        let installed_types: Vec<MediaType> = MediaType::KNOWN
            .into_iter()
            .filter(|&media_type| components.get(media_type).is_some())
            .collect();

        let session = SessionResources::spawn(
            container,
            components,
            self.tuning,
            self.clock.clone(),
            self.coordinator.clone(),
            self.state.clone(),
            self.dispatcher.clone(),
        );
        for media_type in installed_types {
            session.renderers.install(media_type, self.platform.create_renderer(media_type));
        }
        *self.session.lock() = Some(session);

        if info.is_seekable {
            self.clock.update(retained_position);
        } else {
            self.clock.pause();
            self.clock.reset();
        }

        {
            let mut state = self.state.write();
            state.set_is_live(info.is_live);
            state.set_natural_duration(info.duration);
            state.set_metadata(self.build_metadata(&info));
            state.set_media_state(MediaStateKind::Stopped);
        }
        self.dispatcher.media_changed();
        self.apply_loaded_behavior();

        CommandOutcome::Ok
    }

    /// Closes the current source as a direct command (spec.md §6 `close`).
    /// A no-op (`Ok`) if nothing is open.
    pub async fn close(&self) -> CommandOutcome {
        if self.disposed.load(Ordering::Acquire) {
            return CommandOutcome::Cancelled;
        }
        let _guard = self.coordinator.begin_direct(DirectCommandKind::Close);

        let Some(session) = self.session.lock().take() else {
            return CommandOutcome::Ok;
        };
        session.shutdown();
        self.clock.pause();
        self.clock.reset();

        {
            let mut state = self.state.write();
            state.set_is_open(false);
            state.set_is_live(false);
            state.set_is_buffering(false);
            state.set_is_seeking(false);
            state.set_natural_duration(None);
            state.set_position(Ticks::ZERO);
            state.set_metadata(MediaMetadata::default());
            state.set_media_state(MediaStateKind::Idle);
        }
        self.dispatcher.media_closed();

        CommandOutcome::Ok
    }

    /// Resumes/starts playback (spec.md §4.6 priority command `Play`).
    pub async fn play(&self) -> CommandOutcome {
        if self.disposed.load(Ordering::Acquire) {
            return CommandOutcome::Cancelled;
        }
        if !Self::can_play(&self.state()) {
            return CommandOutcome::Failed(MediaError::InvalidState("cannot play in the current state".into()));
        }
        let outcome = self.submit_priority(PriorityCommand::Play).await;
        if outcome.is_ok() {
            self.set_media_state(MediaStateKind::Playing);
        }
        outcome
    }

    /// Pauses playback (spec.md §4.6 priority command `Pause`).
    pub async fn pause(&self) -> CommandOutcome {
        if self.disposed.load(Ordering::Acquire) {
            return CommandOutcome::Cancelled;
        }
        if !Self::can_pause(&self.state()) {
            return CommandOutcome::Failed(MediaError::InvalidState("cannot pause in the current state".into()));
        }
        let outcome = self.submit_priority(PriorityCommand::Pause).await;
        if outcome.is_ok() {
            self.set_media_state(MediaStateKind::Paused);
        }
        outcome
    }

    /// Stops playback, rewinding state to the start (spec.md §4.6 priority
    /// command `Stop`).
    pub async fn stop(&self) -> CommandOutcome {
        if self.disposed.load(Ordering::Acquire) {
            return CommandOutcome::Cancelled;
        }
        if !self.state().is_open {
            return CommandOutcome::Failed(MediaError::InvalidState("nothing is open".into()));
        }
        let outcome = self.submit_priority(PriorityCommand::Stop).await;
        if outcome.is_ok() {
            self.set_media_state(MediaStateKind::Stopped);
        }
        outcome
    }

    /// Seeks to an absolute position (spec.md §4.7).
    pub async fn request_seek(&self, target: Ticks) -> CommandOutcome {
        self.run_seek(SeekMode::Absolute(target)).await
    }

    /// Steps to the next block of the main stream (spec.md §4.7).
    pub async fn request_step_forward(&self) -> CommandOutcome {
        self.run_seek(SeekMode::StepForward).await
    }

    /// Steps to the previous block of the main stream (spec.md §4.7).
    pub async fn request_step_backward(&self) -> CommandOutcome {
        self.run_seek(SeekMode::StepBackward).await
    }

    async fn run_seek(&self, mode: SeekMode) -> CommandOutcome {
        if self.disposed.load(Ordering::Acquire) {
            return CommandOutcome::Cancelled;
        }
        if !self.state().is_open {
            return CommandOutcome::Failed(MediaError::InvalidState("nothing is open".into()));
        }

        self.set_is_seeking(true);
        self.dispatcher.seeking(true);

        let (tx, rx) = oneshot::channel();
        self.coordinator.submit_seek(SeekRequest { mode }, Some(tx));
        let outcome = rx.await.unwrap_or(CommandOutcome::Cancelled);

        self.set_is_seeking(false);
        self.dispatcher.seeking(false);
        outcome
    }

    async fn submit_priority(&self, command: PriorityCommand) -> CommandOutcome {
        let (tx, rx) = oneshot::channel();
        self.coordinator.submit_priority(command, Some(tx));
        rx.await.unwrap_or(CommandOutcome::Cancelled)
    }

    /// Sets output volume, `[0, 1]` (spec.md §6 `set_volume`).
    pub fn set_volume(&self, volume: f64) -> Result<(), MediaError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(MediaError::InvalidParameter(format!("volume {volume} out of range [0, 1]")));
        }
        self.controller.lock().volume = volume;
        Ok(())
    }

    /// Sets stereo balance, `[-1, 1]` (spec.md §6 `set_balance`).
    pub fn set_balance(&self, balance: f64) -> Result<(), MediaError> {
        if !(-1.0..=1.0).contains(&balance) {
            return Err(MediaError::InvalidParameter(format!("balance {balance} out of range [-1, 1]")));
        }
        self.controller.lock().balance = balance;
        Ok(())
    }

    /// Sets the playback speed ratio, which must be positive (spec.md §6
    /// `set_speed_ratio`; [`RealTimeClock::set_speed_ratio`] panics rather
    /// than validates, so the non-positive case is rejected here first).
    pub fn set_speed_ratio(&self, ratio: f64) -> Result<(), MediaError> {
        if !(ratio > 0.0) {
            return Err(MediaError::InvalidParameter(format!("speed_ratio {ratio} must be positive")));
        }
        self.controller.lock().speed_ratio = ratio;
        self.clock.set_speed_ratio(ratio);
        Ok(())
    }

    /// Mutes/unmutes output.
    pub fn set_muted(&self, muted: bool) {
        self.controller.lock().is_muted = muted;
    }

    /// Enables/disables scrubbing (frame-stepping while dragging a
    /// position slider).
    pub fn set_scrubbing_enabled(&self, enabled: bool) {
        self.controller.lock().scrubbing_enabled = enabled;
    }

    /// Tears down any open session and marks the engine unusable. Every
    /// subsequent command returns `Cancelled`. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(session) = self.session.lock().take() {
            session.shutdown();
        }
    }

    fn can_play(state: &EngineState) -> bool {
        state.is_open
            && !matches!(
                state.media_state,
                MediaStateKind::Opening | MediaStateKind::Closing | MediaStateKind::Failed
            )
            && (state.is_live || state.natural_duration.map_or(true, |duration| state.position < duration))
    }

    fn can_pause(state: &EngineState) -> bool {
        state.is_open
            && !state.is_live
            && !matches!(
                state.media_state,
                MediaStateKind::Opening | MediaStateKind::Closing | MediaStateKind::Failed
            )
    }

    fn fail_open(&self, error: MediaError) -> CommandOutcome {
        self.set_media_state(MediaStateKind::Failed);
        self.dispatcher.media_failed(error.clone());
        CommandOutcome::Failed(error)
    }

    fn set_media_state(&self, value: MediaStateKind) {
        let changed = self.state.write().set_media_state(value);
        if let Some(property) = changed {
            self.dispatcher.property_changed(property);
        }
    }

    fn set_is_seeking(&self, value: bool) {
        let changed = self.state.write().set_is_seeking(value);
        if let Some(property) = changed {
            self.dispatcher.property_changed(property);
        }
    }

    /// Applies `ControllerDefaults::loaded_behavior` once a session is
    /// fully spun up (spec.md §6 "Configuration"). Manipulates the clock
    /// and the freshly-installed renderers directly rather than going
    /// through `submit_priority`, since a direct command (`Open`/`Change`)
    /// is still in flight and a priority command submitted now would be
    /// rejected as `Cancelled`.
    fn apply_loaded_behavior(&self) {
        let behavior = self.controller.lock().loaded_behavior;
        match behavior {
            AutoBehavior::Play => {
                self.clock.start();
                if let Some(session) = self.session.lock().as_ref() {
                    session.renderers.play_all();
                }
                self.set_media_state(MediaStateKind::Playing);
            }
            AutoBehavior::Pause | AutoBehavior::Manual => {}
            AutoBehavior::Stop => {
                if let Some(session) = self.session.lock().as_ref() {
                    session.renderers.stop_all();
                }
            }
        }
    }

    fn build_metadata(&self, info: &MediaInfo) -> MediaMetadata {
        MediaMetadata {
            format_name: Some(info.format_name.clone()),
            title: None,
            video_codec: info
                .streams
                .iter()
                .find(|stream| stream.media_type == MediaType::Video)
                .map(|stream| stream.codec_id.clone()),
            audio_codec: info
                .streams
                .iter()
                .find(|stream| stream.media_type == MediaType::Audio)
                .map(|stream| stream.codec_id.clone()),
            frame_rate: None,
            video_width: None,
            video_height: None,
        }
    }

    fn build_components(&self, info: &MediaInfo, selection: &SelectionOptions) -> Result<ComponentSet, OpenError> {
        let mut set = ComponentSet::new();
        let buffer_duration_threshold = Ticks::from_secs_f64(self.tuning.buffer_cache_length.as_secs_f64());
        const BUFFER_COUNT_THRESHOLD: usize = 2;

        if !selection.is_video_disabled {
            if let Some(stream) = Self::pick_stream(info, MediaType::Video, selection.video_stream) {
                let (decoder, materializer) = (self.decoder_factory)(stream, selection)?;
                set.set_video(MediaComponent::new(
                    decoder,
                    materializer,
                    MediaType::Video,
                    stream.index,
                    stream.codec_id.clone(),
                    stream.start_time,
                    stream.duration,
                    stream.is_attached_pic,
                    BUFFER_COUNT_THRESHOLD,
                    buffer_duration_threshold,
                ));
            }
        }
        if !selection.is_audio_disabled {
            if let Some(stream) = Self::pick_stream(info, MediaType::Audio, selection.audio_stream) {
                let (decoder, materializer) = (self.decoder_factory)(stream, selection)?;
                set.set_audio(MediaComponent::new(
                    decoder,
                    materializer,
                    MediaType::Audio,
                    stream.index,
                    stream.codec_id.clone(),
                    stream.start_time,
                    stream.duration,
                    stream.is_attached_pic,
                    BUFFER_COUNT_THRESHOLD,
                    buffer_duration_threshold,
                ));
            }
        }
        if !selection.is_subtitle_disabled {
            if let Some(stream) = Self::pick_stream(info, MediaType::Subtitle, selection.subtitle_stream) {
                let (decoder, materializer) = (self.decoder_factory)(stream, selection)?;
                set.set_subtitle(MediaComponent::new(
                    decoder,
                    materializer,
                    MediaType::Subtitle,
                    stream.index,
                    stream.codec_id.clone(),
                    stream.start_time,
                    stream.duration,
                    stream.is_attached_pic,
                    BUFFER_COUNT_THRESHOLD,
                    buffer_duration_threshold,
                ));
            }
        }

        if set.main().is_none() {
            return Err(OpenError::NoStreams);
        }
        Ok(set)
    }

    fn pick_stream(info: &MediaInfo, media_type: MediaType, explicit: Option<usize>) -> Option<&StreamInfo> {
        if let Some(index) = explicit {
            return info.streams.iter().find(|stream| stream.index == index && stream.media_type == media_type);
        }
        if let Some(&index) = info.best_streams_by_type.get(&media_type) {
            if let Some(stream) = info.streams.iter().find(|stream| stream.index == index) {
                return Some(stream);
            }
        }
        info.streams.iter().find(|stream| stream.media_type == media_type)
    }
}
