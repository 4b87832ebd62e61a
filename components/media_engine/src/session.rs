//! One open source's pipeline resources and background worker threads
//! (spec.md §5 "Concurrency & Resource Model")

use crate::dispatcher::EventDispatcher;
use mediacore_clock::RealTimeClock;
use mediacore_component::ComponentSet;
use mediacore_pipeline::{
    BlockBufferSet, CommandCoordinator, DecodePipeline, DecodeWorker, PipelineFlags, ReadWorker, RenderContext,
    RenderWorker, RendererSet,
};
use mediacore_types::{Aspect, EngineState, EngineTuning, LogLevel, MediaContainer, MediaStateKind};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Everything rebuilt on every `open()`/`change_media()` and torn down by
/// [`SessionResources::shutdown`]: the demuxer, the selected components,
/// their block buffers, the installed renderers, and the three background
/// threads driving the reader/decoder/render cycles against the engine's
/// persistent clock and command coordinator.
pub struct SessionResources {
    pub container: Arc<Mutex<Box<dyn MediaContainer>>>,
    pub components: Arc<Mutex<ComponentSet>>,
    pub blocks: Arc<BlockBufferSet>,
    pub renderers: Arc<RendererSet>,
    pub flags: Arc<PipelineFlags>,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl SessionResources {
    /// Builds the session's resources and spawns its reader/decoder/render
    /// threads (spec.md §5: "parallel threads for Reader and Decoder, a
    /// periodic timer callback for the Renderer").
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        container: Box<dyn MediaContainer>,
        components: ComponentSet,
        tuning: EngineTuning,
        clock: Arc<RealTimeClock>,
        coordinator: Arc<CommandCoordinator>,
        state: Arc<RwLock<EngineState>>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        let container = Arc::new(Mutex::new(container));
        let components = Arc::new(Mutex::new(components));
        let blocks = Arc::new(BlockBufferSet::new(&tuning));
        let renderers = Arc::new(RendererSet::new());
        let flags = Arc::new(PipelineFlags::new());
        let stop = Arc::new(AtomicBool::new(false));

        let reader = std::thread::Builder::new()
            .name("mediacore-reader".into())
            .spawn({
                let container = container.clone();
                let components = components.clone();
                let flags = flags.clone();
                let coordinator = coordinator.clone();
                let dispatcher = dispatcher.clone();
                let stop = stop.clone();
                move || {
                    while !stop.load(Ordering::Acquire) {
                        let outcome = ReadWorker::run_cycle(&container, &components, &flags, &coordinator);
                        if let Some(err) = outcome.error {
                            dispatcher.message_logged(LogLevel::Warn, Aspect::EngineReading, err.to_string());
                        }
                        if outcome.should_back_off {
                            std::thread::sleep(tuning.low_priority_wait);
                        }
                    }
                }
            })
            .expect("failed to spawn reader thread");

        let decoder = std::thread::Builder::new()
            .name("mediacore-decoder".into())
            .spawn({
                let clock = clock.clone();
                let container = container.clone();
                let components = components.clone();
                let blocks = blocks.clone();
                let renderers = renderers.clone();
                let coordinator = coordinator.clone();
                let flags = flags.clone();
                let state = state.clone();
                let dispatcher = dispatcher.clone();
                let stop = stop.clone();
                move || {
                    let mut pre_buffering_state = None;
                    while !stop.load(Ordering::Acquire) {
                        let pipeline = DecodePipeline {
                            clock: &clock,
                            container: &container,
                            components: &components,
                            blocks: &blocks,
                            renderers: &renderers,
                            coordinator: &coordinator,
                            flags: &flags,
                            tuning: &tuning,
                        };
                        let report = DecodeWorker::run_cycle(pipeline);
                        apply_decode_report(&report, &state, &dispatcher, &mut pre_buffering_state);
                        if report.should_back_off {
                            std::thread::sleep(tuning.low_priority_wait);
                        }
                    }
                }
            })
            .expect("failed to spawn decoder thread");

        let render = std::thread::Builder::new()
            .name("mediacore-render".into())
            .spawn({
                let clock = clock.clone();
                let blocks = blocks.clone();
                let renderers = renderers.clone();
                let coordinator = coordinator.clone();
                let flags = flags.clone();
                let stop = stop.clone();
                move || {
                    while !stop.load(Ordering::Acquire) {
                        let ctx = RenderContext {
                            clock: &clock,
                            blocks: &blocks,
                            renderers: &renderers,
                            coordinator: &coordinator,
                            flags: &flags,
                        };
                        RenderWorker::run_cycle(ctx);
                        std::thread::sleep(tuning.render_tick_interval);
                    }
                }
            })
            .expect("failed to spawn render thread");

        Self {
            container,
            components,
            blocks,
            renderers,
            flags,
            stop,
            workers: vec![reader, decoder, render],
        }
    }

    /// Signals all three worker threads to stop and joins them. Blocking,
    /// but bounded by each worker's own backoff interval (spec.md §5
    /// "suspension points").
    pub fn shutdown(mut self) {
        self.flags.set_read_aborted(true);
        self.container.lock().signal_abort_reads();
        self.stop.store(true, Ordering::Release);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        self.renderers.close_all();
        self.container.lock().close();
    }
}

/// Turns one decode cycle's facts into `EngineState` mutations and
/// `Connector` dispatches. Lives here rather than in `mediacore-pipeline`
/// because that crate's workers only report facts, never touch engine
/// state or the host connector directly.
fn apply_decode_report(
    report: &mediacore_pipeline::DecodeCycleReport,
    state: &Arc<RwLock<EngineState>>,
    dispatcher: &Arc<EventDispatcher>,
    pre_buffering_state: &mut Option<MediaStateKind>,
) {
    if report.entered_sync_buffering {
        let mut guard = state.write();
        *pre_buffering_state = Some(guard.media_state);
        let changed_buffering = guard.set_is_buffering(true);
        let changed_state = guard.set_media_state(MediaStateKind::Manual);
        drop(guard);
        dispatcher.buffering(true);
        if let Some(prop) = changed_buffering {
            dispatcher.property_changed(prop);
        }
        if let Some(prop) = changed_state {
            dispatcher.property_changed(prop);
        }
    }
    if report.exited_sync_buffering {
        let mut guard = state.write();
        let changed_buffering = guard.set_is_buffering(false);
        let restored = pre_buffering_state.take().unwrap_or(MediaStateKind::Stopped);
        let changed_state = guard.set_media_state(restored);
        drop(guard);
        dispatcher.buffering(false);
        if let Some(prop) = changed_buffering {
            dispatcher.property_changed(prop);
        }
        if let Some(prop) = changed_state {
            dispatcher.property_changed(prop);
        }
    }

    if let Some(position) = report.sampled_position {
        let changed = state.write().set_position(position);
        if changed.is_some() {
            dispatcher.position_changed(position);
        }
    }

    if report.media_ended {
        {
            let mut state = state.write();
            state.set_media_state(MediaStateKind::Ended);
        }
        dispatcher.media_ended();
        let changed = state.write().set_media_state(MediaStateKind::Stopped);
        if let Some(prop) = changed {
            dispatcher.property_changed(prop);
        }
    }
}
