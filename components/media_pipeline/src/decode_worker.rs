//! Decode worker cycle (spec.md §4.5 "Decoder loop")

use crate::blocks::BlockBufferSet;
use crate::command::{CommandCoordinator, PriorityCommand};
use crate::flags::PipelineFlags;
use crate::renderers::RendererSet;
use crate::seek::SeekReport;
use mediacore_clock::RealTimeClock;
use mediacore_component::ComponentSet;
use mediacore_types::{CommandOutcome, EngineTuning, MediaContainer, MediaError, MediaType};
use mediacore_types::Ticks;
use parking_lot::Mutex;

/// Read-only context a decode cycle (and the seek engine it may delegate
/// to) needs. All fields are shared references, so this bundle is itself
/// `Copy` and can be passed around cheaply instead of threading a long
/// parameter list through every helper.
#[derive(Clone, Copy)]
pub struct DecodePipeline<'a> {
    /// Shared playback clock.
    pub clock: &'a RealTimeClock,
    /// The demuxer facade. Single-owner: the reader and the seek engine
    /// both go through this same lock (spec.md §5 "container seeker/reader
    /// mutual exclusion").
    pub container: &'a Mutex<Box<dyn MediaContainer>>,
    /// Installed per-media-type components.
    pub components: &'a Mutex<ComponentSet>,
    /// The three per-media-type block buffers.
    pub blocks: &'a BlockBufferSet,
    /// Installed renderers.
    pub renderers: &'a RendererSet,
    /// Command coordinator.
    pub coordinator: &'a CommandCoordinator,
    /// Shared pipeline flags.
    pub flags: &'a PipelineFlags,
    /// Engine tuning constants.
    pub tuning: &'a EngineTuning,
}

/// Facts produced by one [`DecodeWorker::run_cycle`] call.
#[derive(Debug, Default, Clone)]
pub struct DecodeCycleReport {
    /// Frames materialized into a block this cycle.
    pub frames_decoded: usize,
    /// Sync-buffering started this cycle.
    pub entered_sync_buffering: bool,
    /// Sync-buffering ended this cycle.
    pub exited_sync_buffering: bool,
    /// End of media was detected this cycle (all components drained past
    /// end of stream).
    pub media_ended: bool,
    /// The clock position sampled at the end of this cycle.
    pub sampled_position: Option<Ticks>,
    /// Decoding bitrate sampled off the main stream's buffer.
    pub decoding_bitrate: Option<f64>,
    /// The priority command consumed this cycle, if any.
    pub command_processed: Option<PriorityCommand>,
    /// The seek executed this cycle, if any (owns the rest of the cycle
    /// when present; no further decode work runs after it).
    pub seek_report: Option<SeekReport>,
    /// True if the caller should back off before the next cycle.
    pub should_back_off: bool,
}

/// Drives one iteration of the decode loop: consumes at most one priority
/// command, then at most one seek, then feeds packets through every
/// installed component into its block buffer.
pub struct DecodeWorker;

impl DecodeWorker {
    /// Runs one decode cycle.
    pub fn run_cycle(pipeline: DecodePipeline<'_>) -> DecodeCycleReport {
        pipeline.coordinator.decode_gate().begin();
        let report = Self::run_cycle_inner(pipeline);
        pipeline.coordinator.decode_gate().end();
        report
    }

    fn run_cycle_inner(pipeline: DecodePipeline<'_>) -> DecodeCycleReport {
        let mut report = DecodeCycleReport::default();

        if let Some((command, completion)) = pipeline.coordinator.take_priority_command() {
            Self::apply_priority_command(pipeline, command);
            report.command_processed = Some(command);
            Self::complete(completion, CommandOutcome::Ok);
        }

        if let Some((request, completion)) = pipeline.coordinator.take_seek_command() {
            let seek_report = crate::seek::SeekEngine::execute(pipeline, request);
            let outcome = match &seek_report.error {
                Some(err) => CommandOutcome::Failed(MediaError::Seek(err.clone())),
                None => CommandOutcome::Ok,
            };
            Self::complete(completion, outcome);
            report.sampled_position = seek_report.new_position;
            report.seek_report = Some(seek_report);
            return report;
        }

        let main_type = pipeline.components.lock().main();

        if let Some(main_type) = main_type {
            Self::run_sync_buffering(pipeline, main_type, &mut report);
        }

        let is_sync_buffering = pipeline.flags.is_sync_buffering();
        for media_type in MediaType::KNOWN {
            Self::fill_buffer(pipeline, media_type, is_sync_buffering, &mut report);
        }

        if !pipeline.flags.is_sync_buffering() && !pipeline.flags.is_ended() && report.frames_decoded == 0 {
            if let Some(main_type) = main_type {
                Self::detect_end_of_media(pipeline, main_type, &mut report);
            }
        }

        if let Some(main) = pipeline.components.lock().main() {
            if let Some(buffer) = pipeline.blocks.get(main) {
                report.decoding_bitrate = Some(buffer.lock().range_bitrate());
            }
        }

        report.sampled_position = Some(pipeline.clock.read_position());

        if report.frames_decoded == 0 && report.command_processed.is_none() {
            report.should_back_off = true;
        }

        report
    }

    /// `add_next_block(t)`: pulls the next ready frame from `t`'s
    /// component, if any, and materializes it into `t`'s block buffer.
    /// Returns whether a frame was added (so the caller can keep draining
    /// while the component has frames ready without blocking).
    fn add_next_block(pipeline: DecodePipeline<'_>, media_type: MediaType) -> bool {
        let components = pipeline.components.lock();
        let Some(component) = components.get(media_type) else {
            return false;
        };
        let frame = match component.receive_next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) | Err(_) => return false,
        };
        let Some(buffer) = pipeline.blocks.get(media_type) else {
            return false;
        };
        buffer.lock().add(&frame, component).is_ok()
    }

    /// True while `t`'s component may still hand back another frame:
    /// end-of-stream hasn't been observed for its underlying container
    /// stream yet.
    fn can_read_more_frames_of(pipeline: DecodePipeline<'_>, media_type: MediaType) -> bool {
        pipeline.components.lock().get(media_type).map(|c| !c.eof_reached()).unwrap_or(false)
    }

    /// Sync-buffering (spec.md §4.5 step 5): if the main block buffer no
    /// longer covers `wall_clock`, pause the clock and decode the main
    /// stream forward until it does, the buffer fills, or no more frames
    /// can be read. Resumes the clock once back in range; otherwise snaps
    /// `wall_clock` to the nearest available block so the next cycle
    /// doesn't keep drifting further out of range.
    fn run_sync_buffering(pipeline: DecodePipeline<'_>, main_type: MediaType, report: &mut DecodeCycleReport) {
        let Some(buffer) = pipeline.blocks.get(main_type) else {
            return;
        };

        let wall_clock = pipeline.clock.read_position();
        let in_range = buffer.lock().is_in_range(wall_clock);

        if !in_range && !pipeline.flags.is_sync_buffering() {
            pipeline.flags.set_sync_buffering(true);
            pipeline.clock.pause();
            report.entered_sync_buffering = true;
        }

        if !pipeline.flags.is_sync_buffering() {
            return;
        }

        let mut added_any = false;
        loop {
            let wall_clock = pipeline.clock.read_position();
            let (in_range, is_full) = {
                let buf = buffer.lock();
                (buf.is_in_range(wall_clock), buf.is_full())
            };
            if in_range || (is_full && added_any) {
                break;
            }
            if !Self::can_read_more_frames_of(pipeline, main_type) {
                break;
            }
            if !Self::add_next_block(pipeline, main_type) {
                break;
            }
            added_any = true;
            report.frames_decoded += 1;
        }

        let wall_clock = pipeline.clock.read_position();
        let mut buf = buffer.lock();
        if buf.is_in_range(wall_clock) {
            drop(buf);
            pipeline.flags.set_sync_buffering(false);
            pipeline.clock.start();
            report.exited_sync_buffering = true;
        } else if !buf.is_empty() {
            let snapped = buf.block_at(wall_clock).map(|b| b.start_time);
            drop(buf);
            if let Some(snapped) = snapped {
                pipeline.clock.update(snapped);
            }
        }
    }

    /// Bounded fill for `media_type`'s block buffer (spec.md §4.5 step 6):
    /// keeps adding while the buffer isn't full or its filled range covers
    /// less than 75% of a full window, but breaks early once there's
    /// already enough runway (outside sync-buffering) or the buffer is
    /// full (while sync-buffering, where filling the main stream already
    /// took priority).
    fn fill_buffer(pipeline: DecodePipeline<'_>, media_type: MediaType, is_sync_buffering: bool, report: &mut DecodeCycleReport) {
        let Some(buffer) = pipeline.blocks.get(media_type) else {
            return;
        };
        loop {
            let wall_clock = pipeline.clock.read_position();
            let (is_full, range_percent, capacity_percent, in_range) = {
                let buf = buffer.lock();
                (buf.is_full(), buf.get_range_percent(wall_clock), buf.capacity_percent(), buf.is_in_range(wall_clock))
            };

            if is_full && range_percent <= 0.75 {
                break;
            }
            if !is_sync_buffering && range_percent <= 0.75 && capacity_percent >= 0.25 && in_range {
                break;
            }
            if is_sync_buffering && is_full {
                break;
            }
            if !Self::add_next_block(pipeline, media_type) {
                break;
            }
            report.frames_decoded += 1;
        }
    }

    /// End-of-media detection (spec.md §4.5 step 7): once the main
    /// component can no longer produce frames and the wall clock has
    /// caught up to the last block in its buffer, pause at the buffer's
    /// range end and mark the cycle as having reached the end of media.
    fn detect_end_of_media(pipeline: DecodePipeline<'_>, main_type: MediaType, report: &mut DecodeCycleReport) {
        if Self::can_read_more_frames_of(pipeline, main_type) {
            return;
        }
        let Some(buffer) = pipeline.blocks.get(main_type) else {
            return;
        };
        let wall_clock = pipeline.clock.read_position();
        let mut buf = buffer.lock();
        let idx = buf.index_of(wall_clock);
        let len = buf.len() as isize;
        if idx < len - 1 {
            return;
        }
        let range_end = buf.range_end();
        drop(buf);

        pipeline.clock.pause();
        pipeline.clock.update(range_end);
        pipeline.renderers.invalidate_all();
        pipeline.flags.set_ended(true);
        report.media_ended = true;
    }

    fn apply_priority_command(pipeline: DecodePipeline<'_>, command: PriorityCommand) {
        match command {
            PriorityCommand::Play => {
                pipeline.flags.set_stopping(false);
                pipeline.clock.start();
                pipeline.renderers.play_all();
            }
            PriorityCommand::Pause => {
                pipeline.clock.pause();
                pipeline.renderers.pause_all();
            }
            PriorityCommand::Stop => {
                pipeline.flags.set_stopping(true);
                pipeline.clock.pause();
                pipeline.clock.reset();
                pipeline.blocks.clear_all();
                pipeline.renderers.stop_all();
                pipeline.flags.set_ended(false);
                pipeline.flags.set_at_eof(false);
                pipeline.flags.set_stopping(false);
            }
        }
    }

    fn complete(completion: Option<tokio::sync::oneshot::Sender<CommandOutcome>>, outcome: CommandOutcome) {
        if let Some(sender) = completion {
            let _ = sender.send(outcome);
        }
    }
}
