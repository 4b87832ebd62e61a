//! Seek engine (spec.md §4.7): packet-level seek plus frame-accurate snap
//!
//! Always runs inline on the decode worker's thread, between other decode
//! work, never as a separate thread: a seek request replaces the rest of
//! whatever decode cycle picks it up.

use crate::command::{SeekMode, SeekRequest};
use crate::decode_worker::DecodePipeline;
use mediacore_types::{MediaFrame, MediaType, PacketOrEndOfStream, SeekError, Ticks};

/// Outcome of one [`SeekEngine::execute`] call.
#[derive(Debug, Default, Clone)]
pub struct SeekReport {
    /// The position the clock was set to on completion, set even when the
    /// seek only partially succeeded via clamping/fallback.
    pub new_position: Option<Ticks>,
    /// True if this seek resolved via an in-window frame-accurate snap,
    /// without touching the container at all.
    pub snapped_in_place: bool,
    /// A recovered seek failure (logged by the engine, never raised as a
    /// fatal error — spec.md §7 "SeekError ... recovered via clamp or
    /// restore").
    pub error: Option<SeekError>,
}

/// Executes packet-level seeks and frame-accurate in-window snaps.
pub struct SeekEngine;

impl SeekEngine {
    /// Maximum packets read while hunting for the post-seek target before
    /// giving up and falling back to whatever position was reached.
    const MAX_HUNT_PACKETS: usize = 512;

    /// Runs one seek to completion (spec.md §4.7 steps 1-8).
    pub fn execute(pipeline: DecodePipeline<'_>, request: SeekRequest) -> SeekReport {
        let mut report = SeekReport::default();

        let was_running = pipeline.clock.is_running();
        pipeline.clock.pause();

        let target = match Self::compute_target(pipeline, request.mode) {
            Some(target) => target,
            None => {
                report.error = Some(SeekError("no main stream to seek against".into()));
                if was_running {
                    pipeline.clock.start();
                }
                return report;
            }
        };

        // Frame-accurate snap when the target already sits inside the main
        // buffer's playback window (tie-break/precision note: snap always
        // to the main block's discrete `start_time`).
        if let Some(snapped) = Self::try_snap_in_place(pipeline, target) {
            pipeline.clock.update(snapped);
            pipeline.renderers.invalidate_all();
            if was_running {
                pipeline.clock.start();
            }
            report.new_position = Some(snapped);
            report.snapped_in_place = true;
            return report;
        }

        // Out of window: flush every component and clear every buffer
        // (step 3), then reposition the demuxer.
        {
            let components = pipeline.components.lock();
            for media_type in MediaType::KNOWN {
                if let Some(component) = components.get(media_type) {
                    component.flush();
                }
            }
        }
        pipeline.blocks.clear_all();
        pipeline.flags.set_at_eof(false);
        pipeline.flags.set_ended(false);

        let adjusted_target = Self::adjust_for_monotonic_rewind(pipeline, target);

        let seek_result = {
            let mut container = pipeline.container.lock();
            container.seek(adjusted_target)
        };

        let first_frame = match seek_result {
            Ok(frame) => frame,
            Err(err) => {
                report.error = Some(err);
                let fallback = pipeline.clock.read_position();
                pipeline.clock.update(fallback);
                if was_running {
                    pipeline.clock.start();
                }
                report.new_position = Some(fallback);
                return report;
            }
        };

        if let Some(frame) = first_frame {
            Self::route_decoded_frame(pipeline, frame);
        }

        let reached = Self::hunt_for_target(pipeline, target);

        let final_position = Self::resolve_final_position(pipeline, target, reached);

        pipeline.clock.update(final_position);
        pipeline.renderers.invalidate_all();
        report.new_position = Some(final_position);

        if was_running {
            pipeline.clock.start();
        }

        report
    }

    fn try_snap_in_place(pipeline: DecodePipeline<'_>, target: Ticks) -> Option<Ticks> {
        let main = pipeline.components.lock().main()?;
        let buffer = pipeline.blocks.get(main)?;
        let mut buffer = buffer.lock();
        if !buffer.is_in_range(target) {
            return None;
        }
        buffer.block_at(target).map(|block| block.start_time)
    }

    /// Lands `capacity/2` blocks before `target` so that once the buffer
    /// fills back up after the container seek, `target` sits centered in
    /// the decoded window rather than right at its leading edge (spec.md
    /// §4.7 step 4).
    fn adjust_for_monotonic_rewind(pipeline: DecodePipeline<'_>, target: Ticks) -> Ticks {
        let Some(main) = pipeline.components.lock().main() else {
            return target;
        };
        let Some(buffer) = pipeline.blocks.get(main) else {
            return target;
        };
        let buffer = buffer.lock();
        let duration = buffer.monotonic_duration();
        if duration <= Ticks::ZERO {
            return target;
        }
        let offset = Ticks((buffer.capacity() as i64 / 2) * duration.0);
        if target > offset {
            target.saturating_sub(offset)
        } else {
            target
        }
    }

    fn route_decoded_frame(pipeline: DecodePipeline<'_>, frame: MediaFrame) {
        let components = pipeline.components.lock();
        if let Some(component) = components.get(frame.media_type) {
            if let Some(buffer) = pipeline.blocks.get(frame.media_type) {
                let _ = buffer.lock().add(&frame, component);
            }
        }
    }

    /// Reads and decodes packets until the main buffer covers `target`, or
    /// `MAX_HUNT_PACKETS` is exhausted. Returns whether the target was
    /// reached.
    fn hunt_for_target(pipeline: DecodePipeline<'_>, target: Ticks) -> bool {
        for _ in 0..Self::MAX_HUNT_PACKETS {
            if Self::main_buffer_in_range(pipeline, target) {
                return true;
            }

            let packet_or_eof = {
                let mut container = pipeline.container.lock();
                container.read()
            };
            match packet_or_eof {
                Ok(PacketOrEndOfStream::Packet(packet)) => {
                    let components = pipeline.components.lock();
                    if let Some(component) = components.get(packet.media_type) {
                        if component.stream_index() == packet.stream_index {
                            component.send_packet(packet);
                        }
                    }
                }
                Ok(PacketOrEndOfStream::EndOfStream) => {
                    pipeline.flags.set_at_eof(true);
                    break;
                }
                Err(_) => break,
            }

            for media_type in MediaType::KNOWN {
                Self::drain_ready_frames(pipeline, media_type);
            }
        }
        Self::main_buffer_in_range(pipeline, target)
    }

    fn main_buffer_in_range(pipeline: DecodePipeline<'_>, target: Ticks) -> bool {
        pipeline
            .components
            .lock()
            .main()
            .and_then(|main| pipeline.blocks.get(main))
            .map(|buffer| buffer.lock().is_in_range(target))
            .unwrap_or(false)
    }

    fn drain_ready_frames(pipeline: DecodePipeline<'_>, media_type: MediaType) {
        loop {
            let components = pipeline.components.lock();
            let Some(component) = components.get(media_type) else {
                return;
            };
            let frame = match component.receive_next_frame() {
                Ok(Some(frame)) => frame,
                _ => return,
            };
            let Some(buffer) = pipeline.blocks.get(media_type) else {
                return;
            };
            let _ = buffer.lock().add(&frame, component);
        }
    }

    /// The snapped block start time if the target was reached, else a
    /// clamp to whatever the main buffer actually holds, else the
    /// requested target as a last resort (spec.md §4.7 step 8).
    fn resolve_final_position(pipeline: DecodePipeline<'_>, target: Ticks, reached: bool) -> Ticks {
        pipeline
            .components
            .lock()
            .main()
            .and_then(|main| pipeline.blocks.get(main))
            .map(|buffer| {
                let mut buffer = buffer.lock();
                if reached {
                    buffer.block_at(target).map(|b| b.start_time).unwrap_or(target)
                } else if !buffer.is_empty() {
                    buffer.range_start()
                } else {
                    target
                }
            })
            .unwrap_or(target)
    }

    /// Resolves a [`SeekMode`] into an absolute target position.
    fn compute_target(pipeline: DecodePipeline<'_>, mode: SeekMode) -> Option<Ticks> {
        match mode {
            SeekMode::Absolute(target) => Some(target),
            SeekMode::StepForward | SeekMode::StepBackward => {
                let position = pipeline.clock.read_position();
                let main = pipeline.components.lock().main()?;
                let buffer = pipeline.blocks.get(main)?;
                let mut buffer = buffer.lock();
                let current = buffer.block_at(position)?.start_time;
                let neighbor = match mode {
                    SeekMode::StepForward => buffer.neighbors(position).1,
                    SeekMode::StepBackward => buffer.neighbors(position).0,
                    SeekMode::Absolute(_) => unreachable!(),
                };
                Some(neighbor.map(|b| b.start_time).unwrap_or(current))
            }
        }
    }
}
