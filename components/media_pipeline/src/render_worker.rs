//! Render worker cycle (spec.md §4.5 "Renderer tick")

use crate::blocks::BlockBufferSet;
use crate::command::CommandCoordinator;
use crate::flags::PipelineFlags;
use crate::renderers::RendererSet;
use mediacore_clock::RealTimeClock;
use mediacore_types::{MediaType, Ticks};

/// Facts produced by one [`RenderWorker::run_cycle`] call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderTickReport {
    /// The wall-clock position sampled once at the start of this tick.
    pub wall_clock: Ticks,
    /// True if the tick was skipped entirely (a direct command is in
    /// flight, playback is stopping, or the clock isn't running).
    pub skipped: bool,
}

/// Bundles the read-only context a render tick needs.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Shared playback clock.
    pub clock: &'a RealTimeClock,
    /// The three per-media-type block buffers.
    pub blocks: &'a BlockBufferSet,
    /// Installed renderers.
    pub renderers: &'a RendererSet,
    /// Command coordinator, consulted for the direct-command and
    /// in-flight-seek gates.
    pub coordinator: &'a CommandCoordinator,
    /// Shared pipeline flags.
    pub flags: &'a PipelineFlags,
}

/// Drives one iteration of the renderer tick loop.
pub struct RenderWorker;

impl RenderWorker {
    /// Runs one render tick.
    pub fn run_cycle(ctx: RenderContext<'_>) -> RenderTickReport {
        ctx.coordinator.render_gate().begin();
        let report = Self::run_cycle_inner(ctx);
        ctx.coordinator.render_gate().end();
        report
    }

    fn run_cycle_inner(ctx: RenderContext<'_>) -> RenderTickReport {
        let mut report = RenderTickReport::default();

        if ctx.flags.is_stopping() || ctx.coordinator.is_executing_direct() {
            report.skipped = true;
            return report;
        }

        // Wait for any in-flight decode cycle (which owns seek execution)
        // to finish before sampling the clock, so a tick never presents a
        // pre-seek block against a post-seek wall clock.
        ctx.coordinator.decode_gate().wait_idle();

        if !ctx.clock.is_running() {
            report.skipped = true;
            return report;
        }

        let wall_clock = ctx.clock.read_position();
        report.wall_clock = wall_clock;

        for media_type in MediaType::KNOWN {
            let Some(buffer) = ctx.blocks.get(media_type) else {
                continue;
            };
            let mut buffer = buffer.lock();
            if buffer.is_empty() {
                continue;
            }
            let clamped = wall_clock.clamp(buffer.range_start(), buffer.range_end());
            let block = buffer.block_at(clamped).cloned();
            drop(buffer);
            ctx.renderers.tick(media_type, block.as_ref(), wall_clock);
        }

        report
    }
}
