//! Installed per-media-type renderers plus invalidation bookkeeping
//! (spec.md §4.5 Renderer tick: "last_render_time")

use mediacore_types::{MediaBlock, MediaType, Renderer, Ticks};
use parking_lot::Mutex;
use std::collections::HashMap;

struct RendererEntry {
    renderer: Box<dyn Renderer>,
    last_render_time: Ticks,
}

/// Installed renderers, one per media type, paired with the
/// `last_render_time` bookkeeping that both the decode worker
/// (invalidation on seek) and the render worker (re-render detection) need
/// to observe together, so both sit behind one lock.
#[derive(Default)]
pub struct RendererSet {
    entries: Mutex<HashMap<MediaType, RendererEntry>>,
}

impl RendererSet {
    /// Builds an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the renderer for `media_type`.
    pub fn install(&self, media_type: MediaType, renderer: Box<dyn Renderer>) {
        self.entries.lock().insert(
            media_type,
            RendererEntry {
                renderer,
                last_render_time: Ticks::MIN,
            },
        );
    }

    /// Removes and returns the renderer for `media_type`, if installed.
    pub fn remove(&self, media_type: MediaType) -> Option<Box<dyn Renderer>> {
        self.entries.lock().remove(&media_type).map(|entry| entry.renderer)
    }

    /// True if a renderer is installed for `media_type`.
    pub fn contains(&self, media_type: MediaType) -> bool {
        self.entries.lock().contains_key(&media_type)
    }

    /// Resets `last_render_time` to the "never rendered" sentinel for every
    /// installed renderer and invokes its `seek()` hook (spec.md §4.7 step
    /// 6: "invalidate renderers").
    pub fn invalidate_all(&self) {
        for entry in self.entries.lock().values_mut() {
            entry.last_render_time = Ticks::MIN;
            entry.renderer.seek();
        }
    }

    /// Calls `play()` on every installed renderer.
    pub fn play_all(&self) {
        for entry in self.entries.lock().values_mut() {
            entry.renderer.play();
        }
    }

    /// Calls `pause()` on every installed renderer.
    pub fn pause_all(&self) {
        for entry in self.entries.lock().values_mut() {
            entry.renderer.pause();
        }
    }

    /// Calls `stop()` on every installed renderer.
    pub fn stop_all(&self) {
        for entry in self.entries.lock().values_mut() {
            entry.renderer.stop();
        }
    }

    /// Calls `close()` on every installed renderer, then drops them all.
    pub fn close_all(&self) {
        let mut entries = self.entries.lock();
        for entry in entries.values_mut() {
            entry.renderer.close();
        }
        entries.clear();
    }

    /// Renders one tick for `media_type`: calls `render(block, wall_clock)`
    /// only if `block.start_time` differs from the last one rendered (or
    /// none has ever been rendered), then unconditionally calls
    /// `update(wall_clock)` (spec.md §4.5 Renderer tick, re-render and
    /// update steps).
    pub fn tick(&self, media_type: MediaType, block: Option<&MediaBlock>, wall_clock: Ticks) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&media_type) else {
            return;
        };
        if let Some(media_block) = block {
            if entry.last_render_time != media_block.start_time {
                entry.renderer.render(media_block, wall_clock);
                entry.last_render_time = media_block.start_time;
            }
        }
        entry.renderer.update(wall_clock);
    }
}
