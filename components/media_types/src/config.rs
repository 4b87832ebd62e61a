//! Recognized configuration options (spec.md §6)

use std::collections::HashMap;
use std::time::Duration;

/// Resolution-reduction hint passed to the codec backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LowResMode {
    /// Full resolution.
    #[default]
    Full,
    /// Half resolution on each axis.
    Half,
    /// Quarter resolution on each axis.
    Quarter,
    /// Eighth resolution on each axis.
    Eighth,
}

/// Behavior to apply automatically around a media load/unload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoBehavior {
    /// Do nothing automatically.
    #[default]
    Manual,
    /// Automatically start playback.
    Play,
    /// Automatically pause.
    Pause,
    /// Automatically stop.
    Stop,
    /// Automatically close.
    Close,
}

/// Options forwarded to the container/demuxer on `open`.
#[derive(Debug, Clone)]
pub struct ContainerOptions {
    /// Force a specific input format/demuxer name instead of probing.
    pub forced_input_format: Option<String>,
    /// Free-form backend options (`user_agent`, `headers`, `reconnect`, …).
    pub format_options: HashMap<String, String>,
    /// Probe size in bytes for format detection.
    pub probe_size: Option<u64>,
    /// Maximum duration to analyze while probing.
    pub max_analyze_duration: Option<Duration>,
    /// I/O read timeout.
    pub read_timeout: Option<Duration>,
    /// Ask the backend to synthesize presentation timestamps if missing.
    pub generate_pts: bool,
    /// Requested decode resolution reduction.
    pub enable_low_res: LowResMode,
    /// Prefer speed over quality in the backend decoder when available.
    pub enable_fast_decoding: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            forced_input_format: None,
            format_options: HashMap::new(),
            probe_size: None,
            max_analyze_duration: None,
            read_timeout: None,
            generate_pts: false,
            enable_low_res: LowResMode::Full,
            enable_fast_decoding: false,
        }
    }
}

/// Stream-selection and per-stream decode options.
#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    /// Disable the audio component entirely.
    pub is_audio_disabled: bool,
    /// Disable the video component entirely.
    pub is_video_disabled: bool,
    /// Disable the subtitle component entirely.
    pub is_subtitle_disabled: bool,
    /// Explicit video stream index to select.
    pub video_stream: Option<usize>,
    /// Explicit audio stream index to select.
    pub audio_stream: Option<usize>,
    /// Explicit subtitle stream index to select.
    pub subtitle_stream: Option<usize>,
    /// Fixed offset applied to subtitle timestamps.
    pub subtitles_delay: crate::ticks::Ticks,
    /// Force a constant output frame rate for video.
    pub video_forced_fps: Option<f64>,
    /// Backend video filter graph description.
    pub video_filter: Option<String>,
    /// Hardware device name/index for video decode.
    pub video_hardware_device: Option<String>,
    /// Per-stream decoder codec name override.
    pub decoder_codec_per_stream: HashMap<usize, String>,
    /// Whether seeking should use the video stream's own seek index.
    pub video_seek_index: bool,
}

/// Default controller behavior applied at construction time.
#[derive(Debug, Clone)]
pub struct ControllerDefaults {
    /// Output volume, `[0, 1]`.
    pub volume: f64,
    /// Stereo balance, `[-1, 1]`.
    pub balance: f64,
    /// Playback speed ratio, `> 0`.
    pub speed_ratio: f64,
    /// Start muted.
    pub is_muted: bool,
    /// Enable scrubbing (frame-stepping while dragging a position slider).
    pub scrubbing_enabled: bool,
    /// Behavior to apply once media finishes loading.
    pub loaded_behavior: AutoBehavior,
    /// Behavior to apply once media is unloaded/closed.
    pub unloaded_behavior: AutoBehavior,
}

impl Default for ControllerDefaults {
    fn default() -> Self {
        Self {
            volume: 1.0,
            balance: 0.0,
            speed_ratio: 1.0,
            is_muted: false,
            scrubbing_enabled: false,
            loaded_behavior: AutoBehavior::Manual,
            unloaded_behavior: AutoBehavior::Manual,
        }
    }
}

/// Engine-wide tuning constants, overridable per spec.md §6.
#[derive(Debug, Clone, Copy)]
pub struct EngineTuning {
    /// Block-pool capacity for the video `BlockBuffer`.
    pub max_video_blocks: usize,
    /// Block-pool capacity for the audio `BlockBuffer`.
    pub max_audio_blocks: usize,
    /// Block-pool capacity for the subtitle `BlockBuffer`.
    pub max_subtitle_blocks: usize,
    /// Renderer tick interval.
    pub render_tick_interval: Duration,
    /// Backoff delay used by idle reader/decoder loops.
    pub low_priority_wait: Duration,
    /// Base cached-duration unit the download cache length multiplies.
    pub buffer_cache_length: Duration,
    /// Multiplier applied to `buffer_cache_length` for live sources.
    pub download_cache_length_live_multiplier: u32,
    /// Multiplier applied to `buffer_cache_length` for on-demand sources.
    pub download_cache_length_vod_multiplier: u32,
}

impl EngineTuning {
    /// `should_read_more` pacing target: how much buffered duration the
    /// reader tries to keep ahead of playback.
    pub fn download_cache_length(&self, is_live: bool) -> Duration {
        let multiplier = if is_live {
            self.download_cache_length_live_multiplier
        } else {
            self.download_cache_length_vod_multiplier
        };
        self.buffer_cache_length * multiplier
    }
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            max_video_blocks: 12,
            max_audio_blocks: 24,
            max_subtitle_blocks: 48,
            render_tick_interval: Duration::from_millis(15),
            low_priority_wait: Duration::from_millis(10),
            buffer_cache_length: Duration::from_secs(1),
            download_cache_length_live_multiplier: 30,
            download_cache_length_vod_multiplier: 4,
        }
    }
}

/// Aggregate engine configuration bundle.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Container/demuxer options.
    pub container: ContainerOptions,
    /// Stream selection options.
    pub selection: SelectionOptions,
    /// Controller defaults.
    pub controller: ControllerDefaults,
    /// Tuning constants.
    pub tuning: EngineTuning,
}
