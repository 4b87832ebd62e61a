//! Stream/media type classification

/// Tagged media kind, mirroring the container's stream classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Video (pixel) stream.
    Video,
    /// Audio (sample) stream.
    Audio,
    /// Subtitle/text stream.
    Subtitle,
    /// Opaque/attachment data stream (e.g. embedded fonts, chapters).
    Data,
    /// No stream / unclassified.
    None,
}

impl MediaType {
    /// The fixed iteration order used whenever "each known media type" is
    /// walked (reader pacing, decoder component loop, renderer tick).
    pub const KNOWN: [MediaType; 3] = [MediaType::Video, MediaType::Audio, MediaType::Subtitle];

    /// Short lowercase label, used in log messages and metrics labels.
    pub fn label(self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Subtitle => "subtitle",
            MediaType::Data => "data",
            MediaType::None => "none",
        }
    }
}
