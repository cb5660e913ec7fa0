//! Extractor metadata and filename sanitization.

use serde::Deserialize;

/// Metadata reported by the extractor's metadata-only invocation
/// (`yt-dlp --dump-json --no-download`).
///
/// Everything except the id is optional because older or exotic sources
/// frequently omit fields.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceMetadata {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub uploader: String,

    #[serde(default)]
    pub upload_date: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub thumbnail: String,

    #[serde(default)]
    pub webpage_url: String,
}

/// Replace path separators and reserved characters so a title can be used
/// as a filename candidate. This is a naming hint only, never an identifier.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = name.replace("..", "_");
    for ch in ['/', '\\', ':', '*', '?', '"', '<', '>', '|'] {
        out = out.replace(ch, "_");
    }
    out
}
