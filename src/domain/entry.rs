//! The persistent record for one video in the library.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One retrieved or discovered media artifact and its metadata.
///
/// Entries are immutable once created: they are written by the downloader
/// (after a successful retrieval) or the scanner (for files found on disk),
/// and only ever removed, never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Stable identifier: the extractor-provided id, or
    /// `existing_<basename>_<unixModTime>` for files discovered on disk.
    pub id: String,

    /// Human-readable title.
    pub title: String,

    /// Base name of the media file.
    pub filename: String,

    /// Absolute on-disk location; always inside the library root.
    pub file_path: PathBuf,

    /// File size in bytes.
    pub file_size: u64,

    /// Duration in seconds; 0.0 means unknown.
    pub duration: f64,

    /// Absolute path of the thumbnail; empty string means none.
    #[serde(default)]
    pub thumbnail: String,

    /// Upload date as reported by the extractor (may be empty).
    #[serde(default)]
    pub upload_date: String,

    #[serde(default)]
    pub uploader: String,

    #[serde(default)]
    pub description: String,

    /// Original source URL (empty for discovered files).
    #[serde(default)]
    pub url: String,

    /// When the entry was registered, not when the content was uploaded.
    pub created_at: DateTime<Utc>,
}

impl LibraryEntry {
    /// Path of the media file relative to the library root, for building
    /// servable links. Falls back to the bare filename if the entry's path
    /// is not under the root.
    pub fn relative_path(&self, root: &Path) -> PathBuf {
        self.file_path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(&self.filename))
    }

    /// Human-readable duration such as `1h 2m 3s`.
    pub fn format_duration(&self) -> String {
        if self.duration <= 0.0 {
            return "Unknown".to_string();
        }

        let total = self.duration as u64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Human-readable size such as `476.8 MB`.
    pub fn format_file_size(&self) -> String {
        const UNIT: u64 = 1024;
        const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

        if self.file_size == 0 {
            return "Unknown".to_string();
        }
        if self.file_size < UNIT {
            return format!("{} B", self.file_size);
        }

        // Saturates at the largest unit rather than running off the table.
        let mut div = UNIT;
        let mut exp = 0usize;
        let mut n = self.file_size / UNIT;
        while n >= UNIT && exp + 1 < UNITS.len() {
            div *= UNIT;
            exp += 1;
            n /= UNIT;
        }

        format!("{:.1} {}", self.file_size as f64 / div as f64, UNITS[exp])
    }
}
