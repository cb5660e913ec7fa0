//! Startup scan for media files that have no metadata entry yet.
//!
//! Files can land in the library without going through the downloader
//! (manual copies, interrupted runs from older versions). The scanner walks
//! the root once at startup and registers every qualifying file with
//! best-effort metadata. Re-running over an unchanged tree registers
//! nothing new: files are matched by exact stored path.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::locate;
use super::METADATA_FILE;
use crate::domain::LibraryEntry;

/// Placeholder description for entries the scanner synthesizes.
const DISCOVERED_DESCRIPTION: &str = "Existing video file";

/// Walk the library root and build entries for media files not in
/// `known_paths`. Directories, the metadata file, partial downloads, and
/// non-media extensions are skipped. Files that cannot be stat'd are
/// skipped with a warning rather than failing the scan.
pub fn scan(root: &Path, known_paths: &HashSet<PathBuf>) -> io::Result<Vec<LibraryEntry>> {
    let mut discovered = Vec::new();
    walk(root, root, known_paths, &mut discovered)?;
    Ok(discovered)
}

fn walk(
    root: &Path,
    dir: &Path,
    known_paths: &HashSet<PathBuf>,
    out: &mut Vec<LibraryEntry>,
) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            walk(root, &path, known_paths, out)?;
            continue;
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if filename == METADATA_FILE
            || locate::has_partial_marker(filename)
            || !locate::is_media_file(&path)
        {
            continue;
        }
        if known_paths.contains(&path) {
            continue;
        }

        match synthesize_entry(root, &path, filename) {
            Ok(entry) => {
                debug!(id = %entry.id, "Registered existing media file");
                out.push(entry);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable file");
            }
        }
    }
    Ok(())
}

/// Build a best-effort entry for a file with no known provenance.
fn synthesize_entry(root: &Path, path: &Path, filename: &str) -> io::Result<LibraryEntry> {
    let meta = path.metadata()?;
    let modified = meta.modified()?;
    let mod_unix = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string();

    let id = format!("existing_{}_{}", stem, mod_unix);

    let thumbnail = locate::locate_thumbnail(root, &stem, &id)
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    Ok(LibraryEntry {
        id,
        title: stem,
        filename: filename.to_string(),
        file_path: path.to_path_buf(),
        file_size: meta.len(),
        duration: 0.0, // Unknown for discovered files
        thumbnail,
        upload_date: String::new(),
        uploader: String::new(),
        description: DISCOVERED_DESCRIPTION.to_string(),
        url: String::new(),
        created_at: DateTime::<Utc>::from(modified),
    })
}
