//! Heuristic discovery of downloaded files.
//!
//! The downloader names files from a title template, but the extractor may
//! adjust titles and extensions in ways we cannot predict exactly. These
//! helpers resolve the most plausible media and thumbnail files for a
//! title/id pair. The resolution order is fixed and tested:
//!
//! 1. `<rawTitle><ext>` exact
//! 2. `<sanitizedTitle><ext>` exact
//! 3. `<id><ext>` exact
//! 4. directory scan, case-insensitive substring match on the raw title,
//!    the sanitized title, or the id
//! 5. (media only) any qualifying file modified within the recency window
//!
//! Step 5 is a last resort and can match an unrelated very-recent file;
//! that risk is accepted.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::domain::sanitize_filename;

/// Media extensions the library manages, lowercase.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi", "mov", "flv", "m4v"];

/// Sidecar thumbnail extensions, lowercase.
pub const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Substrings marking an in-progress download that must never be indexed.
pub const PARTIAL_MARKERS: &[&str] = &[".part", ".ytdl"];

/// How recent a file must be for the step-5 fallback.
const RECENT_WINDOW: Duration = Duration::from_secs(10 * 60);

/// True if the filename carries an in-progress-download marker.
pub fn has_partial_marker(filename: &str) -> bool {
    PARTIAL_MARKERS.iter().any(|m| filename.contains(m))
}

/// True if the path has a managed media extension (case-insensitive).
pub fn is_media_file(path: &Path) -> bool {
    has_extension_in(path, MEDIA_EXTENSIONS)
}

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_lowercase();
            extensions.iter().any(|m| *m == lower)
        })
        .unwrap_or(false)
}

/// Find the media file produced for `title`/`id`, or `None`.
pub fn locate_media(root: &Path, title: &str, id: &str) -> Option<PathBuf> {
    if let Some(found) = exact_match(root, title, id, MEDIA_EXTENSIONS) {
        return Some(found);
    }
    if let Some(found) = substring_match(root, title, id, MEDIA_EXTENSIONS) {
        return Some(found);
    }
    recent_match(root, MEDIA_EXTENSIONS)
}

/// Find the sidecar thumbnail for `title`/`id`, or `None`.
///
/// No recency fallback here: a missing thumbnail is normal and grabbing an
/// arbitrary recent image would be wrong more often than right.
pub fn locate_thumbnail(root: &Path, title: &str, id: &str) -> Option<PathBuf> {
    if let Some(found) = exact_match(root, title, id, THUMBNAIL_EXTENSIONS) {
        return Some(found);
    }
    substring_match(root, title, id, THUMBNAIL_EXTENSIONS)
}

/// Steps 1-3: exact candidates for raw title, sanitized title, then id.
fn exact_match(root: &Path, title: &str, id: &str, extensions: &[&str]) -> Option<PathBuf> {
    let sanitized = sanitize_filename(title);
    let stems = [title, sanitized.as_str(), id];

    for stem in stems {
        if stem.is_empty() {
            continue;
        }
        for ext in extensions {
            let candidate = root.join(format!("{}.{}", stem, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Step 4: walk the tree for a filename containing the raw title, the
/// sanitized title, or the id. The sanitized form matters when the
/// downloader rewrote reserved characters and appended its own suffix.
fn substring_match(root: &Path, title: &str, id: &str, extensions: &[&str]) -> Option<PathBuf> {
    let title_lower = title.to_lowercase();
    let sanitized_lower = sanitize_filename(title).to_lowercase();
    let id_lower = id.to_lowercase();

    walk_files(root, &mut |path| {
        if !has_extension_in(path, extensions) {
            return None;
        }
        let name = path.file_name()?.to_str()?.to_lowercase();
        if has_partial_marker(&name) {
            return None;
        }
        let hit = (!title_lower.is_empty() && name.contains(&title_lower))
            || (!sanitized_lower.is_empty() && name.contains(&sanitized_lower))
            || (!id_lower.is_empty() && name.contains(&id_lower));
        hit.then(|| path.to_path_buf())
    })
}

/// Step 5: any qualifying file modified within the recency window.
fn recent_match(root: &Path, extensions: &[&str]) -> Option<PathBuf> {
    let now = SystemTime::now();

    walk_files(root, &mut |path| {
        if !has_extension_in(path, extensions) {
            return None;
        }
        let name = path.file_name()?.to_str()?;
        if has_partial_marker(name) {
            return None;
        }
        let modified = path.metadata().ok()?.modified().ok()?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        (age < RECENT_WINDOW).then(|| path.to_path_buf())
    })
}

/// Depth-first walk returning the first `Some` the visitor produces.
/// Unreadable directories are skipped rather than aborting the search.
fn walk_files<F>(dir: &Path, visit: &mut F) -> Option<PathBuf>
where
    F: FnMut(&Path) -> Option<PathBuf>,
{
    let entries = std::fs::read_dir(dir).ok()?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = walk_files(&path, visit) {
                return Some(found);
            }
        } else if let Some(found) = visit(&path) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_markers() {
        assert!(has_partial_marker("video.mp4.part"));
        assert!(has_partial_marker("video.ytdl"));
        assert!(!has_partial_marker("video.mp4"));
    }

    #[test]
    fn test_is_media_file_case_insensitive() {
        assert!(is_media_file(Path::new("a/b/Clip.MP4")));
        assert!(is_media_file(Path::new("clip.webm")));
        assert!(!is_media_file(Path::new("clip.txt")));
        assert!(!is_media_file(Path::new("no_extension")));
    }
}
