//! Secure path resolution.
//!
//! The single trust boundary between untrusted path input and the
//! filesystem: every read, serve, or delete that takes a caller-supplied
//! path segment goes through [`secure_path`] first.

use std::path::{Component, Path, PathBuf};

use crate::error::LibraryError;

/// Resolve a caller-supplied relative path against the library root.
///
/// The requested path is lexically cleaned (`.` and `..` segments
/// collapsed), joined to the root, and both sides are made absolute. The
/// result is accepted only if it is the root itself or sits strictly below
/// it; anything else fails with [`LibraryError::PathTraversal`].
pub fn secure_path(root: &Path, requested: &str) -> Result<PathBuf, LibraryError> {
    if requested.is_empty() {
        return Err(LibraryError::Validation("empty path".to_string()));
    }

    let cleaned = clean(Path::new(requested));
    let joined = root.join(cleaned);

    let abs_root = clean(&absolutize(root)?);
    let abs_joined = clean(&absolutize(&joined)?);

    // Path::starts_with is component-wise, so `/lib-evil` never matches a
    // root of `/lib`.
    if abs_joined == abs_root || abs_joined.starts_with(&abs_root) {
        Ok(abs_joined)
    } else {
        Err(LibraryError::PathTraversal {
            requested: requested.to_string(),
        })
    }
}

/// Lexically collapse `.` and `..` components without touching the
/// filesystem. Leading `..` segments of a relative path are kept so the
/// prefix check above can reject them.
fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        PathBuf::from(".")
    } else {
        out.iter().collect()
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, LibraryError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collapses_segments() {
        assert_eq!(clean(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(clean(Path::new("a/b/../../c")), PathBuf::from("c"));
        assert_eq!(clean(Path::new("./x")), PathBuf::from("x"));
        assert_eq!(clean(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn test_clean_keeps_leading_parent_dirs() {
        assert_eq!(clean(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(clean(Path::new("a/../../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_clean_parent_at_root_is_root() {
        assert_eq!(clean(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_accepts_paths_inside_root() {
        let root = Path::new("/library");
        assert_eq!(
            secure_path(root, "video.mp4").unwrap(),
            PathBuf::from("/library/video.mp4")
        );
        assert_eq!(
            secure_path(root, "sub/dir/video.mp4").unwrap(),
            PathBuf::from("/library/sub/dir/video.mp4")
        );
        // Harmless internal dot-dot
        assert_eq!(
            secure_path(root, "sub/../video.mp4").unwrap(),
            PathBuf::from("/library/video.mp4")
        );
    }

    #[test]
    fn test_accepts_root_itself() {
        assert_eq!(
            secure_path(Path::new("/library"), ".").unwrap(),
            PathBuf::from("/library")
        );
    }

    #[test]
    fn test_rejects_escapes() {
        let root = Path::new("/library");
        assert!(matches!(
            secure_path(root, "../etc/passwd"),
            Err(LibraryError::PathTraversal { .. })
        ));
        assert!(matches!(
            secure_path(root, "a/../../etc/passwd"),
            Err(LibraryError::PathTraversal { .. })
        ));
        assert!(matches!(
            secure_path(root, "../../../../etc/shadow"),
            Err(LibraryError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_rejects_sibling_prefix() {
        // "/library-evil" shares a string prefix with "/library" but is
        // outside it.
        assert!(matches!(
            secure_path(Path::new("/library"), "../library-evil/x.mp4"),
            Err(LibraryError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_request() {
        assert!(matches!(
            secure_path(Path::new("/library"), ""),
            Err(LibraryError::Validation(_))
        ));
    }
}
