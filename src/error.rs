//! Error types for the library core and the download pipeline.
//!
//! Two taxonomies: [`LibraryError`] for store/path/file operations and
//! [`DownloadError`] for the subprocess-driven download flow. Every variant
//! carries a human-readable message; subprocess failures additionally carry
//! a machine-readable [`ProcessFailureKind`] derived from stderr.

use thiserror::Error;

/// Errors from the metadata store, path guard, and scanner.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Malformed or missing caller input (empty id, bad path segment).
    #[error("invalid request: {0}")]
    Validation(String),

    /// A caller-supplied path resolved outside the library root.
    #[error("path traversal attempt detected: {requested}")]
    PathTraversal { requested: String },

    /// No entry with the given id exists.
    #[error("video not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata file exists but could not be parsed.
    #[error("failed to decode metadata store: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode metadata store: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors from a single download attempt.
///
/// None of these leave a partial entry in the store; the attempt either
/// commits a complete [`crate::domain::LibraryEntry`] or nothing at all.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Rejected at the boundary before any subprocess was spawned.
    #[error("invalid URL: {0}")]
    Validation(String),

    /// The metadata-only invocation exited non-zero or produced
    /// undecodable output.
    #[error("failed to extract metadata: {detail}")]
    MetadataExtraction { detail: String },

    /// The download invocation exited non-zero.
    #[error("download process failed ({kind}): {detail}")]
    Process {
        kind: ProcessFailureKind,
        detail: String,
    },

    /// The subprocess exceeded its wall-clock budget and was killed.
    #[error("download exceeded {budget_secs}s budget and was terminated")]
    Timeout { budget_secs: u64 },

    /// The process succeeded but no matching media file could be located.
    #[error("downloaded file not found for '{title}'")]
    FileNotFound { title: String },

    /// The entry was built but the store could not be saved.
    #[error("failed to persist library entry: {0}")]
    Persist(#[source] LibraryError),

    /// The downloader binary could not be spawned at all.
    #[error("failed to run downloader: {0}")]
    Spawn(#[source] std::io::Error),
}

impl DownloadError {
    /// Machine-readable failure kind for callers that route on error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::MetadataExtraction { .. } => "metadata_extraction",
            Self::Process { kind, .. } => kind.as_str(),
            Self::Timeout { .. } => "timeout",
            Self::FileNotFound { .. } => "file_not_found",
            Self::Persist(_) => "persist",
            Self::Spawn(_) => "spawn",
        }
    }
}

/// Sub-classification of a non-zero downloader exit, inferred from stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFailureKind {
    /// Transport-level failure reaching the remote host.
    Network,
    /// Remote content unavailable or removed.
    RemoteNotFound,
    /// Remote access denied (private video, login wall).
    AccessDenied,
    /// No extractor handles the URL.
    UnsupportedSource,
    /// Nothing in stderr matched a known pattern.
    Unknown,
}

impl ProcessFailureKind {
    /// Inspect stderr text and pick the most specific matching kind.
    pub fn classify(stderr: &str) -> Self {
        let text = stderr.to_lowercase();

        if text.contains("unsupported url")
            || text.contains("no suitable extractor")
            || text.contains("is not a valid url")
        {
            return Self::UnsupportedSource;
        }
        if text.contains("http error 404")
            || text.contains("video unavailable")
            || text.contains("not available")
            || text.contains("has been removed")
            || text.contains("does not exist")
        {
            return Self::RemoteNotFound;
        }
        if text.contains("http error 403")
            || text.contains("private video")
            || text.contains("sign in to")
            || text.contains("access denied")
        {
            return Self::AccessDenied;
        }
        if text.contains("unable to download")
            || text.contains("network")
            || text.contains("connection")
            || text.contains("timed out")
        {
            return Self::Network;
        }

        Self::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::RemoteNotFound => "remote_not_found",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedSource => "unsupported_source",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProcessFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
