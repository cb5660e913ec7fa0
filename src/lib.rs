//! vidvault - Self-hosted video library with download orchestration
//!
//! Submit a media URL, let an external downloader (yt-dlp) fetch it, and
//! browse the result through a persistent, searchable library.
//!
//! # Architecture
//!
//! - Every known video is a [`domain::LibraryEntry`] in a JSON-backed
//!   store owned by [`library::VideoLibrary`]
//! - Downloads run as independent units of work, each with its own
//!   subprocess and bounded progress channel
//! - Every caller-supplied path is resolved through
//!   [`library::secure_path`] before it touches the filesystem
//!
//! # Modules
//!
//! - `domain`: Data structures (LibraryEntry, SourceMetadata)
//! - `library`: Store, startup scanner, file locator, path guard
//! - `download`: Orchestrator, retriever subprocess seam, progress stream
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Download a video into the library
//! vidvault download https://example.com/watch?v=abc123
//!
//! # Browse
//! vidvault list --sort title
//! vidvault search "demo"
//! vidvault delete abc123
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod library;

// Re-export main types at crate root for convenience
pub use domain::{sanitize_filename, LibraryEntry, SourceMetadata};
pub use download::{Downloader, ProgressEvent, ProgressSink, Retriever, YtDlpRetriever};
pub use error::{DownloadError, LibraryError, ProcessFailureKind};
pub use library::{secure_path, SortOrder, VideoLibrary};
