//! Video library management: the metadata store, the startup scanner, the
//! file-location heuristics, and secure path resolution.
//!
//! # Storage Layout
//!
//! ```text
//! <library root>/
//! ├── metadata.json        # Full serialized entry collection
//! ├── <title>.mp4          # Media files (flat, named by title)
//! └── <title>.webp         # Optional sidecar thumbnails
//! ```
//!
//! The in-memory index inside [`VideoLibrary`] is the source of truth while
//! the process runs; every mutation rewrites `metadata.json` before
//! returning.

pub mod locate;
pub mod paths;
pub mod scanner;
pub mod store;

pub use paths::secure_path;
pub use store::{SortOrder, VideoLibrary};

/// Name of the durable metadata file at the library root.
pub const METADATA_FILE: &str = "metadata.json";
