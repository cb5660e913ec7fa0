//! Domain types for the video library.
//!
//! This module contains the core data structures:
//! - LibraryEntry: the persistent per-video record
//! - SourceMetadata: what the extractor reports before a download

pub mod entry;
pub mod metadata;

// Re-export commonly used types
pub use entry::LibraryEntry;
pub use metadata::{sanitize_filename, SourceMetadata};
