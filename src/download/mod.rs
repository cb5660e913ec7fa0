//! Download orchestration: drives the external retrieval process, streams
//! its output as progress events, and commits completed entries to the
//! library.
//!
//! Each download is an independent unit of work with its own subprocess
//! and its own bounded progress channel. The subprocess is invoked twice:
//! once in metadata-only mode, once for the actual download with stdout
//! and stderr drained concurrently so a full pipe buffer can never stall
//! it.

pub mod orchestrator;
pub mod progress;
pub mod retriever;

pub use orchestrator::Downloader;
pub use progress::{ProgressEvent, ProgressSink};
pub use retriever::{Retriever, YtDlpRetriever};
