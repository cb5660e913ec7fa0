//! The download orchestrator.
//!
//! Coordinates one download end to end: metadata extraction, the download
//! subprocess, artifact location, and the store commit. Failures at any
//! step abort the attempt with nothing committed; the store never
//! references a file that was not fully downloaded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument};
use uuid::Uuid;

use super::progress::{ProgressEvent, ProgressSink};
use super::retriever::{Retriever, YtDlpRetriever};
use crate::domain::LibraryEntry;
use crate::error::DownloadError;
use crate::library::{locate, VideoLibrary};

/// Default wall-clock budget per download.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(30 * 60);

/// Orchestrates downloads into a shared [`VideoLibrary`].
///
/// Cheap to clone via the inner `Arc`s; each call to [`Downloader::download`]
/// is an independent unit of work with its own subprocess and progress
/// channel.
#[derive(Clone)]
pub struct Downloader {
    library: Arc<VideoLibrary>,
    retriever: Arc<dyn Retriever>,
    budget: Duration,
}

impl Downloader {
    /// Production downloader using the `yt-dlp` binary.
    pub fn new(library: Arc<VideoLibrary>, binary: impl Into<String>, budget: Duration) -> Self {
        Self {
            library,
            retriever: Arc::new(YtDlpRetriever::with_binary(binary)),
            budget,
        }
    }

    /// Substitute the retrieval backend (tests, alternative downloaders).
    pub fn with_retriever(
        library: Arc<VideoLibrary>,
        retriever: Arc<dyn Retriever>,
        budget: Duration,
    ) -> Self {
        Self {
            library,
            retriever,
            budget,
        }
    }

    /// Download `url` into the library, streaming progress into `sink`.
    ///
    /// The terminal outcome is reported twice: as a final `Completed` or
    /// `Failed` event on the sink, and as this method's return value. The
    /// sink closes when the last clone is dropped on return.
    #[instrument(skip(self, sink), fields(job = %Uuid::new_v4()))]
    pub async fn download(
        &self,
        url: &str,
        sink: ProgressSink,
    ) -> Result<LibraryEntry, DownloadError> {
        match self.run(url, &sink).await {
            Ok(entry) => {
                info!(id = %entry.id, title = %entry.title, "Download complete");
                sink.send(ProgressEvent::Completed {
                    id: entry.id.clone(),
                })
                .await;
                Ok(entry)
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Download failed");
                sink.send(ProgressEvent::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    async fn run(&self, url: &str, sink: &ProgressSink) -> Result<LibraryEntry, DownloadError> {
        validate_url(url)?;

        sink.send(ProgressEvent::ExtractingMetadata).await;
        let metadata = self.retriever.extract_metadata(url, self.budget).await?;

        sink.send(ProgressEvent::DownloadStarted {
            title: metadata.title.clone(),
        })
        .await;

        let root = self.library.root().to_path_buf();
        self.retriever
            .download(url, &root, sink, self.budget)
            .await?;

        sink.send(ProgressEvent::Processing).await;

        // The locator tries the sanitized title itself; one call covers
        // every rung of the ladder in order.
        let file_path = locate::locate_media(&root, &metadata.title, &metadata.id)
            .ok_or_else(|| DownloadError::FileNotFound {
                title: metadata.title.clone(),
            })?;

        let file_size = tokio::fs::metadata(&file_path)
            .await
            .map(|m| m.len())
            .map_err(|e| DownloadError::FileNotFound {
                title: format!("{} ({})", metadata.title, e),
            })?;

        let thumbnail = locate::locate_thumbnail(&root, &metadata.title, &metadata.id)
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let entry = LibraryEntry {
            id: metadata.id.clone(),
            title: metadata.title.clone(),
            filename: filename_of(&file_path),
            file_path: file_path.clone(),
            file_size,
            duration: metadata.duration,
            thumbnail,
            upload_date: metadata.upload_date.clone(),
            uploader: metadata.uploader.clone(),
            description: metadata.description.clone(),
            url: url.to_string(),
            created_at: chrono::Utc::now(),
        };

        self.library
            .put(entry.clone())
            .await
            .map_err(DownloadError::Persist)?;

        Ok(entry)
    }
}

fn validate_url(url: &str) -> Result<(), DownloadError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(DownloadError::Validation("URL is empty".to_string()));
    }
    if !trimmed.contains("://") {
        return Err(DownloadError::Validation(format!(
            "not an absolute URL: {}",
            trimmed
        )));
    }
    Ok(())
}

fn filename_of(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/v").is_ok());
        assert!(matches!(
            validate_url(""),
            Err(DownloadError::Validation(_))
        ));
        assert!(matches!(
            validate_url("   "),
            Err(DownloadError::Validation(_))
        ));
        assert!(matches!(
            validate_url("example.com/v"),
            Err(DownloadError::Validation(_))
        ));
    }

    #[test]
    fn test_default_budget() {
        assert_eq!(DEFAULT_BUDGET, Duration::from_secs(1800));
    }
}
