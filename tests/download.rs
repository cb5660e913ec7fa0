//! Download Pipeline Integration Tests
//!
//! End-to-end runs of the orchestrator against a mock retriever and against
//! the real subprocess retriever backed by stub scripts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use vidvault::download::Downloader;
use vidvault::{
    DownloadError, ProcessFailureKind, ProgressEvent, ProgressSink, Retriever, SourceMetadata,
    VideoLibrary,
};

const URL: &str = "https://example.com/watch?v=abc123";

/// Retriever that fabricates a successful download on the filesystem.
struct MockRetriever;

#[async_trait]
impl Retriever for MockRetriever {
    async fn extract_metadata(
        &self,
        _url: &str,
        _budget: Duration,
    ) -> Result<SourceMetadata, DownloadError> {
        serde_json::from_value(serde_json::json!({
            "id": "abc123",
            "title": "Demo Clip",
            "duration": 12.5,
            "uploader": "Demo Channel",
            "upload_date": "20240115",
            "description": "An end-to-end demo"
        }))
        .map_err(|e| DownloadError::MetadataExtraction {
            detail: e.to_string(),
        })
    }

    async fn download(
        &self,
        _url: &str,
        dest: &Path,
        sink: &ProgressSink,
        _budget: Duration,
    ) -> Result<(), DownloadError> {
        std::fs::write(dest.join("Demo Clip.mp4"), vec![0u8; 500_000])
            .map_err(DownloadError::Spawn)?;
        std::fs::write(dest.join("Demo Clip.webp"), b"thumb").map_err(DownloadError::Spawn)?;
        sink.send(ProgressEvent::OutputLine("[download] 100%".into()))
            .await;
        Ok(())
    }
}

/// Retriever whose metadata step always fails.
struct BrokenRetriever;

#[async_trait]
impl Retriever for BrokenRetriever {
    async fn extract_metadata(
        &self,
        _url: &str,
        _budget: Duration,
    ) -> Result<SourceMetadata, DownloadError> {
        Err(DownloadError::MetadataExtraction {
            detail: "ERROR: [generic] extraction failed".into(),
        })
    }

    async fn download(
        &self,
        _url: &str,
        _dest: &Path,
        _sink: &ProgressSink,
        _budget: Duration,
    ) -> Result<(), DownloadError> {
        panic!("download must not run after failed extraction");
    }
}

async fn open_library(temp: &TempDir) -> Arc<VideoLibrary> {
    Arc::new(VideoLibrary::open(temp.path()).await.unwrap())
}

async fn drain(mut rx: tokio::sync::mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_mock_download_commits_complete_entry() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp).await;
    let downloader =
        Downloader::with_retriever(library.clone(), Arc::new(MockRetriever), Duration::from_secs(30));

    let (sink, rx) = ProgressSink::channel();
    let entry = downloader.download(URL, sink).await.unwrap();

    assert_eq!(entry.id, "abc123");
    assert_eq!(entry.title, "Demo Clip");
    assert_eq!(entry.filename, "Demo Clip.mp4");
    assert_eq!(entry.file_size, 500_000);
    assert_eq!(entry.duration, 12.5);
    assert_eq!(entry.url, URL);
    assert!(entry.thumbnail.ends_with("Demo Clip.webp"));

    // Committed and queryable.
    assert_eq!(library.len().await, 1);
    let hits = library.search("demo").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "abc123");

    // Durable across a reopen.
    drop(library);
    let reopened = VideoLibrary::open(temp.path()).await.unwrap();
    assert_eq!(reopened.get("abc123").await.unwrap().file_size, 500_000);

    let events = drain(rx).await;
    assert_eq!(events.first(), Some(&ProgressEvent::ExtractingMetadata));
    assert!(events.contains(&ProgressEvent::DownloadStarted {
        title: "Demo Clip".into()
    }));
    assert!(events.contains(&ProgressEvent::Processing));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Completed {
            id: "abc123".into()
        })
    );
}

#[tokio::test]
async fn test_invalid_url_rejected_before_any_work() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp).await;
    let downloader =
        Downloader::with_retriever(library.clone(), Arc::new(MockRetriever), Duration::from_secs(30));

    let (sink, rx) = ProgressSink::channel();
    let result = downloader.download("not a url", sink).await;

    assert!(matches!(result, Err(DownloadError::Validation(_))));
    assert!(library.is_empty().await);

    let events = drain(rx).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        ProgressEvent::Failed {
            kind: "validation",
            ..
        }
    ));
}

#[tokio::test]
async fn test_extraction_failure_leaves_store_unchanged() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp).await;
    let downloader = Downloader::with_retriever(
        library.clone(),
        Arc::new(BrokenRetriever),
        Duration::from_secs(30),
    );

    let (sink, rx) = ProgressSink::channel();
    let result = downloader.download(URL, sink).await;

    assert!(matches!(
        result,
        Err(DownloadError::MetadataExtraction { .. })
    ));
    assert!(library.is_empty().await);
    assert!(!temp.path().join("metadata.json").exists());

    let events = drain(rx).await;
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Failed {
            kind: "metadata_extraction",
            ..
        })
    ));
}

// Stub-script tests exercise the real subprocess retriever: spawn, stream
// draining, exit-status handling, and the kill-on-timeout path.

#[cfg(unix)]
mod subprocess {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const METADATA_JSON: &str =
        r#"{"id":"abc123","title":"Demo Clip","duration":12.5,"uploader":"Demo Channel"}"#;

    /// Write an executable stub standing in for the downloader binary.
    ///
    /// Metadata mode is detected by the `--dump-json` flag; `body` handles
    /// download mode, where `$3` is the destination directory (`-P <dir>`).
    fn write_stub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("stub-dl.sh");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"--dump-json\" ]; then\n  echo '{}'\n  exit 0\nfi\n{}\n",
            METADATA_JSON, body
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_stub_script_download_end_to_end() {
        let bin_dir = TempDir::new().unwrap();
        let stub = write_stub(
            bin_dir.path(),
            concat!(
                "echo '[download] Destination: Demo Clip.mp4'\n",
                "echo '[download] 100% of 488.28KiB'\n",
                "head -c 500000 /dev/zero > \"$3/Demo Clip.mp4\"\n",
                "printf thumb > \"$3/Demo Clip.webp\"\n",
            ),
        );

        let temp = TempDir::new().unwrap();
        let library = open_library(&temp).await;
        let downloader = Downloader::new(
            library.clone(),
            stub.display().to_string(),
            Duration::from_secs(30),
        );

        let (sink, rx) = ProgressSink::channel();
        let entry = downloader.download(URL, sink).await.unwrap();

        assert_eq!(entry.id, "abc123");
        assert_eq!(entry.file_size, 500_000);
        assert!(temp.path().join("Demo Clip.mp4").exists());

        let events = drain(rx).await;
        assert!(events.contains(&ProgressEvent::OutputLine(
            "[download] 100% of 488.28KiB".into()
        )));
    }

    #[tokio::test]
    async fn test_stub_script_failure_is_classified_from_stderr() {
        let bin_dir = TempDir::new().unwrap();
        let stub = write_stub(
            bin_dir.path(),
            concat!(
                "echo 'ERROR: unable to download video data: network is unreachable' >&2\n",
                "exit 1\n",
            ),
        );

        let temp = TempDir::new().unwrap();
        let library = open_library(&temp).await;
        let downloader = Downloader::new(
            library.clone(),
            stub.display().to_string(),
            Duration::from_secs(30),
        );

        let (sink, rx) = ProgressSink::channel();
        let result = downloader.download(URL, sink).await;

        match result {
            Err(DownloadError::Process { kind, detail }) => {
                assert_eq!(kind, ProcessFailureKind::Network);
                assert!(detail.contains("network is unreachable"));
            }
            other => panic!("expected classified process failure, got {:?}", other),
        }
        assert!(library.is_empty().await);

        let events = drain(rx).await;
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Failed {
                kind: "network",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_stub_script_exceeding_budget_is_killed() {
        let bin_dir = TempDir::new().unwrap();
        let stub = write_stub(
            bin_dir.path(),
            "echo '[download]   0.1% of ~1.20GiB'\nsleep 30\n",
        );

        let temp = TempDir::new().unwrap();
        let library = open_library(&temp).await;
        let downloader = Downloader::new(
            library.clone(),
            stub.display().to_string(),
            Duration::from_secs(1),
        );

        let (sink, rx) = ProgressSink::channel();
        let start = std::time::Instant::now();
        let result = downloader.download(URL, sink).await;

        assert!(matches!(
            result,
            Err(DownloadError::Timeout { budget_secs: 1 })
        ));
        // Killed promptly rather than waiting out the child's sleep.
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(library.is_empty().await);

        let events = drain(rx).await;
        // The failure report is the final message; output lines emitted
        // before the kill must not trail it.
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Failed { kind: "timeout", .. })
        ));
        assert!(events.contains(&ProgressEvent::OutputLine(
            "[download]   0.1% of ~1.20GiB".into()
        )));
    }
}
