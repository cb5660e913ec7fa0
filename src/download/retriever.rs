//! The external retrieval process behind a trait seam.
//!
//! Production use shells out to `yt-dlp`; tests substitute either a stub
//! binary or a mock [`Retriever`] implementation. The contract is the
//! subprocess contract: structured JSON on stdout in metadata mode,
//! free-text progress lines in download mode, non-zero exit on failure.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::progress::{ProgressEvent, ProgressSink};
use crate::domain::SourceMetadata;
use crate::error::{DownloadError, ProcessFailureKind};

/// Output template handed to the downloader: name files after the title.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Abstraction over the external retrieval process.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Metadata-only invocation: no download, one decodable JSON record.
    async fn extract_metadata(
        &self,
        url: &str,
        budget: Duration,
    ) -> Result<SourceMetadata, DownloadError>;

    /// Download invocation: writes the media file plus optional sidecar
    /// thumbnail into `dest`, streaming every output line into `sink`.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        sink: &ProgressSink,
        budget: Duration,
    ) -> Result<(), DownloadError>;
}

/// Retriever shelling out to the `yt-dlp` binary.
pub struct YtDlpRetriever {
    binary: String,
}

impl Default for YtDlpRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpRetriever {
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
        }
    }

    /// Use a custom binary path (configuration, test stubs).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl Retriever for YtDlpRetriever {
    async fn extract_metadata(
        &self,
        url: &str,
        budget: Duration,
    ) -> Result<SourceMetadata, DownloadError> {
        debug!(%url, binary = %self.binary, "Extracting metadata");

        let result = timeout(
            budget,
            Command::new(&self.binary)
                .args(["--dump-json", "--no-download"])
                .arg(url)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| DownloadError::Timeout {
            budget_secs: budget.as_secs(),
        })?;

        let output = result.map_err(DownloadError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::MetadataExtraction {
                detail: nonempty_or_status(stderr.trim(), output.status.code()),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| DownloadError::MetadataExtraction {
            detail: format!("undecodable metadata output: {}", e),
        })
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        sink: &ProgressSink,
        budget: Duration,
    ) -> Result<(), DownloadError> {
        debug!(%url, dest = %dest.display(), "Starting download process");

        let mut child = Command::new(&self.binary)
            .arg(url)
            .arg("-P")
            .arg(dest)
            .args(["-o", OUTPUT_TEMPLATE, "--write-thumbnail", "--newline"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(DownloadError::Spawn)?;

        // Both pipes are drained concurrently; a full pipe buffer on either
        // stream would otherwise deadlock the subprocess.
        let stdout_task = child
            .stdout
            .take()
            .map(|s| tokio::spawn(drain_lines(s, sink.clone(), false)));
        let stderr_task = child
            .stderr
            .take()
            .map(|s| tokio::spawn(drain_lines(s, sink.clone(), true)));

        let status = tokio::select! {
            status = child.wait() => status.map_err(DownloadError::Spawn)?,
            _ = tokio::time::sleep(budget) => {
                warn!(%url, budget_secs = budget.as_secs(), "Download timed out, killing subprocess");
                let _ = child.kill().await;
                // The kill closes both pipes; wait for the drains to hit EOF
                // so no output line trails the caller's terminal event.
                if let Some(task) = stdout_task {
                    let _ = task.await;
                }
                if let Some(task) = stderr_task {
                    let _ = task.await;
                }
                return Err(DownloadError::Timeout {
                    budget_secs: budget.as_secs(),
                });
            }
        };

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        let stderr_lines = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        if !status.success() {
            let detail = nonempty_or_status(stderr_lines.join("\n").trim(), status.code());
            return Err(DownloadError::Process {
                kind: ProcessFailureKind::classify(&detail),
                detail,
            });
        }

        Ok(())
    }
}

/// Relay a child stream into the sink line by line; optionally keep a copy
/// for post-mortem classification.
async fn drain_lines<R>(reader: R, sink: ProgressSink, capture: bool) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut captured = Vec::new();

    while let Ok(Some(line)) = lines.next_line().await {
        if capture {
            captured.push(line.clone());
        }
        sink.send(ProgressEvent::OutputLine(line)).await;
    }

    captured
}

fn nonempty_or_status(detail: &str, code: Option<i32>) -> String {
    if detail.is_empty() {
        format!("process exited with status {}", code.unwrap_or(-1))
    } else {
        detail.to_string()
    }
}
