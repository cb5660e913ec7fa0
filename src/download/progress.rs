//! Progress streaming from an in-flight download to its caller.
//!
//! A bounded single-producer channel with backpressure: the orchestrator
//! awaits on send, the consumer relays events until the channel closes.
//! Channel closure is the terminal signal; the last event before it is
//! either `Completed` or `Failed`.

use tokio::sync::mpsc;

/// Channel capacity. Bounded on purpose: a stalled consumer slows the
/// event relay without buffering the subprocess's entire output in memory.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// One status update from an in-flight download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Metadata extraction has started.
    ExtractingMetadata,

    /// The download subprocess has started.
    DownloadStarted { title: String },

    /// A raw stdout/stderr line from the subprocess.
    OutputLine(String),

    /// The subprocess finished; artifact location and indexing in progress.
    Processing,

    /// Terminal success; the entry is committed under `id`.
    Completed { id: String },

    /// Terminal failure. `kind` is the machine-readable error class.
    Failed { kind: &'static str, message: String },
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtractingMetadata => write!(f, "Extracting video information..."),
            Self::DownloadStarted { title } => write!(f, "Starting download: {}", title),
            Self::OutputLine(line) => write!(f, "{}", line),
            Self::Processing => write!(f, "Download completed, processing metadata..."),
            Self::Completed { .. } => write!(f, "Video successfully downloaded and indexed!"),
            Self::Failed { message, .. } => write!(f, "Download failed: {}", message),
        }
    }
}

/// Sending half of a progress stream.
///
/// Sends never fail: a consumer that has gone away must not abort the
/// download it was watching.
#[derive(Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSink {
    /// Create a sink/receiver pair with the standard bounded capacity.
    pub fn channel() -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    /// Deliver an event, awaiting channel capacity. Disconnected receivers
    /// are ignored.
    pub async fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event).await;
    }
}
