//! The metadata store: in-memory index plus a durable JSON file.
//!
//! [`VideoLibrary`] owns the entry collection outright. Reads share a lock;
//! every mutation holds the write lock across both the in-memory change and
//! the disk rewrite, so memory and disk never diverge from a caller's point
//! of view. The durable file is rewritten wholesale through a temp file in
//! the same directory plus an atomic rename, so a crash mid-write leaves
//! the previous store intact.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{paths, scanner, METADATA_FILE};
use crate::domain::LibraryEntry;
use crate::error::LibraryError;

/// Sort applied to list/search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently registered first.
    #[default]
    Newest,
    /// Title, case-insensitive ascending.
    Title,
    /// Largest file first.
    Size,
    /// Longest first.
    Duration,
}

/// The video library: entry index, durable metadata file, and library root.
pub struct VideoLibrary {
    root: PathBuf,
    store_path: PathBuf,
    entries: RwLock<HashMap<String, LibraryEntry>>,
}

impl VideoLibrary {
    /// Open the library at `root`: create the directory if needed, load the
    /// metadata file, then scan for media files that are not indexed yet
    /// and persist any discoveries.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;

        let library = Self {
            store_path: root.join(METADATA_FILE),
            root,
            entries: RwLock::new(HashMap::new()),
        };

        library.load().await?;
        library.scan_existing().await?;

        Ok(library)
    }

    /// Library root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller-supplied relative path inside this library's root.
    pub fn secure_path(&self, requested: &str) -> Result<PathBuf, LibraryError> {
        paths::secure_path(&self.root, requested)
    }

    /// Read the durable file into memory, replacing prior contents.
    /// A missing file is an empty store, not an error.
    pub async fn load(&self) -> Result<(), LibraryError> {
        let content = match tokio::fs::read_to_string(&self.store_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.store_path.display(), "No metadata file yet");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let loaded: Vec<LibraryEntry> =
            serde_json::from_str(&content).map_err(LibraryError::Decode)?;

        let mut entries = self.entries.write().await;
        entries.clear();
        for entry in loaded {
            entries.insert(entry.id.clone(), entry);
        }

        info!(count = entries.len(), "Loaded metadata store");
        Ok(())
    }

    /// Serialize the full collection and overwrite the durable file.
    pub async fn save(&self) -> Result<(), LibraryError> {
        let entries = self.entries.read().await;
        Self::write_store(&self.store_path, &entries)
    }

    /// One-shot startup scan; registers and persists discovered files.
    async fn scan_existing(&self) -> Result<(), LibraryError> {
        let mut entries = self.entries.write().await;

        let known: HashSet<PathBuf> =
            entries.values().map(|e| e.file_path.clone()).collect();
        let discovered = scanner::scan(&self.root, &known)?;

        if discovered.is_empty() {
            return Ok(());
        }

        info!(count = discovered.len(), "Indexed existing media files");
        for entry in discovered {
            entries.insert(entry.id.clone(), entry);
        }
        Self::write_store(&self.store_path, &entries)
    }

    /// All entries, unsorted.
    pub async fn list(&self) -> Vec<LibraryEntry> {
        self.entries.read().await.values().cloned().collect()
    }

    /// Entries matching an optional query, sorted.
    pub async fn query(&self, query: Option<&str>, sort: SortOrder) -> Vec<LibraryEntry> {
        let mut results = match query {
            Some(q) if !q.trim().is_empty() => self.search(q).await,
            _ => self.list().await,
        };

        match sort {
            SortOrder::Newest => results.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Title => {
                results.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }
            SortOrder::Size => results.sort_by(|a, b| b.file_size.cmp(&a.file_size)),
            SortOrder::Duration => {
                results.sort_by(|a, b| b.duration.total_cmp(&a.duration))
            }
        }
        results
    }

    /// Case-insensitive substring match against title, uploader, and
    /// description. All matches, no ranking.
    pub async fn search(&self, query: &str) -> Vec<LibraryEntry> {
        let query = query.to_lowercase();

        self.entries
            .read()
            .await
            .values()
            .filter(|e| {
                e.title.to_lowercase().contains(&query)
                    || e.uploader.to_lowercase().contains(&query)
                    || e.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// Look up one entry by id.
    pub async fn get(&self, id: &str) -> Option<LibraryEntry> {
        self.entries.read().await.get(id).cloned()
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Insert or overwrite by id, then persist. Memory and disk are
    /// consistent before this returns.
    pub async fn put(&self, entry: LibraryEntry) -> Result<(), LibraryError> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.id.clone(), entry);
        Self::write_store(&self.store_path, &entries)
    }

    /// Remove an entry and its backing files, then persist.
    ///
    /// A missing media file is tolerated (the store should still converge);
    /// other unlink errors are surfaced. Thumbnail removal is best-effort.
    pub async fn delete(&self, id: &str) -> Result<LibraryEntry, LibraryError> {
        let mut entries = self.entries.write().await;

        let entry = entries
            .get(id)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;

        match tokio::fs::remove_file(&entry.file_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %entry.file_path.display(), "Media file already gone");
            }
            Err(e) => return Err(e.into()),
        }

        if !entry.thumbnail.is_empty() {
            let _ = tokio::fs::remove_file(&entry.thumbnail).await;
        }

        entries.remove(id);
        Self::write_store(&self.store_path, &entries)?;

        info!(%id, title = %entry.title, "Deleted video");
        Ok(entry)
    }

    /// Rewrite the durable file: serialize sorted by id (stable diffs),
    /// write to a temp file beside the target, rename into place.
    fn write_store(
        store_path: &Path,
        entries: &HashMap<String, LibraryEntry>,
    ) -> Result<(), LibraryError> {
        let mut all: Vec<&LibraryEntry> = entries.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));

        let json = serde_json::to_vec_pretty(&all).map_err(LibraryError::Encode)?;

        let dir = store_path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(store_path).map_err(|e| e.error)?;

        Ok(())
    }
}
