//! Configuration for vidvault paths and downloader behavior.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (VIDVAULT_LIBRARY, VIDVAULT_YTDLP,
//!    VIDVAULT_TIMEOUT_SECS)
//! 2. Config file (.vidvault/config.yaml)
//! 3. Defaults (~/.vidvault/library, `yt-dlp` on PATH, 30 minute budget)
//!
//! Config file discovery searches the current directory and parents for
//! .vidvault/config.yaml; a relative library path in the file is resolved
//! against the config file's project root.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default per-download wall-clock budget in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30 * 60;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub downloader: Option<DownloaderConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Library directory (relative to the config file's project root)
    pub library: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloaderConfig {
    /// Downloader binary name or path
    pub binary: Option<String>,
    /// Per-download wall-clock budget
    pub timeout_seconds: Option<u64>,
}

/// Resolved settings with absolute paths.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute path to the library root
    pub library_root: PathBuf,
    /// Downloader binary name or path
    pub ytdlp_binary: String,
    /// Per-download wall-clock budget
    pub timeout: Duration,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from all sources.
    pub fn load() -> Result<Self> {
        let config_file = find_config_file();
        let file = match &config_file {
            Some(path) => Some(load_config_file(path)?),
            None => None,
        };

        let library_root = if let Ok(env_lib) = std::env::var("VIDVAULT_LIBRARY") {
            PathBuf::from(env_lib)
        } else if let Some(lib) = file.as_ref().and_then(|f| f.paths.library.as_deref()) {
            // Relative paths are anchored at the project root, the parent
            // of the .vidvault directory.
            let base = config_file
                .as_deref()
                .and_then(Path::parent)
                .and_then(Path::parent)
                .unwrap_or(Path::new("."));
            resolve_path(base, lib)
        } else {
            default_library_root()?
        };

        let downloader = file.as_ref().and_then(|f| f.downloader.clone());

        let ytdlp_binary = std::env::var("VIDVAULT_YTDLP")
            .ok()
            .or_else(|| downloader.as_ref().and_then(|d| d.binary.clone()))
            .unwrap_or_else(|| "yt-dlp".to_string());

        let timeout_secs = std::env::var("VIDVAULT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or_else(|| downloader.as_ref().and_then(|d| d.timeout_seconds))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            library_root,
            ytdlp_binary,
            timeout: Duration::from_secs(timeout_secs),
            config_file,
        })
    }
}

fn default_library_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(".vidvault").join("library"))
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".vidvault").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
