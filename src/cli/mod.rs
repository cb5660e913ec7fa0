//! Command-line interface for vidvault.
//!
//! A thin layer over the core: every subcommand maps directly onto one
//! library or downloader operation. No logic of its own beyond output
//! formatting.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Settings;
use crate::download::Downloader;
use crate::library::{SortOrder, VideoLibrary};
use crate::ProgressSink;

/// vidvault - Self-hosted video library with download orchestration
#[derive(Parser, Debug)]
#[command(name = "vidvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a video into the library
    Download {
        /// Source URL
        url: String,
    },

    /// List videos in the library
    List {
        /// Filter by a search query
        #[arg(short, long)]
        query: Option<String>,

        /// Sort order
        #[arg(short, long, value_enum, default_value = "newest")]
        sort: SortArg,
    },

    /// Search the library
    Search {
        /// Search query (matches title, uploader, description)
        query: String,
    },

    /// Show details of one video
    Show {
        /// Video id
        id: String,
    },

    /// Delete a video and its files
    Delete {
        /// Video id
        id: String,
    },

    /// Resolve a library-relative path (rejects traversal attempts)
    Path {
        /// Relative path inside the library
        relative: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SortArg {
    Newest,
    Title,
    Size,
    Duration,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => SortOrder::Newest,
            SortArg::Title => SortOrder::Title,
            SortArg::Size => SortOrder::Size,
            SortArg::Duration => SortOrder::Duration,
        }
    }
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load()?;
        let library = Arc::new(
            VideoLibrary::open(&settings.library_root)
                .await
                .with_context(|| {
                    format!("opening library at {}", settings.library_root.display())
                })?,
        );

        match self.command {
            Commands::Download { url } => {
                let downloader = Downloader::new(
                    Arc::clone(&library),
                    settings.ytdlp_binary.clone(),
                    settings.timeout,
                );

                let (sink, mut rx) = ProgressSink::channel();
                let handle = tokio::spawn(async move { downloader.download(&url, sink).await });

                while let Some(event) = rx.recv().await {
                    println!("{}", event);
                }

                let entry = handle.await.context("download task panicked")??;
                println!();
                println!("  id:    {}", entry.id);
                println!("  file:  {}", entry.file_path.display());
                println!("  size:  {}", entry.format_file_size());
            }

            Commands::List { query, sort } => {
                let entries = library.query(query.as_deref(), sort.into()).await;
                if entries.is_empty() {
                    println!("Library is empty.");
                    return Ok(());
                }
                for entry in entries {
                    println!(
                        "{}  {:40}  {:>10}  {}",
                        entry.id,
                        truncate(&entry.title, 40),
                        entry.format_file_size(),
                        entry.format_duration(),
                    );
                }
            }

            Commands::Search { query } => {
                let results = library.search(&query).await;
                println!("{} result(s) for '{}'", results.len(), query);
                for entry in results {
                    println!("{}  {}", entry.id, entry.title);
                }
            }

            Commands::Show { id } => match library.get(&id).await {
                Some(entry) => {
                    println!("id:          {}", entry.id);
                    println!("title:       {}", entry.title);
                    println!("uploader:    {}", entry.uploader);
                    println!("uploaded:    {}", entry.upload_date);
                    println!("duration:    {}", entry.format_duration());
                    println!("size:        {}", entry.format_file_size());
                    println!("file:        {}", entry.file_path.display());
                    if !entry.thumbnail.is_empty() {
                        println!("thumbnail:   {}", entry.thumbnail);
                    }
                    println!("url:         {}", entry.url);
                    println!("registered:  {}", entry.created_at.to_rfc3339());
                }
                None => anyhow::bail!("video not found: {}", id),
            },

            Commands::Delete { id } => {
                let entry = library.delete(&id).await?;
                println!("Deleted '{}' ({})", entry.title, entry.id);
            }

            Commands::Path { relative } => {
                let resolved = library.secure_path(&relative)?;
                println!("{}", resolved.display());
            }

            Commands::Config => {
                println!("library root: {}", settings.library_root.display());
                println!("downloader:   {}", settings.ytdlp_binary);
                println!("timeout:      {}s", settings.timeout.as_secs());
                match settings.config_file {
                    Some(path) => println!("config file:  {}", path.display()),
                    None => println!("config file:  (none)"),
                }
            }
        }

        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
