//! Error types for mod-installer
//!
//! Every fatal condition of an install run is a variant of [`Error`]. The library
//! never terminates the process itself: errors propagate to the caller (the binary's
//! `main`), which reports them and exits.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mod-installer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mod-installer
#[derive(Debug, Error)]
pub enum Error {
    /// No candidate for a required tool ran successfully with the probe flag
    #[error("{tool} executable not found (tried: {})", candidates.join(", "))]
    ExecutableNotFound {
        /// Human-readable tool name (e.g. "aria2c")
        tool: String,
        /// Candidate paths or command names that were probed
        candidates: Vec<String>,
    },

    /// The downloader exited with a non-zero status
    #[error("could not download [{url}] (downloader exit code {exit_code})")]
    DownloadFailed {
        /// The URL that failed to download
        url: String,
        /// Exit code reported by the downloader
        exit_code: i32,
    },

    /// The archiver exited with a non-zero status
    #[error("could not extract [{}] (archiver exit code {exit_code})", archive.display())]
    ExtractionFailed {
        /// The archive that failed to extract
        archive: PathBuf,
        /// Exit code reported by the archiver
        exit_code: i32,
    },

    /// A metalink descriptor was not well-formed XML or lacked expected structure
    #[error("invalid metalink [{}]: {reason}", path.display())]
    MetalinkParse {
        /// Path of the downloaded descriptor
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// An external tool could not be started at all
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// The program that failed to start
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The mod listing requires a newer installer
    #[error(
        "installer is out of date: supports mod listings up to version {supported}, \
         but the latest listing is version {found}"
    )]
    ManifestOutdated {
        /// Highest listing version this build understands
        supported: u64,
        /// Version advertised by the listing
        found: u64,
    },

    /// The mod listing could not be interpreted
    #[error("invalid mod listing: {0}")]
    Manifest(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Short name of the item this error is about, if any
    ///
    /// Used by the top-level handler to point the user at the offending file or URL.
    pub fn offending_item(&self) -> Option<String> {
        match self {
            Error::DownloadFailed { url, .. } => Some(url.clone()),
            Error::ExtractionFailed { archive, .. } => Some(archive.display().to_string()),
            Error::MetalinkParse { path, .. } => Some(path.display().to_string()),
            Error::ExecutableNotFound { tool, .. } => Some(tool.clone()),
            Error::Spawn { program, .. } => Some(program.clone()),
            _ => None,
        }
    }
}
