//! Wrappers around the external downloader (aria2c) and archiver (7-Zip)
//!
//! Both build a fixed argument list and hand it to a [`ToolRunner`]. They return the
//! tool's exit code untouched; deciding what a non-zero code means is left to the
//! caller.

use crate::config::DownloaderOptions;
use crate::error::Result;
use crate::process::ToolRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parameters of one downloader invocation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Directory to store the downloaded file(s)
    pub download_dir: Option<PathBuf>,
    /// File containing a list of URLs to download
    pub input_file: Option<PathBuf>,
    /// Single URL to download
    pub url: Option<String>,
    /// Treat the input as a metalink: follow it in memory and verify integrity
    pub follow_metalink: bool,
    /// Override the configured IPv6 setting for this call
    pub use_ipv6: Option<bool>,
}

impl DownloadRequest {
    /// Request for a single URL
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Request for every URL listed in `path`
    pub fn input_file(path: impl Into<PathBuf>) -> Self {
        Self {
            input_file: Some(path.into()),
            ..Default::default()
        }
    }

    /// Store results under `dir`
    pub fn into_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Enable or disable metalink following
    pub fn follow_metalink(mut self, follow: bool) -> Self {
        self.follow_metalink = follow;
        self
    }
}

/// Multi-connection downloader (aria2c)
#[derive(Clone)]
pub struct Downloader {
    runner: Arc<dyn ToolRunner>,
    executable: PathBuf,
    options: DownloaderOptions,
}

impl Downloader {
    /// Create a downloader driving `executable` through `runner`
    pub fn new(runner: Arc<dyn ToolRunner>, executable: PathBuf, options: DownloaderOptions) -> Self {
        Self {
            runner,
            executable,
            options,
        }
    }

    /// Path of the downloader executable
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run the downloader and return its exit code (0 = success)
    pub async fn download(&self, request: &DownloadRequest) -> Result<i32> {
        let args = self.arguments(request);
        self.runner.run(&self.executable, &args).await
    }

    /// Build the argument list for `request`
    pub fn arguments(&self, request: &DownloadRequest) -> Vec<String> {
        let opts = &self.options;
        let mut args = vec![
            "--file-allocation=none".to_string(),
            "--continue=true".to_string(),
            format!("--retry-wait={}", opts.retry_wait().as_secs()),
            // 0 = unlimited; aria2c still gives up when the server rejects the request
            format!("--max-tries={}", opts.max_tries),
            format!("--max-connection-per-server={}", opts.connections_per_server),
            format!("--split={}", opts.split),
            format!("--max-concurrent-downloads={}", opts.concurrent_items),
        ];

        if request.follow_metalink {
            args.push("--follow-metalink=mem".to_string());
            args.push("--check-integrity=true".to_string());
        } else {
            args.push("--follow-metalink=false".to_string());
        }

        if !request.use_ipv6.unwrap_or(opts.use_ipv6) {
            args.push("--disable-ipv6=true".to_string());
        }

        if let Some(dir) = &request.download_dir {
            args.push(format!("--dir={}", dir.display()));
        }

        if let Some(input_file) = &request.input_file {
            args.push(format!("--input-file={}", input_file.display()));
        }

        if let Some(url) = &request.url {
            args.push(url.clone());
        }

        args
    }
}

/// Archive extractor (7za / 7z)
#[derive(Clone)]
pub struct Archiver {
    runner: Arc<dyn ToolRunner>,
    executable: PathBuf,
}

impl Archiver {
    /// Create an archiver driving `executable` through `runner`
    pub fn new(runner: Arc<dyn ToolRunner>, executable: PathBuf) -> Self {
        Self { runner, executable }
    }

    /// Path of the archiver executable
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Extract `archive` (overwriting existing files) and return the exit code
    pub async fn extract(&self, archive: &Path, output_dir: Option<&Path>) -> Result<i32> {
        let args = Self::arguments(archive, output_dir);
        self.runner.run(&self.executable, &args).await
    }

    /// Build the argument list for extracting `archive`
    pub fn arguments(archive: &Path, output_dir: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "x".to_string(),
            archive.display().to_string(),
            "-aoa".to_string(), // overwrite all existing files without prompting
            "-bso1".to_string(), // standard output messages -> stdout
            "-bsp1".to_string(), // progress -> stdout
            "-bse2".to_string(), // errors -> stderr
        ];
        if let Some(dir) = output_dir {
            args.push(format!("-o{}", dir.display()));
        }
        args
    }
}
