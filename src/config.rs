//! Configuration types for mod-installer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// External tool discovery settings
///
/// Groups settings for the downloader and archiver binaries.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit path to the downloader (probed before the candidates if set)
    #[serde(default)]
    pub downloader_path: Option<PathBuf>,

    /// Explicit path to the archiver (probed before the candidates if set)
    #[serde(default)]
    pub archiver_path: Option<PathBuf>,

    /// Downloader candidates, tried in order (default: ./aria2c, ./.aria2c, aria2c)
    #[serde(default = "default_downloader_candidates")]
    pub downloader_candidates: Vec<String>,

    /// Archiver candidates, tried in order (default: ./7za, ./.7za, 7za, ./7z, 7z)
    #[serde(default = "default_archiver_candidates")]
    pub archiver_candidates: Vec<String>,

    /// Argument that makes a healthy tool exit with status 0 (default: "-h")
    #[serde(default = "default_probe_flag")]
    pub probe_flag: String,

    /// Resolve bare command names to absolute paths through PATH (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            downloader_path: None,
            archiver_path: None,
            downloader_candidates: default_downloader_candidates(),
            archiver_candidates: default_archiver_candidates(),
            probe_flag: default_probe_flag(),
            search_path: true,
        }
    }
}

impl ToolsConfig {
    /// Downloader candidates with the explicit path (if any) first
    pub fn downloader_probe_order(&self) -> Vec<String> {
        probe_order(self.downloader_path.as_deref(), &self.downloader_candidates)
    }

    /// Archiver candidates with the explicit path (if any) first
    pub fn archiver_probe_order(&self) -> Vec<String> {
        probe_order(self.archiver_path.as_deref(), &self.archiver_candidates)
    }
}

fn probe_order(explicit: Option<&Path>, candidates: &[String]) -> Vec<String> {
    explicit
        .map(|p| p.display().to_string())
        .into_iter()
        .chain(candidates.iter().cloned())
        .collect()
}

/// Fixed tuning passed to every downloader invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloaderOptions {
    /// Seconds to wait between retries of a single transfer (default: 5)
    #[serde(default = "default_retry_wait_secs")]
    pub retry_wait_secs: u64,

    /// Maximum tries per transfer, 0 = unlimited (default: 0)
    #[serde(default)]
    pub max_tries: u32,

    /// Connections per server (default: 8)
    #[serde(default = "default_connections")]
    pub connections_per_server: u32,

    /// Connections per download item (default: 8)
    #[serde(default = "default_connections")]
    pub split: u32,

    /// Items downloaded in parallel by the tool itself (default: 1)
    #[serde(default = "default_concurrent_items")]
    pub concurrent_items: u32,

    /// Allow IPv6 (default: false)
    #[serde(default)]
    pub use_ipv6: bool,
}

impl Default for DownloaderOptions {
    fn default() -> Self {
        Self {
            retry_wait_secs: default_retry_wait_secs(),
            max_tries: 0,
            connections_per_server: default_connections(),
            split: default_connections(),
            concurrent_items: default_concurrent_items(),
            use_ipv6: false,
        }
    }
}

impl DownloaderOptions {
    /// Retry wait as a duration
    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait_secs)
    }
}

/// Main configuration for an install run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Where downloads are stored before deployment (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Final deployment directory (default: "./install")
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// External tool discovery
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Downloader tuning
    #[serde(default)]
    pub downloader: DownloaderOptions,

    /// Log every planned action but run nothing (default: false)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            install_dir: default_install_dir(),
            tools: ToolsConfig::default(),
            downloader: DownloaderOptions::default(),
            dry_run: false,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults. The result is validated before
    /// being returned.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every run fail
    pub fn validate(&self) -> Result<()> {
        if self.tools.downloader_probe_order().is_empty() {
            return Err(Error::Config {
                message: "no downloader candidates configured".to_string(),
                key: Some("tools.downloader_candidates".to_string()),
            });
        }
        if self.tools.archiver_probe_order().is_empty() {
            return Err(Error::Config {
                message: "no archiver candidates configured".to_string(),
                key: Some("tools.archiver_candidates".to_string()),
            });
        }
        for (key, value) in [
            ("downloader.connections_per_server", self.downloader.connections_per_server),
            ("downloader.split", self.downloader.split),
            ("downloader.concurrent_items", self.downloader.concurrent_items),
        ] {
            if value == 0 {
                return Err(Error::Config {
                    message: format!("{} must be at least 1", key),
                    key: Some(key.to_string()),
                });
            }
        }
        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("./install")
}

fn default_downloader_candidates() -> Vec<String> {
    ["./aria2c", "./.aria2c", "aria2c"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_archiver_candidates() -> Vec<String> {
    ["./7za", "./.7za", "7za", "./7z", "7z"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_probe_flag() -> String {
    "-h".to_string()
}

fn default_true() -> bool {
    true
}

fn default_retry_wait_secs() -> u64 {
    5
}

fn default_connections() -> u32 {
    8
}

fn default_concurrent_items() -> u32 {
    1
}
