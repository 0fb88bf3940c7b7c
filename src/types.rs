//! Core types for mod-installer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One item to fetch: a URL plus the priority the caller used to order it
///
/// Descriptors are supplied once at [`Pipeline`](crate::pipeline::Pipeline) construction
/// and only read afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Remote location of the file or metalink descriptor
    pub url: String,
    /// Ordering key; lower values are processed first
    #[serde(default)]
    pub priority: i32,
}

impl FileDescriptor {
    /// Create a new descriptor
    pub fn new(url: impl Into<String>, priority: i32) -> Self {
        Self {
            url: url.into(),
            priority,
        }
    }

    /// Stably sort descriptors by ascending priority
    ///
    /// Descriptors with equal priority keep their relative order.
    pub fn sort_by_priority(descriptors: &mut [FileDescriptor]) {
        descriptors.sort_by_key(|d| d.priority);
    }
}

impl std::str::FromStr for FileDescriptor {
    type Err = String;

    /// Parse `URL` or `URL@PRIORITY`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty URL".to_string());
        }
        match s.rsplit_once('@') {
            Some((url, priority)) if !url.is_empty() => match priority.parse::<i32>() {
                Ok(priority) => Ok(Self::new(url, priority)),
                // '@' inside the URL itself (e.g. credentials), not a priority suffix
                Err(_) => Ok(Self::new(s, 0)),
            },
            _ => Ok(Self::new(s, 0)),
        }
    }
}

/// The two ordered work lists derived from a descriptor sequence
///
/// `extract_list` is never shorter than `download_list`; the two are equal in length
/// exactly when no metalink descriptors were present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// URLs to download, in order (metalink URLs included verbatim)
    pub download_list: Vec<String>,
    /// Filenames to extract or copy, in order
    pub extract_list: Vec<String>,
}

/// Resolved external executables, verified runnable at startup
///
/// Created once by [`ToolPaths::discover`](crate::locator) and passed explicitly into
/// pipeline construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    /// The multi-connection downloader (aria2c)
    pub downloader: PathBuf,
    /// The archive extractor (7za / 7z)
    pub archiver: PathBuf,
}

/// How an entry of the extract list is deployed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployAction {
    /// Extract with the archiver into the install directory
    Extract,
    /// Copy the file into the install directory
    Copy,
}
