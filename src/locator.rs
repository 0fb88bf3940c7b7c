//! Startup discovery of the downloader and archiver executables
//!
//! Each candidate is run once with a probe flag; the first one that exits with status 0
//! wins. Bare command names are resolved through `PATH` with the `which` crate so the
//! rest of the run uses an absolute path.

use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use crate::types::ToolPaths;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Display name of the downloader in errors and logs
pub const DOWNLOADER_TOOL: &str = "aria2c";
/// Display name of the archiver in errors and logs
pub const ARCHIVER_TOOL: &str = "7-zip (7za or 7z)";

/// Return the first candidate that runs and exits 0 when given `flag`
///
/// Probe output is discarded. Candidates that fail to spawn or exit non-zero are
/// skipped. When `search_path` is set, candidates without a directory component are
/// resolved through `PATH` first and the resolved absolute path is returned.
pub async fn find_working_executable(
    candidates: &[String],
    flag: &str,
    search_path: bool,
) -> Option<PathBuf> {
    for candidate in candidates {
        let path = resolve_candidate(candidate, search_path);
        if probe(&path, flag).await {
            info!(path = %path.display(), "found valid executable");
            return Some(path);
        }
    }
    None
}

fn resolve_candidate(candidate: &str, search_path: bool) -> PathBuf {
    let as_path = Path::new(candidate);
    let is_bare_name = as_path.components().count() == 1 && !candidate.starts_with('.');
    if search_path
        && is_bare_name
        && let Ok(resolved) = which::which(candidate)
    {
        return resolved;
    }
    as_path.to_path_buf()
}

async fn probe(path: &Path, flag: &str) -> bool {
    let status = Command::new(path)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => true,
        Ok(status) => {
            debug!(path = %path.display(), %status, "candidate exited unsuccessfully");
            false
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "candidate could not be executed");
            false
        }
    }
}

impl ToolPaths {
    /// Resolve both tools required by an install run
    ///
    /// This is the explicit startup step that must succeed before any pipeline work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutableNotFound`] naming the first tool for which no
    /// candidate succeeded.
    pub async fn discover(tools: &ToolsConfig) -> Result<Self> {
        let downloader = locate(
            DOWNLOADER_TOOL,
            &tools.downloader_probe_order(),
            &tools.probe_flag,
            tools.search_path,
        )
        .await?;
        let archiver = locate(
            ARCHIVER_TOOL,
            &tools.archiver_probe_order(),
            &tools.probe_flag,
            tools.search_path,
        )
        .await?;
        Ok(Self {
            downloader,
            archiver,
        })
    }
}

async fn locate(tool: &str, candidates: &[String], flag: &str, search_path: bool) -> Result<PathBuf> {
    find_working_executable(candidates, flag, search_path)
        .await
        .ok_or_else(|| Error::ExecutableNotFound {
            tool: tool.to_string(),
            candidates: candidates.to_vec(),
        })
}
