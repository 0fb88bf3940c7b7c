//! # mod-installer
//!
//! Download-and-deploy pipeline for mod installation.
//!
//! The crate drives two external executables as subprocesses: a multi-connection
//! downloader (aria2c) and an archive extractor (7-Zip). A [`Pipeline`] takes an
//! ordered list of [`FileDescriptor`]s, expands metalink descriptors into the files they
//! name, downloads everything in order, then extracts archives and copies every other
//! file into the install directory. The first failing tool invocation aborts the run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mod_installer::{Config, FileDescriptor, Pipeline, ProcessRunner, ToolPaths};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!
//!     // Fails fast if aria2c or 7-Zip cannot be found
//!     let tools = ToolPaths::discover(&config.tools).await?;
//!
//!     let mut files = vec![
//!         FileDescriptor::new("https://example.com/patch.meta4", 1),
//!         FileDescriptor::new("https://example.com/base.7z", 0),
//!     ];
//!     FileDescriptor::sort_by_priority(&mut files);
//!
//!     let pipeline = Pipeline::from_config(&config, &tools, Arc::new(ProcessRunner::new()), files);
//!     pipeline.download().await?;
//!     pipeline.extract().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Executable discovery
pub mod locator;
/// Mod listing fetch
pub mod manifest;
/// Metalink descriptor resolution
pub mod metalink;
/// Download and deploy pipeline
pub mod pipeline;
/// Running external processes
pub mod process;
/// Downloader and archiver wrappers
pub mod tools;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, DownloaderOptions, ToolsConfig};
pub use error::{Error, Result};
pub use metalink::MetalinkResolver;
pub use pipeline::Pipeline;
pub use process::{ProcessRunner, ToolRunner};
pub use tools::{Archiver, DownloadRequest, Downloader};
pub use types::{FileDescriptor, InstallPlan, ToolPaths};
