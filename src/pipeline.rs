//! Download-then-deploy pipeline
//!
//! A [`Pipeline`] turns an ordered list of [`FileDescriptor`]s into two work lists:
//!
//! - the **download list**: one URL per descriptor, metalink URLs included verbatim
//! - the **extract list**: the basename of every plain URL, and for each metalink the
//!   names of the files it describes, in place
//!
//! The lists are built lazily, exactly once, by whichever of [`Pipeline::download`] or
//! [`Pipeline::extract`] runs first. Downloads run strictly in order, then extractions
//! and copies run strictly in order. The first failing tool invocation aborts the run;
//! nothing is retried or skipped.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metalink::MetalinkResolver;
use crate::process::ToolRunner;
use crate::tools::{Archiver, DownloadRequest, Downloader};
use crate::types::{DeployAction, FileDescriptor, InstallPlan, ToolPaths};
use crate::utils::{copy_target_name, deploy_action, is_metalink_url, is_same_file, url_basename};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Downloads and deploys a list of files
pub struct Pipeline {
    descriptors: Vec<FileDescriptor>,
    download_dir: PathBuf,
    install_dir: PathBuf,
    downloader: Downloader,
    archiver: Archiver,
    resolver: MetalinkResolver,
    dry_run: bool,
    plan: OnceCell<InstallPlan>,
}

impl Pipeline {
    /// Create a pipeline over `descriptors`
    ///
    /// Descriptors are processed in the order given; sort them beforehand (see
    /// [`FileDescriptor::sort_by_priority`]) if priority ordering is wanted.
    pub fn new(
        descriptors: Vec<FileDescriptor>,
        download_dir: impl Into<PathBuf>,
        install_dir: impl Into<PathBuf>,
        downloader: Downloader,
        archiver: Archiver,
    ) -> Self {
        let resolver = MetalinkResolver::new(downloader.clone());
        Self {
            descriptors,
            download_dir: download_dir.into(),
            install_dir: install_dir.into(),
            downloader,
            archiver,
            resolver,
            dry_run: false,
            plan: OnceCell::new(),
        }
    }

    /// Create a pipeline from a configuration and the tools resolved at startup
    pub fn from_config(
        config: &Config,
        tools: &ToolPaths,
        runner: Arc<dyn ToolRunner>,
        descriptors: Vec<FileDescriptor>,
    ) -> Self {
        let downloader = Downloader::new(
            runner.clone(),
            tools.downloader.clone(),
            config.downloader.clone(),
        );
        let archiver = Archiver::new(runner, tools.archiver.clone());
        Self::new(
            descriptors,
            config.download_dir.clone(),
            config.install_dir.clone(),
            downloader,
            archiver,
        )
        .with_dry_run(config.dry_run)
    }

    /// Log planned downloads, extractions and copies instead of performing them
    ///
    /// Metalink descriptors are still fetched, since the extract list cannot be known
    /// without them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Directory downloads are stored in
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Directory files are deployed to
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Whether the work lists have been built
    pub fn is_built(&self) -> bool {
        self.plan.initialized()
    }

    /// The work lists, building them on first use
    pub async fn plan(&self) -> Result<&InstallPlan> {
        self.plan.get_or_try_init(|| self.build_plan()).await
    }

    async fn build_plan(&self) -> Result<InstallPlan> {
        info!(
            descriptors = self.descriptors.len(),
            "building download and extraction list"
        );

        let mut plan = InstallPlan::default();
        for descriptor in &self.descriptors {
            let url = &descriptor.url;
            if is_metalink_url(url) {
                let names = self.resolver.resolve(url, &self.download_dir).await?;
                info!(url = %url, files = ?names, "metalink contains");
                plan.download_list.push(url.clone());
                plan.extract_list.extend(names);
            } else {
                plan.download_list.push(url.clone());
                plan.extract_list.push(url_basename(url));
            }
        }

        info!("first these files will be downloaded:");
        for url in &plan.download_list {
            info!("  - {}", url);
        }
        info!("then these files will be extracted or copied:");
        for name in &plan.extract_list {
            info!("  - {}", name);
        }

        Ok(plan)
    }

    /// Download every entry of the download list, in order
    ///
    /// Both the download and install directories are created first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DownloadFailed`] for the first URL the downloader fails on;
    /// later URLs are not attempted.
    pub async fn download(&self) -> Result<()> {
        let plan = self.plan().await?;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        tokio::fs::create_dir_all(&self.install_dir).await?;

        for url in &plan.download_list {
            info!(url = %url, dir = %self.download_dir.display(), "downloading");
            if self.dry_run {
                continue;
            }

            let request = DownloadRequest::url(url.as_str())
                .into_dir(&self.download_dir)
                .follow_metalink(true);
            let exit_code = self.downloader.download(&request).await?;
            if exit_code != 0 {
                return Err(Error::DownloadFailed {
                    url: url.clone(),
                    exit_code,
                });
            }
        }
        Ok(())
    }

    /// Extract or copy every entry of the extract list, in order
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExtractionFailed`] for the first archive the archiver fails
    /// on, or an I/O error if a copy fails; later entries are not processed.
    pub async fn extract(&self) -> Result<()> {
        let plan = self.plan().await?;
        for filename in &plan.extract_list {
            self.deploy(filename).await?;
        }
        Ok(())
    }

    /// Download everything, then deploy everything
    pub async fn run(&self) -> Result<()> {
        self.download().await?;
        self.extract().await
    }

    async fn deploy(&self, filename: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.install_dir).await?;
        let source = self.download_dir.join(filename);

        info!(
            source = %source.display(),
            dest = %self.install_dir.display(),
            "copying or extracting"
        );
        if self.dry_run {
            return Ok(());
        }

        match deploy_action(filename) {
            DeployAction::Extract => {
                let exit_code = self
                    .archiver
                    .extract(&source, Some(&self.install_dir))
                    .await?;
                if exit_code != 0 {
                    return Err(Error::ExtractionFailed {
                        archive: source,
                        exit_code,
                    });
                }
            }
            DeployAction::Copy => {
                let target_name = copy_target_name(filename);
                copy_into(&source, &self.install_dir, Some(&target_name)).await?;
            }
        }
        Ok(())
    }
}

/// Copy `source` into `dest_dir`, optionally under a different file name
///
/// Existing files are overwritten. If the destination is the source file itself the
/// copy is skipped. Returns the destination path.
pub async fn copy_into(source: &Path, dest_dir: &Path, target_name: Option<&str>) -> Result<PathBuf> {
    let name = match target_name {
        Some(name) => PathBuf::from(name),
        None => source.file_name().map(PathBuf::from).ok_or_else(|| {
            Error::Io(std::io::Error::other(format!(
                "cannot copy {}: no file name",
                source.display()
            )))
        })?,
    };
    let dest = dest_dir.join(name);

    if is_same_file(source, &dest).await {
        warn!(
            path = %source.display(),
            "source and destination are the same, no action taken"
        );
        return Ok(dest);
    }

    tokio::fs::copy(source, &dest).await?;
    Ok(dest)
}
