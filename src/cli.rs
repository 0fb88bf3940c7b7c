//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};
use mod_installer::FileDescriptor;
use std::path::PathBuf;

/// Download mod files and deploy them into a game directory.
///
/// Downloads run through aria2c (metalinks included), archives are extracted with
/// 7-Zip, and every other file is copied into place.
#[derive(Parser, Debug)]
#[command(name = "mod-installer")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the given files, then extract or copy them into the install directory
    Install(InstallArgs),

    /// List the games the mod listing has mods for
    Games {
        /// URL of the mod listing JSON
        #[arg(long)]
        manifest_url: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Files to install, as URL or URL@PRIORITY
    pub urls: Vec<FileDescriptor>,

    /// JSON file with an array of {"url": ..., "priority": ...} objects
    #[arg(long)]
    pub descriptors: Option<PathBuf>,

    /// Where downloads are stored
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Where files are deployed
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// Print what would be done without downloading or deploying
    #[arg(long)]
    pub dry_run: bool,

    /// Allow the downloader to use IPv6
    #[arg(long)]
    pub ipv6: bool,
}
