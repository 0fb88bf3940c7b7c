//! CLI entry point for the mod installer.
//!
//! This is the single place where errors become user-facing messages and a process
//! exit status.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use mod_installer::{
    Config, Error, FileDescriptor, Pipeline, ProcessRunner, Result, ToolPaths, manifest,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command, InstallArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Install(install_args) => install(config, install_args).await,
        Command::Games { manifest_url } => list_games(&manifest_url).await,
    }
}

async fn install(mut config: Config, args: InstallArgs) -> Result<()> {
    if let Some(dir) = args.download_dir {
        config.download_dir = dir;
    }
    if let Some(dir) = args.install_dir {
        config.install_dir = dir;
    }
    config.dry_run |= args.dry_run;
    config.downloader.use_ipv6 |= args.ipv6;
    config.validate()?;

    let mut descriptors = match &args.descriptors {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            serde_json::from_str::<Vec<FileDescriptor>>(&raw)?
        }
        None => Vec::new(),
    };
    descriptors.extend(args.urls);
    if descriptors.is_empty() {
        return Err(Error::Config {
            message: "nothing to install: pass URLs or --descriptors".to_string(),
            key: None,
        });
    }
    FileDescriptor::sort_by_priority(&mut descriptors);

    // Both tools must exist before any list is built
    let tools = ToolPaths::discover(&config.tools).await?;

    let pipeline = Pipeline::from_config(
        &config,
        &tools,
        Arc::new(ProcessRunner::new()),
        descriptors,
    );
    pipeline.run().await?;

    info!(install_dir = %config.install_dir.display(), "installation finished");
    Ok(())
}

async fn list_games(manifest_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let mods = manifest::fetch_mod_list(&client, manifest_url).await?;
    println!("Supported games:");
    for game in manifest::supported_games(&mods) {
        println!("  {}", game);
    }
    Ok(())
}

fn report_fatal(error: &Error) {
    if !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }

    eprintln!("{}", format!("ERROR: {}", error).bold().red());
    if let Some(item) = error.offending_item() {
        eprintln!("Failed item: {}", item);
    }
    if let Error::Network(_) = error {
        eprintln!("Couldn't reach the mod server. Check your connection and try again.");
    }

    wait_before_exit();
}

/// Keep the console window open on Windows so the error stays readable
#[cfg(windows)]
fn wait_before_exit() {
    eprintln!("ERROR: The installer cannot continue. Press Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}

#[cfg(not(windows))]
fn wait_before_exit() {
    eprintln!("ERROR: The installer cannot continue.");
}
