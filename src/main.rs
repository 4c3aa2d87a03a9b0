//! CLI entry point for the F-Droid APK downloader.

use anyhow::{Context, Result};
use clap::Parser;
use fdroid_downloader::{FdroidClient, download_packages, resolve_packages};
use tracing::{debug, info};

mod app_config;
mod cli;

use cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let file_config = app_config::load_file_config(args.config.as_deref())?;
    let settings = app_config::resolve_settings(&args, file_config.as_ref())?;
    debug!(?settings, "resolved settings");

    let client =
        FdroidClient::new(&settings.client).context("Failed to initialize HTTP client")?;

    if args.dry_run {
        let infos = resolve_packages(&client, &args.packages, settings.search).await?;
        for info in &infos {
            println!("{}", serde_json::to_string(info)?);
        }
        return Ok(());
    }

    info!(
        packages = args.packages.len(),
        dir = %settings.output_dir.display(),
        search = settings.search,
        "Downloading packages"
    );

    let paths = download_packages(
        &client,
        &args.packages,
        &settings.output_dir,
        settings.search,
    )
    .await?;

    for path in &paths {
        println!("{}", path.display());
    }

    Ok(())
}
