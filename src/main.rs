//! CLI entry point for the fetchtv tool.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use fetchtv_core::discovery::FETCHTV_PORT;
use fetchtv_core::{
    CatalogError, DiscoveryOptions, FilterCriteria, HttpClient, SavePipeline, discover,
    fetch_recordings, filter_recordings,
};
use tracing::{debug, error, info};

mod app_config;
mod cli;
mod output;
mod progress;

use app_config::FileConfig;
use cli::Args;

/// Exit status when any item failed to save.
const EXIT_SAVE_FAILURES: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
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
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let loaded = app_config::load_config(args.config.as_deref())?;
    if let Some(path) = loaded.path.as_deref().filter(|_| loaded.config.is_some()) {
        debug!(path = %path.display(), "configuration loaded");
    }
    let file_config = loaded.values();

    let http = HttpClient::with_timeouts(file_config.http_timeouts());
    let options = discovery_options(&args, &file_config);
    info!(ip = ?options.ip, "Discovering Fetch TV server");
    let server = discover(&http, &options)
        .await
        .map_err(|err| discovery_error(err, &options))?;

    if args.info {
        output::write_server_info(&mut io::stdout().lock(), &server, args.json)?;
    }
    if !args.wants_catalog() {
        return Ok(ExitCode::SUCCESS);
    }

    let catalog = server.catalog(&http)?;
    let shows = fetch_recordings(&catalog)
        .await
        .context("Failed to read recordings from the server")?;
    let shows = filter_recordings(shows, &filter_criteria(&args), &http).await;

    let Some(root) = save_root(&args, &file_config) else {
        output::write_listing(&mut io::stdout().lock(), &shows, args.json)?;
        return Ok(ExitCode::SUCCESS);
    };

    info!(root = %root.display(), "Saving recordings");
    let overwrite = args.overwrite || file_config.overwrite.unwrap_or(false);
    let pipeline = SavePipeline::new(http.clone(), root).overwrite(overwrite);

    let result = if args.json {
        pipeline.save_all(&shows).await
    } else {
        let (events, renderer) = progress::spawn_event_renderer();
        let result = pipeline.with_events(events).save_all(&shows).await;
        // the pipeline owned the only sender, so the renderer drains and exits
        if let Err(join_error) = renderer.await {
            debug!(%join_error, "progress renderer stopped abnormally");
        }
        result
    };
    let report = result.context("Failed to open the saved-files registry")?;

    if args.json {
        let mut stdout = io::stdout().lock();
        output::write_save_results(&mut stdout, &report)?;
        stdout.flush()?;
    }

    if report.has_failures() {
        return Ok(ExitCode::from(EXIT_SAVE_FAILURES));
    }
    Ok(ExitCode::SUCCESS)
}

fn discovery_options(args: &Args, file_config: &FileConfig) -> DiscoveryOptions {
    DiscoveryOptions {
        ip: args.ip.clone().or_else(|| file_config.ip.clone()),
        port: args.port.or(file_config.port).unwrap_or(FETCHTV_PORT),
        timeout: file_config.discovery_timeout(),
    }
}

/// Adds a hint towards `--ip` when SSDP found nothing.
fn discovery_error(err: CatalogError, options: &DiscoveryOptions) -> anyhow::Error {
    if err.is_discovery_failure() && options.ip.is_none() {
        anyhow::Error::new(err)
            .context("No Fetch TV box answered SSDP discovery; pass --ip to connect directly")
    } else {
        err.into()
    }
}

fn filter_criteria(args: &Args) -> FilterCriteria {
    FilterCriteria {
        folder_include: args.folder.clone(),
        folder_exclude: args.exclude.clone(),
        title_include: args.title.clone(),
        shows_only: args.shows,
        live_only: args.isrecording,
    }
}

fn save_root(args: &Args, file_config: &FileConfig) -> Option<PathBuf> {
    args.save.clone().or_else(|| file_config.save_dir.clone())
}
