//! CLI entry point for paperfetch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use paperfetch_core::{
    AcquisitionConfig, AcquisitionOrchestrator, OutcomeStatus, PdfFetcher, SearchClient,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
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
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let mut config = match &args.config {
        Some(path) => AcquisitionConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AcquisitionConfig::load_default().context("loading default config")?,
    };
    args.apply_to(&mut config);
    config.validate().context("invalid configuration")?;

    let search = Arc::new(SearchClient::from_config(&config)?);
    let fetcher = Arc::new(PdfFetcher::from_config(&config)?);
    let orchestrator = AcquisitionOrchestrator::new(config, search, fetcher);

    let target = orchestrator.target_for(&args.topic, args.count)?;
    info!(
        topic = target.topic(),
        requested = target.requested_count(),
        "paperfetch starting"
    );

    let report = orchestrator.run(&target).await?;

    for outcome in &report.outcomes {
        match (&outcome.file_path, outcome.status) {
            (Some(path), _) => println!("{:<16} {}", outcome.status, path.display()),
            (None, OutcomeStatus::NoPdfAvailable) => {
                debug!(title = %outcome.candidate.title, "no open-access PDF");
            }
            (None, status) => println!("{status:<16} {}", outcome.candidate.title),
        }
    }
    println!(
        "Saved {} of {} papers in {}",
        report.success_count,
        target.requested_count(),
        report.topic_dir.display()
    );

    if !report.is_complete() {
        warn!(
            saved = report.success_count,
            requested = target.requested_count(),
            "fewer papers available than requested"
        );
    }

    if let Some(error) = report.manifest_error {
        return Err(error).context("downloads kept, but the manifest could not be written");
    }

    Ok(())
}
