//! HRRR grid-subset extractor.
//!
//! Extracts a fixed set of surface variables at a fixed set of grid points
//! from HRRR files served over HTTP, fetching only the needed messages with
//! range requests, and publishes one CSV per run to object storage:
//! - Runs are enumerated from a time window or given as explicit URLs
//! - Runs already published are skipped unless `--force`
//! - Unavailable runs are reported as skipped; failed runs do not stop the batch

mod batch;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use extraction::{ExtractorConfig, GridSubset, HttpSource, PublishedRuns, RunProcessor};
use hrrr_common::RunId;
use storage::ObjectStorage;

#[derive(Parser, Debug)]
#[command(name = "extractor")]
#[command(about = "Extract HRRR variables at a grid subset and publish per-run CSVs")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "EXTRACTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Grid subset CSV (overrides grid.path from the config)
    #[arg(long, env = "GRID_FILE")]
    grid: Option<PathBuf>,

    /// First analysis hour (inclusive), e.g. 2024-01-15T00
    #[arg(long)]
    start: Option<String>,

    /// Last analysis hour (exclusive)
    #[arg(long)]
    end: Option<String>,

    /// Forecast hours, e.g. "0", "0,1,2" or "0-18"
    #[arg(long, default_value = "0")]
    forecast_hours: String,

    /// Explicit source file URLs (repeatable); replaces --start/--end
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Maximum runs processed concurrently
    #[arg(long)]
    max_concurrent_runs: Option<usize>,

    /// List pending runs without processing them
    #[arg(long)]
    dry_run: bool,

    /// Reprocess runs that are already published
    #[arg(long)]
    force: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting HRRR extractor");

    let mut config = match &args.config {
        Some(path) => ExtractorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let mut config = ExtractorConfig::default();
            config.storage.apply_env();
            config
        }
    };
    if let Some(n) = args.max_concurrent_runs {
        config.concurrency.max_concurrent_runs = n;
    }
    config.validate().context("Invalid configuration")?;

    let layout = config.source.clone();

    // Candidate runs, each with the URL it is read from
    let mut candidates: BTreeMap<RunId, String> = BTreeMap::new();
    if !args.urls.is_empty() {
        for url in &args.urls {
            let (_, run) = layout
                .parse_url(url)
                .with_context(|| format!("Unrecognized source URL: {}", url))?;
            candidates.insert(run, url.clone());
        }
    } else {
        let (start, end) = match (&args.start, &args.end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(anyhow!("Either --url or both --start and --end are required")),
        };
        let hours = batch::parse_forecast_hours(&args.forecast_hours)?;
        for run in batch::enumerate_runs(start, end, &hours)? {
            candidates.insert(run, layout.file_url(&run));
        }
    }

    let storage = Arc::new(
        ObjectStorage::new(&config.storage).context("Failed to create object storage client")?,
    );

    let published = if args.force {
        PublishedRuns::default()
    } else {
        PublishedRuns::load(&storage, &layout, &config.output.prefix)
            .await
            .context("Failed to list published runs")?
    };

    let pending = published.pending(candidates.keys().copied());
    info!(
        candidates = candidates.len(),
        published = published.len(),
        pending = pending.len(),
        "Enumerated runs"
    );

    if args.dry_run {
        for run in &pending {
            info!(run = %run, url = %candidates[run], "Pending run");
        }
        return Ok(());
    }

    let grid_path = args
        .grid
        .clone()
        .or_else(|| config.grid.path.clone())
        .ok_or_else(|| anyhow!("No grid subset file: pass --grid or set grid.path"))?;
    let grid = GridSubset::from_path(&grid_path, &config.grid.column)
        .with_context(|| format!("Failed to load grid subset from {}", grid_path.display()))?;

    let source = Arc::new(
        HttpSource::new(config.http.clone()).context("Failed to create HTTP client")?,
    );
    let processor = RunProcessor::new(source, storage, grid, config.processor())
        .context("Variable catalog validation failed")?;

    let urls = pending
        .iter()
        .filter_map(|run| candidates.get(run).cloned())
        .collect();
    let summary =
        batch::process_all(&processor, urls, config.concurrency.max_concurrent_runs).await;

    info!(
        published = summary.published,
        skipped = summary.skipped,
        failed = summary.failed,
        "Extractor finished"
    );

    Ok(())
}
