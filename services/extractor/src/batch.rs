//! Run enumeration and bounded-concurrency batch processing.

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use hrrr_common::{hourly_range, parse_datetime, RunId};
use tracing::{error, info};

use extraction::{RunOutcome, RunProcessor};

/// Parse forecast hours such as `"0"`, `"0,1,2"` or `"0-18"`.
pub fn parse_forecast_hours(spec: &str) -> Result<Vec<u32>> {
    let mut hours = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((from, to)) => {
                let from: u32 = from
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid forecast hour range: {}", part))?;
                let to: u32 = to
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid forecast hour range: {}", part))?;
                if from > to {
                    return Err(anyhow!("Empty forecast hour range: {}", part));
                }
                hours.extend(from..=to);
            }
            None => hours.push(
                part.parse()
                    .with_context(|| format!("Invalid forecast hour: {}", part))?,
            ),
        }
    }

    if hours.is_empty() {
        return Err(anyhow!("No forecast hours given"));
    }
    hours.sort_unstable();
    hours.dedup();
    Ok(hours)
}

/// Every (analysis hour in `[start, end)`, forecast hour) pair.
pub fn enumerate_runs(start: &str, end: &str, forecast_hours: &[u32]) -> Result<Vec<RunId>> {
    let start = parse_datetime(start).with_context(|| format!("Invalid start time: {}", start))?;
    let end = parse_datetime(end).with_context(|| format!("Invalid end time: {}", end))?;

    let mut runs = Vec::new();
    for analysis in hourly_range(start, end) {
        for &fh in forecast_hours {
            runs.push(RunId::new(analysis, fh)?);
        }
    }
    Ok(runs)
}

/// Counts of a finished batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, result: &extraction::Result<RunOutcome>) {
        match result {
            Ok(RunOutcome::Published { .. }) => self.published += 1,
            Ok(RunOutcome::Skipped { .. }) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Process every URL with at most `max_concurrent` runs in flight.
///
/// A failed run is logged and counted; it never stops the batch.
pub async fn process_all(
    processor: &RunProcessor,
    urls: Vec<String>,
    max_concurrent: usize,
) -> BatchSummary {
    let results = stream::iter(urls)
        .map(|url| async move {
            let result = processor.process_url(&url).await;
            if let Err(e) = &result {
                error!(url = %url, error = %e, "Run failed");
            }
            result
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut summary = BatchSummary::default();
    for result in &results {
        summary.record(result);
    }

    info!(
        published = summary.published,
        skipped = summary.skipped,
        failed = summary.failed,
        "Batch complete"
    );
    summary
}
