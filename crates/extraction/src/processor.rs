//! Per-run orchestration: resolve, fetch, derive, assemble, publish.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hrrr_common::{RunId, SourceLayout};
use storage::ObjectStorage;
use tracing::{info, instrument, warn};

use crate::catalog::{self, LogicalVariable};
use crate::derived::{self, FileRole};
use crate::error::{ExtractError, Result};
use crate::fetch::RangeFetcher;
use crate::grid::GridSubset;
use crate::manifest::ResolvedManifest;
use crate::record::{RecordColumns, RunRecordSet, DIRECT_COLUMNS};
use crate::source::GribSource;

/// Destination for assembled record sets.
#[async_trait]
pub trait RunPublisher: Send + Sync {
    /// Write `body` under `key`, replacing any previous object.
    async fn publish(&self, key: &str, body: Bytes) -> Result<()>;
}

#[async_trait]
impl RunPublisher for ObjectStorage {
    async fn publish(&self, key: &str, body: Bytes) -> Result<()> {
        self.put(key, body).await.map_err(|e| ExtractError::Publish {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

/// Settings a processor is built with.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub layout: SourceLayout,
    /// Object key prefix for published records
    pub output_prefix: String,
    /// Concurrent byte-range fetches within one run
    pub max_concurrent_fetches: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            layout: SourceLayout::default(),
            output_prefix: "CSV".to_string(),
            max_concurrent_fetches: 4,
        }
    }
}

/// Result of processing one run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Published { run: RunId, key: String, rows: usize },
    /// The run or one of its companions could not be used
    Skipped { run: RunId, reason: String },
}

/// Extracts runs and hands their records to a publisher.
pub struct RunProcessor {
    fetcher: RangeFetcher,
    publisher: Arc<dyn RunPublisher>,
    grid: GridSubset,
    direct: Vec<(&'static str, LogicalVariable)>,
    config: ProcessorConfig,
}

impl RunProcessor {
    /// Fails when a record column names a variable the catalog lacks.
    pub fn new(
        source: Arc<dyn GribSource>,
        publisher: Arc<dyn RunPublisher>,
        grid: GridSubset,
        config: ProcessorConfig,
    ) -> Result<Self> {
        let variables =
            catalog::validate_names(DIRECT_COLUMNS.iter().map(|(_, variable)| *variable))?;
        let direct = DIRECT_COLUMNS
            .iter()
            .map(|(column, _)| *column)
            .zip(variables)
            .collect();

        let fetcher = RangeFetcher::new(
            source,
            config.layout.clone(),
            config.max_concurrent_fetches,
        );

        Ok(Self {
            fetcher,
            publisher,
            grid,
            direct,
            config,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Extract the record set of the file at `file_url`.
    ///
    /// Companion files are looked up under the same root as `file_url`.
    #[instrument(skip(self), fields(url = %file_url))]
    pub async fn build_records(&self, file_url: &str) -> Result<RunRecordSet> {
        let layout = &self.config.layout;
        let (root, run) = layout.parse_url(file_url)?;

        let current = self.fetcher.resolve(file_url, run).await?;

        let plan = derived::plan(&run);
        let companion = match &plan.companion {
            Some(companion_run) => {
                let companion_url = layout.file_url_under(&root, companion_run);
                Some(self.fetcher.resolve(&companion_url, *companion_run).await?)
            }
            None => None,
        };

        let mut requests: Vec<((FileRole, LogicalVariable), &ResolvedManifest, LogicalVariable)> =
            self.direct
                .iter()
                .map(|(_, v)| ((FileRole::Current, *v), &current, *v))
                .collect();
        for (role, variable) in plan.reads() {
            let manifest = match role {
                FileRole::Current => &current,
                FileRole::Companion => companion.as_ref().ok_or_else(|| {
                    ExtractError::InvalidRun(format!("{} has no companion run", run))
                })?,
            };
            if !requests.iter().any(|(key, _, _)| *key == (role, variable)) {
                requests.push(((role, variable), manifest, variable));
            }
        }

        let fetched: HashMap<(FileRole, LogicalVariable), Vec<f32>> =
            self.fetcher.fetch_all(requests, &self.grid).await?;

        let mut columns = RecordColumns::default();
        for (column, variable) in &self.direct {
            let values = fetched
                .get(&(FileRole::Current, *variable))
                .cloned()
                .ok_or_else(|| ExtractError::MissingRead(format!("column {}", column)))?;
            columns.set_direct(column, values)?;
        }
        columns.precipitation_tot = plan.precipitation.evaluate(&fetched)?;
        columns.snowfall_tot = plan.snowfall.evaluate(&fetched)?;
        columns.freezing_rain = plan.freezing_rain.evaluate(&fetched)?;
        columns.cape255 = plan.cape.evaluate(&fetched)?;

        RunRecordSet::assemble(run, &self.grid, columns)
    }

    /// Extract and publish the file at `file_url`.
    ///
    /// Unavailable files and unrecognized layouts are reported as skipped;
    /// any other failure aborts the run without publishing.
    #[instrument(skip(self), fields(url = %file_url))]
    pub async fn process_url(&self, file_url: &str) -> Result<RunOutcome> {
        let (_, run) = self.config.layout.parse_url(file_url)?;

        let records = match self.build_records(file_url).await {
            Ok(records) => records,
            Err(e) if e.is_skippable() => {
                warn!(run = %run, reason = %e, "Skipping run");
                return Ok(RunOutcome::Skipped {
                    run,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let key = self
            .config
            .layout
            .output_key(&self.config.output_prefix, &run);
        let body = records.to_csv()?;
        self.publisher.publish(&key, body).await?;

        info!(run = %run, key = %key, rows = records.len(), "Published run");
        Ok(RunOutcome::Published {
            run,
            key,
            rows: records.len(),
        })
    }

    /// Extract and publish a run from the configured source root.
    pub async fn process_run(&self, run: &RunId) -> Result<RunOutcome> {
        let url = self.config.layout.file_url(run);
        self.process_url(&url).await
    }
}
