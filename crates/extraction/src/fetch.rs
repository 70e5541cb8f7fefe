//! Manifest resolution and per-variable range fetching.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use hrrr_common::{RunId, SourceLayout};
use tracing::{debug, info, instrument};

use crate::catalog::{LogicalVariable, VariableIndex};
use crate::error::{ExtractError, Result};
use crate::grid::GridSubset;
use crate::manifest::{ManifestIndex, ResolvedManifest};
use crate::source::GribSource;

/// Fetches single messages out of source files and reduces them to the
/// grid subset.
#[derive(Clone)]
pub struct RangeFetcher {
    source: Arc<dyn GribSource>,
    layout: SourceLayout,
    max_concurrent: usize,
}

impl RangeFetcher {
    pub fn new(source: Arc<dyn GribSource>, layout: SourceLayout, max_concurrent: usize) -> Self {
        Self {
            source,
            layout,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fetch a file's manifest and recognize its format version.
    #[instrument(skip(self), fields(url = %file_url, run = %run))]
    pub async fn resolve(&self, file_url: &str, run: RunId) -> Result<ResolvedManifest> {
        let manifest_url = self.layout.manifest_url(file_url);
        let lines = self.source.fetch_manifest(&manifest_url).await?;
        let index = ManifestIndex::parse(lines.iter().map(String::as_str))?;
        let manifest = ResolvedManifest::new(file_url, run, index)?;

        info!(
            version = %manifest.version,
            messages = manifest.index.len(),
            "Resolved manifest"
        );
        Ok(manifest)
    }

    /// Fetch one variable's values at the grid subset positions.
    ///
    /// An absent variable yields zeros without touching the source.
    #[instrument(skip(self, index, grid), fields(url = %file_url))]
    pub async fn fetch_variable(
        &self,
        file_url: &str,
        variable: VariableIndex,
        index: &ManifestIndex,
        grid: &GridSubset,
    ) -> Result<Vec<f32>> {
        let ordinal = match variable {
            VariableIndex::Absent => return Ok(grid.zeros()),
            VariableIndex::Ordinal(o) => o,
        };

        let entry = index
            .get(ordinal)
            .ok_or_else(|| ExtractError::MissingOrdinal {
                url: file_url.to_string(),
                ordinal,
            })?;

        let bytes = self.source.fetch_range(file_url, &entry.range).await?;
        let values =
            grib2_parser::decode_message(&bytes).map_err(|source| ExtractError::Decode {
                url: file_url.to_string(),
                source,
            })?;

        debug!(
            ordinal,
            description = %entry.description,
            points = values.len(),
            "Decoded message"
        );
        grid.select(&values)
    }

    /// Fetch a logical variable from a resolved file.
    pub async fn fetch(
        &self,
        manifest: &ResolvedManifest,
        variable: LogicalVariable,
        grid: &GridSubset,
    ) -> Result<Vec<f32>> {
        let index = variable.index(manifest.version)?;
        self.fetch_variable(&manifest.file_url, index, &manifest.index, grid)
            .await
    }

    /// Fetch many (key, file, variable) requests with bounded concurrency.
    ///
    /// Either every request succeeds or the first failure is returned.
    pub async fn fetch_all<K>(
        &self,
        requests: Vec<(K, &ResolvedManifest, LogicalVariable)>,
        grid: &GridSubset,
    ) -> Result<HashMap<K, Vec<f32>>>
    where
        K: std::hash::Hash + Eq + Send,
    {
        stream::iter(requests)
            .map(|(key, manifest, variable)| async move {
                let values = self.fetch(manifest, variable, grid).await?;
                Ok::<_, ExtractError>((key, values))
            })
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await
    }
}
