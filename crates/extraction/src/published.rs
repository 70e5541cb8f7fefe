//! Runs already present in object storage.

use std::collections::BTreeSet;

use hrrr_common::{RunId, SourceLayout};
use storage::ObjectStorage;
use tracing::{debug, info};

use crate::error::{ExtractError, Result};

/// The set of runs whose records have been published.
#[derive(Debug, Clone, Default)]
pub struct PublishedRuns {
    runs: BTreeSet<RunId>,
}

impl PublishedRuns {
    /// Recognize runs from listed object keys; other keys are ignored.
    pub fn from_keys<'a, I>(layout: &SourceLayout, prefix: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut runs = BTreeSet::new();
        for key in keys {
            match layout.parse_output_key(prefix, key) {
                Some(run) => {
                    runs.insert(run);
                }
                None => debug!(key = %key, "Ignoring unrecognized key"),
            }
        }
        Self { runs }
    }

    /// List the output prefix and collect the published runs.
    pub async fn load(storage: &ObjectStorage, layout: &SourceLayout, prefix: &str) -> Result<Self> {
        let keys = storage.list(prefix).await.map_err(|e| ExtractError::Publish {
            key: prefix.to_string(),
            message: e.to_string(),
        })?;
        let published = Self::from_keys(layout, prefix, keys.iter().map(String::as_str));
        info!(prefix = %prefix, count = published.len(), "Listed published runs");
        Ok(published)
    }

    pub fn contains(&self, run: &RunId) -> bool {
        self.runs.contains(run)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Candidates not yet published, sorted by analysis time then forecast
    /// hour, without duplicates.
    pub fn pending<I>(&self, candidates: I) -> Vec<RunId>
    where
        I: IntoIterator<Item = RunId>,
    {
        candidates
            .into_iter()
            .filter(|run| !self.contains(run))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
