//! Extractor configuration, loaded from YAML.

use std::path::{Path, PathBuf};

use hrrr_common::SourceLayout;
use serde::{Deserialize, Serialize};
use storage::ObjectStorageConfig;

use crate::error::{ExtractError, Result};
use crate::processor::ProcessorConfig;
use crate::source::HttpConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub source: SourceLayout,
    pub http: HttpConfig,
    pub storage: ObjectStorageConfig,
    pub output: OutputConfig,
    pub concurrency: ConcurrencyConfig,
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Object key prefix for published record sets
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "CSV".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Runs processed at the same time
    pub max_concurrent_runs: usize,
    /// Byte-range fetches in flight per run
    pub max_concurrent_fetches: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 2,
            max_concurrent_fetches: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// CSV file listing the grid subset
    pub path: Option<PathBuf>,
    /// Column holding model grid positions
    pub column: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            path: None,
            column: "hrrr_id".to_string(),
        }
    }
}

impl ExtractorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ExtractError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from a YAML file and apply `S3_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&contents)?;
        config.storage.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency.max_concurrent_runs == 0 {
            return Err(ExtractError::Config(
                "concurrency.max_concurrent_runs must be at least 1".to_string(),
            ));
        }
        if self.concurrency.max_concurrent_fetches == 0 {
            return Err(ExtractError::Config(
                "concurrency.max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if self.output.prefix.trim_matches('/').is_empty() {
            return Err(ExtractError::Config("output.prefix is empty".to_string()));
        }
        Ok(())
    }

    pub fn processor(&self) -> ProcessorConfig {
        ProcessorConfig {
            layout: self.source.clone(),
            output_prefix: self.output.prefix.clone(),
            max_concurrent_fetches: self.concurrency.max_concurrent_fetches,
        }
    }
}
