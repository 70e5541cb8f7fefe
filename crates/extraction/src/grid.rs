//! The fixed subset of model grid points extracted from every run.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{ExtractError, Result};

/// Ordered positions into the model's flattened grid.
///
/// Loaded once and shared read-only by every run; cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSubset {
    positions: Arc<[usize]>,
}

impl GridSubset {
    pub fn new(positions: Vec<usize>) -> Result<Self> {
        if positions.is_empty() {
            return Err(ExtractError::Config("grid subset is empty".to_string()));
        }
        Ok(Self {
            positions: positions.into(),
        })
    }

    /// Read grid positions from `column` of a CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R, column: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| ExtractError::Config(format!("Failed to read grid header: {}", e)))?;
        let col = headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| ExtractError::Config(format!("grid file has no column {:?}", column)))?;

        let mut positions = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| ExtractError::Config(format!("Bad grid row {}: {}", i + 2, e)))?;
            let raw = record.get(col).unwrap_or("").trim();
            let position = raw.parse::<usize>().map_err(|e| {
                ExtractError::Config(format!("Bad grid id {:?} on row {}: {}", raw, i + 2, e))
            })?;
            positions.push(position);
        }

        Self::new(positions)
    }

    pub fn from_path(path: &Path, column: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let subset = Self::from_csv_reader(file, column)?;
        info!(path = %path.display(), points = subset.len(), "Loaded grid subset");
        Ok(subset)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// A zero-filled column, for variables absent from a file.
    pub fn zeros(&self) -> Vec<f32> {
        vec![0.0; self.len()]
    }

    /// Values at the subset positions, in subset order.
    pub fn select(&self, values: &[f32]) -> Result<Vec<f32>> {
        self.positions
            .iter()
            .map(|&p| {
                values.get(p).copied().ok_or_else(|| {
                    ExtractError::GridMismatch(format!(
                        "position {} outside grid of {} points",
                        p,
                        values.len()
                    ))
                })
            })
            .collect()
    }
}
