//! Tabular records of one extracted run.

use bytes::Bytes;
use hrrr_common::RunId;
use serde::Serialize;

use crate::error::{ExtractError, Result};
use crate::grid::GridSubset;

/// Record columns read straight from the current file, with the catalog
/// name of the variable behind each.
pub const DIRECT_COLUMNS: [(&str, &str); 8] = [
    ("temperature", "temperature_2m"),
    ("wind_10m_u", "wind_10m_u"),
    ("wind_10m_v", "wind_10m_v"),
    ("wind_10m", "wind_10m"),
    ("composite_reflectivity", "composite_reflectivity"),
    ("wind_gust", "wind_gust"),
    ("helicity", "helicity"),
    ("lightning", "lightning"),
];

/// One output row: a grid point of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub timestamp_analysis: String,
    pub timestamp_valid: String,
    pub temperature: f32,
    pub wind_10m_u: f32,
    pub wind_10m_v: f32,
    pub wind_10m: f32,
    pub precipitation_tot: f32,
    pub snowfall_tot: f32,
    pub freezing_rain: f32,
    pub composite_reflectivity: f32,
    pub wind_gust: f32,
    #[serde(rename = "CAPE255")]
    pub cape255: f32,
    pub helicity: f32,
    pub lightning: f32,
    pub hrrr_id: usize,
}

/// Value columns of a run, one value per grid subset position.
#[derive(Debug, Clone, Default)]
pub struct RecordColumns {
    pub temperature: Vec<f32>,
    pub wind_10m_u: Vec<f32>,
    pub wind_10m_v: Vec<f32>,
    pub wind_10m: Vec<f32>,
    pub precipitation_tot: Vec<f32>,
    pub snowfall_tot: Vec<f32>,
    pub freezing_rain: Vec<f32>,
    pub composite_reflectivity: Vec<f32>,
    pub wind_gust: Vec<f32>,
    pub cape255: Vec<f32>,
    pub helicity: Vec<f32>,
    pub lightning: Vec<f32>,
}

impl RecordColumns {
    /// Set a direct column by its record name.
    pub fn set_direct(&mut self, column: &str, values: Vec<f32>) -> Result<()> {
        let slot = match column {
            "temperature" => &mut self.temperature,
            "wind_10m_u" => &mut self.wind_10m_u,
            "wind_10m_v" => &mut self.wind_10m_v,
            "wind_10m" => &mut self.wind_10m,
            "composite_reflectivity" => &mut self.composite_reflectivity,
            "wind_gust" => &mut self.wind_gust,
            "helicity" => &mut self.helicity,
            "lightning" => &mut self.lightning,
            other => {
                return Err(ExtractError::Config(format!(
                    "{:?} is not a direct record column",
                    other
                )))
            }
        };
        *slot = values;
        Ok(())
    }

    fn named(&self) -> [(&'static str, &Vec<f32>); 12] {
        [
            ("temperature", &self.temperature),
            ("wind_10m_u", &self.wind_10m_u),
            ("wind_10m_v", &self.wind_10m_v),
            ("wind_10m", &self.wind_10m),
            ("precipitation_tot", &self.precipitation_tot),
            ("snowfall_tot", &self.snowfall_tot),
            ("freezing_rain", &self.freezing_rain),
            ("composite_reflectivity", &self.composite_reflectivity),
            ("wind_gust", &self.wind_gust),
            ("CAPE255", &self.cape255),
            ("helicity", &self.helicity),
            ("lightning", &self.lightning),
        ]
    }
}

/// All rows of one run, in grid subset order.
#[derive(Debug, Clone)]
pub struct RunRecordSet {
    run: RunId,
    rows: Vec<RunRecord>,
}

impl RunRecordSet {
    /// Assemble one row per grid position. Every column must have exactly
    /// one value per position.
    pub fn assemble(run: RunId, grid: &GridSubset, columns: RecordColumns) -> Result<Self> {
        for (name, values) in columns.named() {
            if values.len() != grid.len() {
                return Err(ExtractError::GridMismatch(format!(
                    "column {} has {} values for {} grid points",
                    name,
                    values.len(),
                    grid.len()
                )));
            }
        }

        let timestamp_analysis = run.analysis_timestamp();
        let timestamp_valid = run.valid_timestamp();

        let rows = grid
            .positions()
            .iter()
            .enumerate()
            .map(|(i, &hrrr_id)| RunRecord {
                timestamp_analysis: timestamp_analysis.clone(),
                timestamp_valid: timestamp_valid.clone(),
                temperature: columns.temperature[i],
                wind_10m_u: columns.wind_10m_u[i],
                wind_10m_v: columns.wind_10m_v[i],
                wind_10m: columns.wind_10m[i],
                precipitation_tot: columns.precipitation_tot[i],
                snowfall_tot: columns.snowfall_tot[i],
                freezing_rain: columns.freezing_rain[i],
                composite_reflectivity: columns.composite_reflectivity[i],
                wind_gust: columns.wind_gust[i],
                cape255: columns.cape255[i],
                helicity: columns.helicity[i],
                lightning: columns.lightning[i],
                hrrr_id,
            })
            .collect();

        Ok(Self { run, rows })
    }

    pub fn run(&self) -> &RunId {
        &self.run
    }

    pub fn rows(&self) -> &[RunRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize as CSV with a header row.
    pub fn to_csv(&self) -> Result<Bytes> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer
                .serialize(row)
                .map_err(|e| ExtractError::Io(std::io::Error::other(e.to_string())))?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| ExtractError::Io(std::io::Error::other(e.to_string())))?;
        Ok(Bytes::from(data))
    }
}
