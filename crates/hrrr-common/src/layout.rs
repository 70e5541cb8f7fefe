//! Source file and published record naming.
//!
//! Source files follow
//! `{root}/{model}.{YYYYMMDD}/{subpath}/{model}.t{HH}z.{product}f{FF}.{ext}`
//! and each has a companion manifest at the same URL plus a fixed suffix.
//! Published records follow
//! `{prefix}/{model}.{YYYYMMDD}/{subpath}/{model}.t{HH}z.f{FF}.csv`.

use serde::{Deserialize, Serialize};

use crate::error::{HrrrError, HrrrResult};
use crate::time::RunId;

/// Naming convention of the source model files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    /// Base URL the dated directories live under
    pub root: String,
    /// Model name used in directory and file names (e.g., "hrrr")
    pub model: String,
    /// Domain sub-directory (e.g., "conus")
    pub subpath: String,
    /// Product tag preceding the forecast hour (e.g., "wrfsfc")
    pub product: String,
    /// File extension without the dot
    pub extension: String,
    /// Suffix appended to a file URL to address its manifest
    pub manifest_suffix: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            root: "https://noaahrrr.blob.core.windows.net/hrrr".to_string(),
            model: "hrrr".to_string(),
            subpath: "conus".to_string(),
            product: "wrfsfc".to_string(),
            extension: "grib2".to_string(),
            manifest_suffix: ".idx".to_string(),
        }
    }
}

impl SourceLayout {
    fn file_name(&self, run: &RunId) -> String {
        format!(
            "{}.t{}z.{}f{}.{}",
            self.model,
            run.analysis_hour_str(),
            self.product,
            run.forecast_hour_str(),
            self.extension
        )
    }

    /// URL of a run's file under the configured root.
    pub fn file_url(&self, run: &RunId) -> String {
        self.file_url_under(&self.root, run)
    }

    /// URL of a run's file under an explicit root.
    pub fn file_url_under(&self, root: &str, run: &RunId) -> String {
        format!(
            "{}/{}.{}/{}/{}",
            root.trim_end_matches('/'),
            self.model,
            run.date_str(),
            self.subpath,
            self.file_name(run)
        )
    }

    /// Manifest URL for a file URL.
    pub fn manifest_url(&self, file_url: &str) -> String {
        format!("{}{}", file_url, self.manifest_suffix)
    }

    /// Split a source file URL into its root and run identity.
    pub fn parse_url(&self, url: &str) -> HrrrResult<(String, RunId)> {
        let invalid = || HrrrError::InvalidRun(format!("unrecognised source url: {}", url));

        let (dir, file) = url.rsplit_once('/').ok_or_else(invalid)?;
        let (analysis_hour, forecast_hour) = self.parse_file_name(file).ok_or_else(invalid)?;

        let dir = dir
            .strip_suffix(self.subpath.as_str())
            .and_then(|d| d.strip_suffix('/'))
            .ok_or_else(invalid)?;
        let (root, day_dir) = dir.rsplit_once('/').ok_or_else(invalid)?;
        let date = day_dir
            .strip_prefix(self.model.as_str())
            .and_then(|d| d.strip_prefix('.'))
            .ok_or_else(invalid)?;

        let run = RunId::from_parts(date, analysis_hour, forecast_hour)?;
        Ok((root.to_string(), run))
    }

    /// `{model}.t{HH}z.{product}f{FF}.{ext}` -> (HH, FF)
    fn parse_file_name<'a>(&self, file: &'a str) -> Option<(&'a str, &'a str)> {
        let stem = file
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        let rest = stem.strip_prefix(self.model.as_str())?.strip_prefix(".t")?;
        let (analysis_hour, rest) = rest.split_once("z.")?;
        let forecast_hour = rest.strip_prefix(self.product.as_str())?.strip_prefix('f')?;
        Some((analysis_hour, forecast_hour))
    }

    /// Object key of a run's published record set.
    pub fn output_key(&self, prefix: &str, run: &RunId) -> String {
        format!(
            "{}/{}.{}/{}/{}.t{}z.f{}.csv",
            prefix.trim_end_matches('/'),
            self.model,
            run.date_str(),
            self.subpath,
            self.model,
            run.analysis_hour_str(),
            run.forecast_hour_str()
        )
    }

    /// Inverse of [`SourceLayout::output_key`]. `None` for keys of any other shape.
    pub fn parse_output_key(&self, prefix: &str, key: &str) -> Option<RunId> {
        let rest = key
            .strip_prefix(prefix.trim_end_matches('/'))?
            .strip_prefix('/')?;
        let (dir, file) = rest.rsplit_once('/')?;

        let day_dir = dir
            .strip_suffix(self.subpath.as_str())?
            .strip_suffix('/')?;
        let date = day_dir.strip_prefix(self.model.as_str())?.strip_prefix('.')?;

        let stem = file.strip_suffix(".csv")?;
        let rest = stem.strip_prefix(self.model.as_str())?.strip_prefix(".t")?;
        let (analysis_hour, forecast_hour) = rest.split_once("z.f")?;

        RunId::from_parts(date, analysis_hour, forecast_hour).ok()
    }
}
