//! Run identity and time handling for model output files.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HrrrError, HrrrResult};

/// Textual pattern used for the analysis and valid timestamps in published records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifies one source file: an analysis (model initialization) hour plus
/// a forecast-hour offset.
///
/// The analysis time is always a whole UTC hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId {
    analysis: DateTime<Utc>,
    forecast_hour: u32,
}

impl RunId {
    pub fn new(analysis: DateTime<Utc>, forecast_hour: u32) -> HrrrResult<Self> {
        if analysis.minute() != 0 || analysis.second() != 0 || analysis.nanosecond() != 0 {
            return Err(HrrrError::InvalidRun(format!(
                "analysis time {} is not a whole hour",
                analysis
            )));
        }
        Ok(Self {
            analysis,
            forecast_hour,
        })
    }

    /// Build from the textual pieces found in file names: `YYYYMMDD`, `HH`, `FF`.
    ///
    /// Every piece must have exactly its fixed width, so each run has one
    /// textual form.
    pub fn from_parts(date: &str, analysis_hour: &str, forecast_hour: &str) -> HrrrResult<Self> {
        parse_digits(date, 8, "date")?;
        let day = NaiveDate::parse_from_str(date, "%Y%m%d")
            .map_err(|e| HrrrError::InvalidRun(format!("bad date '{}': {}", date, e)))?;
        let hour = parse_digits(analysis_hour, 2, "analysis hour")?;
        let forecast_hour = parse_digits(forecast_hour, 2, "forecast hour")?;

        let naive = day
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| HrrrError::InvalidRun(format!("bad analysis hour {}", hour)))?;

        Self::new(Utc.from_utc_datetime(&naive), forecast_hour)
    }

    pub fn analysis(&self) -> DateTime<Utc> {
        self.analysis
    }

    pub fn forecast_hour(&self) -> u32 {
        self.forecast_hour
    }

    /// Analysis time plus the forecast-hour offset.
    pub fn valid(&self) -> DateTime<Utc> {
        self.analysis + Duration::hours(self.forecast_hour as i64)
    }

    pub fn analysis_timestamp(&self) -> String {
        self.analysis.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn valid_timestamp(&self) -> String {
        self.valid().format(TIMESTAMP_FORMAT).to_string()
    }

    /// `YYYYMMDD` of the analysis time.
    pub fn date_str(&self) -> String {
        self.analysis.format("%Y%m%d").to_string()
    }

    /// Two-digit analysis hour.
    pub fn analysis_hour_str(&self) -> String {
        self.analysis.format("%H").to_string()
    }

    /// Two-digit forecast hour, as used in file names.
    pub fn forecast_hour_str(&self) -> String {
        format!("{:02}", self.forecast_hour)
    }

    /// Same analysis, different forecast hour.
    pub fn with_forecast_hour(&self, forecast_hour: u32) -> Self {
        Self {
            analysis: self.analysis,
            forecast_hour,
        }
    }

    /// The analysis one hour earlier, keeping the forecast hour.
    /// Crosses day, month and year boundaries.
    pub fn previous_analysis_hour(&self) -> Self {
        Self {
            analysis: self.analysis - Duration::hours(1),
            forecast_hour: self.forecast_hour,
        }
    }

    /// Same analysis, one forecast hour earlier. `None` at the analysis hour.
    pub fn previous_forecast_hour(&self) -> Option<Self> {
        self.forecast_hour
            .checked_sub(1)
            .map(|fh| self.with_forecast_hour(fh))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}t{}z+f{}",
            self.date_str(),
            self.analysis_hour_str(),
            self.forecast_hour_str()
        )
    }
}

fn parse_digits(s: &str, width: usize, what: &str) -> HrrrResult<u32> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HrrrError::InvalidRun(format!("bad {} '{}'", what, s)));
    }
    s.parse()
        .map_err(|e| HrrrError::InvalidRun(format!("bad {} '{}': {}", what, s, e)))
}

/// Parse a command-line time.
///
/// Supports:
/// - RFC 3339: "2021-11-07T06:00:00Z"
/// - Without timezone (UTC assumed): "2021-11-07T06:00:00"
/// - Hour only: "2021-11-07T06"
/// - Date only: "2021-11-07"
pub fn parse_datetime(s: &str) -> HrrrResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}:00:00", s), "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(HrrrError::InvalidTime(s.to_string()))
}

/// Whole hours in `[start, end)`. `start` is rounded down to the hour.
pub fn hourly_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut current = start
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(start);

    let mut hours = Vec::new();
    while current < end {
        hours.push(current);
        current += Duration::hours(1);
    }
    hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        let run = RunId::from_parts("20211107", "06", "05").unwrap();
        assert_eq!(run.analysis(), Utc.with_ymd_and_hms(2021, 11, 7, 6, 0, 0).unwrap());
        assert_eq!(run.forecast_hour(), 5);
        assert_eq!(run.forecast_hour_str(), "05");
        assert_eq!(run.to_string(), "20211107t06z+f05");
    }

    #[test]
    fn test_from_parts_rejects_garbage() {
        assert!(RunId::from_parts("2021117", "06", "05").is_err());
        assert!(RunId::from_parts("20211107", "24", "05").is_err());
        assert!(RunId::from_parts("20211107", "06", "f5").is_err());
        assert!(RunId::from_parts("20211107", "", "05").is_err());
    }

    #[test]
    fn test_from_parts_requires_fixed_width() {
        assert!(RunId::from_parts("020211107", "06", "05").is_err());
        assert!(RunId::from_parts("20211107", "6", "05").is_err());
        assert!(RunId::from_parts("20211107", "006", "05").is_err());
        assert!(RunId::from_parts("20211107", "06", "5").is_err());
        assert!(RunId::from_parts("20211107", "06", "+5").is_err());
        assert!(RunId::from_parts("20211107", "06", "48").is_ok());
    }

    #[test]
    fn test_new_requires_whole_hour() {
        let t = Utc.with_ymd_and_hms(2021, 11, 7, 6, 30, 0).unwrap();
        assert!(RunId::new(t, 0).is_err());
    }

    #[test]
    fn test_timestamps() {
        let run = RunId::from_parts("20211231", "22", "03").unwrap();
        assert_eq!(run.analysis_timestamp(), "2021-12-31 22:00:00");
        assert_eq!(run.valid_timestamp(), "2022-01-01 01:00:00");
    }

    #[test]
    fn test_previous_analysis_hour_crosses_year() {
        let run = RunId::from_parts("20220101", "00", "00").unwrap();
        let prev = run.previous_analysis_hour().with_forecast_hour(1);
        assert_eq!(prev.date_str(), "20211231");
        assert_eq!(prev.analysis_hour_str(), "23");
        assert_eq!(prev.forecast_hour_str(), "01");
        // Companion's valid time lines up with the run's analysis time
        assert_eq!(prev.valid(), run.analysis());
    }

    #[test]
    fn test_previous_forecast_hour() {
        let run = RunId::from_parts("20211107", "06", "05").unwrap();
        let prev = run.previous_forecast_hour().unwrap();
        assert_eq!(prev.forecast_hour(), 4);
        assert_eq!(prev.analysis(), run.analysis());
        assert!(run.with_forecast_hour(0).previous_forecast_hour().is_none());
    }

    #[test]
    fn test_parse_datetime_forms() {
        let expected = Utc.with_ymd_and_hms(2021, 11, 7, 6, 0, 0).unwrap();
        assert_eq!(parse_datetime("2021-11-07T06:00:00Z").unwrap(), expected);
        assert_eq!(parse_datetime("2021-11-07T06:00:00").unwrap(), expected);
        assert_eq!(parse_datetime("2021-11-07T06").unwrap(), expected);
        assert_eq!(
            parse_datetime("2021-11-07").unwrap(),
            Utc.with_ymd_and_hms(2021, 11, 7, 0, 0, 0).unwrap()
        );
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_hourly_range_is_half_open() {
        let start = Utc.with_ymd_and_hms(2021, 11, 7, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2021, 11, 8, 1, 0, 0).unwrap();
        let hours = hourly_range(start, end);
        assert_eq!(hours.len(), 3);
        assert_eq!(hours[0], start);
        assert_eq!(hours[2], Utc.with_ymd_and_hms(2021, 11, 8, 0, 0, 0).unwrap());
        assert!(hourly_range(end, start).is_empty());
    }
}
