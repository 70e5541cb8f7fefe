//! Forecast-hour dependent variables.
//!
//! Precipitation, snowfall, freezing rain and CAPE are not read the same way
//! at every forecast hour. Accumulations in a file run from the start of its
//! forecast, so:
//!
//! - at hour 00 the file carries no accumulation for the hour just ended;
//!   it is read from hour 01 of the previous analysis hour;
//! - at hour 01 the accumulations already cover exactly one hour;
//! - from hour 02 precipitation has a last-hour variant, while snowfall and
//!   freezing rain are differenced against hour N-1 of the same analysis.
//!
//! CAPE changes message position between hours 00-01 and 02 onward.

use std::collections::HashMap;

use hrrr_common::RunId;

use crate::catalog::LogicalVariable;
use crate::error::{ExtractError, Result};

/// Forecast-hour regime of the run being extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastRegime {
    /// Forecast hour 00
    Analysis,
    /// Forecast hour 01
    FirstHour,
    /// Forecast hour 02 and later
    Later,
}

impl ForecastRegime {
    pub fn of(forecast_hour: u32) -> Self {
        match forecast_hour {
            0 => ForecastRegime::Analysis,
            1 => ForecastRegime::FirstHour,
            _ => ForecastRegime::Later,
        }
    }
}

/// Which file a value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileRole {
    Current,
    Companion,
}

/// How one derived column is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Read a variable as is
    Direct(FileRole, LogicalVariable),
    /// Current minus companion, negative results clamped to zero
    Delta(LogicalVariable),
}

impl Derivation {
    /// The (file, variable) reads this derivation needs.
    pub fn reads(&self) -> Vec<(FileRole, LogicalVariable)> {
        match *self {
            Derivation::Direct(role, variable) => vec![(role, variable)],
            Derivation::Delta(variable) => vec![
                (FileRole::Current, variable),
                (FileRole::Companion, variable),
            ],
        }
    }

    /// Produce the column from fetched values.
    pub fn evaluate(
        &self,
        fetched: &HashMap<(FileRole, LogicalVariable), Vec<f32>>,
    ) -> Result<Vec<f32>> {
        let get = |role: FileRole, variable: LogicalVariable| {
            fetched.get(&(role, variable)).ok_or_else(|| {
                ExtractError::MissingRead(format!("{:?} value of {}", role, variable))
            })
        };

        match *self {
            Derivation::Direct(role, variable) => Ok(get(role, variable)?.clone()),
            Derivation::Delta(variable) => {
                let current = get(FileRole::Current, variable)?;
                let previous = get(FileRole::Companion, variable)?;
                clamped_delta(current, previous)
            }
        }
    }
}

/// The derived columns of one run and the companion run they need.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPlan {
    pub companion: Option<RunId>,
    pub precipitation: Derivation,
    pub snowfall: Derivation,
    pub freezing_rain: Derivation,
    pub cape: Derivation,
}

impl DerivedPlan {
    /// Every (file, variable) read the plan needs, without duplicates.
    pub fn reads(&self) -> Vec<(FileRole, LogicalVariable)> {
        let mut reads: Vec<_> = [
            self.precipitation,
            self.snowfall,
            self.freezing_rain,
            self.cape,
        ]
        .iter()
        .flat_map(Derivation::reads)
        .collect();
        reads.sort();
        reads.dedup();
        reads
    }
}

/// Hour 00: accumulations come from hour 01 of the previous analysis hour.
fn plan_analysis(run: &RunId) -> DerivedPlan {
    DerivedPlan {
        companion: Some(run.previous_analysis_hour().with_forecast_hour(1)),
        precipitation: Derivation::Direct(FileRole::Companion, LogicalVariable::PrecipitationTotal),
        snowfall: Derivation::Direct(FileRole::Companion, LogicalVariable::SnowfallTotal),
        freezing_rain: Derivation::Direct(FileRole::Companion, LogicalVariable::FreezingRain),
        cape: Derivation::Direct(FileRole::Current, LogicalVariable::Cape255Early),
    }
}

/// Hour 01: everything is read from the current file.
fn plan_first_hour(_run: &RunId) -> DerivedPlan {
    DerivedPlan {
        companion: None,
        precipitation: Derivation::Direct(FileRole::Current, LogicalVariable::PrecipitationTotal),
        snowfall: Derivation::Direct(FileRole::Current, LogicalVariable::SnowfallTotal),
        freezing_rain: Derivation::Direct(FileRole::Current, LogicalVariable::FreezingRain),
        cape: Derivation::Direct(FileRole::Current, LogicalVariable::Cape255Early),
    }
}

/// Hour 02 onward: snowfall and freezing rain are differenced against the
/// previous forecast hour of the same analysis.
fn plan_later(run: &RunId) -> DerivedPlan {
    DerivedPlan {
        companion: run.previous_forecast_hour(),
        precipitation: Derivation::Direct(
            FileRole::Current,
            LogicalVariable::PrecipitationPastHour,
        ),
        snowfall: Derivation::Delta(LogicalVariable::SnowfallTotal),
        freezing_rain: Derivation::Delta(LogicalVariable::FreezingRain),
        cape: Derivation::Direct(FileRole::Current, LogicalVariable::Cape255Later),
    }
}

/// Plan the derived columns of `run`.
pub fn plan(run: &RunId) -> DerivedPlan {
    match ForecastRegime::of(run.forecast_hour()) {
        ForecastRegime::Analysis => plan_analysis(run),
        ForecastRegime::FirstHour => plan_first_hour(run),
        ForecastRegime::Later => plan_later(run),
    }
}

/// `current - previous` per point, with negative differences set to 0.
///
/// Missing points (`NaN`) stay missing.
pub fn clamped_delta(current: &[f32], previous: &[f32]) -> Result<Vec<f32>> {
    if current.len() != previous.len() {
        return Err(ExtractError::GridMismatch(format!(
            "cannot difference {} values against {}",
            current.len(),
            previous.len()
        )));
    }

    Ok(current
        .iter()
        .zip(previous)
        .map(|(c, p)| {
            let d = c - p;
            if d < 0.0 {
                0.0
            } else {
                d
            }
        })
        .collect())
}
