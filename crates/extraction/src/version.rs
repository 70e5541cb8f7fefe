//! Format version resolution.
//!
//! HRRR surface files changed layout between model upgrades. The version of a
//! file is recognized from its forecast-hour bucket and the number of
//! messages listed in its manifest.

use std::fmt;

use serde::Serialize;

/// Binary layout of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    V2,
    V3,
    V4,
    /// Message count matches no known layout
    Unknown,
}

impl FormatVersion {
    pub fn is_known(&self) -> bool {
        !matches!(self, FormatVersion::Unknown)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormatVersion::V2 => "v2",
            FormatVersion::V3 => "v3",
            FormatVersion::V4 => "v4",
            FormatVersion::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Forecast hours 00 and 01 carry fewer messages than later hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourBucket {
    /// Forecast hour 00 or 01
    Early,
    /// Forecast hour 02 and later
    Later,
}

impl HourBucket {
    pub fn of(forecast_hour: u32) -> Self {
        if forecast_hour <= 1 {
            HourBucket::Early
        } else {
            HourBucket::Later
        }
    }
}

/// Resolve the format version from a forecast hour and manifest message count.
pub fn resolve(forecast_hour: u32, message_count: usize) -> FormatVersion {
    match (HourBucket::of(forecast_hour), message_count) {
        (HourBucket::Early, 148) => FormatVersion::V3,
        (HourBucket::Early, 170) => FormatVersion::V4,
        (HourBucket::Later, 151) => FormatVersion::V3,
        (HourBucket::Later, 173) => FormatVersion::V4,
        _ => FormatVersion::Unknown,
    }
}
