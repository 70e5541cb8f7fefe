//! Logical variables and their message ordinals per format version.

use std::fmt;
use std::str::FromStr;

use crate::error::{ExtractError, Result};
use crate::version::FormatVersion;

/// Where a logical variable sits in a file of a given version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableIndex {
    /// Not carried by this version; the column is zero filled
    Absent,
    /// 1-based message ordinal in the manifest
    Ordinal(u32),
}

impl VariableIndex {
    fn from_raw(raw: u32) -> Self {
        if raw == 0 {
            VariableIndex::Absent
        } else {
            VariableIndex::Ordinal(raw)
        }
    }

    pub fn ordinal(&self) -> Option<u32> {
        match self {
            VariableIndex::Absent => None,
            VariableIndex::Ordinal(o) => Some(*o),
        }
    }
}

/// The fixed set of variables the extractor knows how to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalVariable {
    Temperature2m,
    Wind10m,
    Wind10mU,
    Wind10mV,
    PrecipitationTotal,
    /// Precipitation accumulated over the last hour only
    PrecipitationPastHour,
    SnowfallTotal,
    FreezingRain,
    WaterEquivalentSnow,
    CompositeReflectivity,
    WindGust,
    /// CAPE 255-0 mb above ground, as laid out at forecast hours 00 and 01
    Cape255Early,
    /// CAPE 255-0 mb above ground, as laid out from forecast hour 02
    Cape255Later,
    Helicity,
    Lightning,
}

/// Ordinals per version, in (v2, v3, v4) order; 0 means absent.
const TABLE: [(LogicalVariable, &str, [u32; 3]); 15] = [
    (LogicalVariable::Temperature2m, "temperature_2m", [54, 66, 71]),
    (LogicalVariable::Wind10m, "wind_10m", [61, 73, 79]),
    (LogicalVariable::Wind10mU, "wind_10m_u", [59, 71, 77]),
    (LogicalVariable::Wind10mV, "wind_10m_v", [60, 72, 78]),
    (LogicalVariable::PrecipitationTotal, "precipitation_tot", [64, 78, 84]),
    (LogicalVariable::PrecipitationPastHour, "precipitation_tot_past_h", [0, 84, 90]),
    (LogicalVariable::SnowfallTotal, "snowfall_tot", [48, 60, 65]),
    (LogicalVariable::FreezingRain, "freezing_rain", [0, 81, 87]),
    (LogicalVariable::WaterEquivalentSnow, "wat_eq_accm_snow", [65, 79, 85]),
    (LogicalVariable::CompositeReflectivity, "composite_reflectivity", [0, 1, 1]),
    (LogicalVariable::WindGust, "wind_gust", [0, 8, 9]),
    (LogicalVariable::Cape255Early, "CAPE255_h00_h01", [0, 138, 154]),
    (LogicalVariable::Cape255Later, "CAPE255_h02plus", [0, 141, 157]),
    (LogicalVariable::Helicity, "helicity", [0, 43, 45]),
    (LogicalVariable::Lightning, "lightning", [0, 0, 57]),
];

impl LogicalVariable {
    pub fn all() -> impl Iterator<Item = LogicalVariable> {
        TABLE.iter().map(|(v, _, _)| *v)
    }

    fn row(&self) -> &'static (LogicalVariable, &'static str, [u32; 3]) {
        // Rows follow declaration order
        &TABLE[*self as usize]
    }

    /// Catalog name, as used in configuration.
    pub fn name(&self) -> &'static str {
        self.row().1
    }

    /// Ordinal of this variable in a file of `version`.
    pub fn index(&self, version: FormatVersion) -> Result<VariableIndex> {
        let column = match version {
            FormatVersion::V2 => 0,
            FormatVersion::V3 => 1,
            FormatVersion::V4 => 2,
            FormatVersion::Unknown => return Err(ExtractError::NoCatalogColumn(version)),
        };
        Ok(VariableIndex::from_raw(self.row().2[column]))
    }
}

impl fmt::Display for LogicalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LogicalVariable {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        TABLE
            .iter()
            .find(|(_, name, _)| *name == s)
            .map(|(v, _, _)| *v)
            .ok_or_else(|| ExtractError::UnknownVariable(s.to_string()))
    }
}

/// Look up a variable by name.
///
/// Unrecognized names fail; recognized names absent from `version` give
/// [`VariableIndex::Absent`].
pub fn index_of(name: &str, version: FormatVersion) -> Result<VariableIndex> {
    name.parse::<LogicalVariable>()?.index(version)
}

/// Resolve every name, failing on the first one the catalog does not know.
pub fn validate_names<'a, I>(names: I) -> Result<Vec<LogicalVariable>>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_follow_declaration_order() {
        for (i, (variable, _, _)) in TABLE.iter().enumerate() {
            assert_eq!(*variable as usize, i);
        }
    }

    #[test]
    fn test_names_roundtrip() {
        for variable in LogicalVariable::all() {
            assert_eq!(variable.name().parse::<LogicalVariable>().unwrap(), variable);
        }
        assert_eq!(LogicalVariable::all().count(), 15);
    }

    #[test]
    fn test_v4_ordinals() {
        assert_eq!(
            index_of("temperature_2m", FormatVersion::V4).unwrap(),
            VariableIndex::Ordinal(71)
        );
        assert_eq!(
            index_of("CAPE255_h00_h01", FormatVersion::V4).unwrap(),
            VariableIndex::Ordinal(154)
        );
        assert_eq!(
            index_of("CAPE255_h02plus", FormatVersion::V4).unwrap(),
            VariableIndex::Ordinal(157)
        );
        assert_eq!(
            index_of("lightning", FormatVersion::V4).unwrap(),
            VariableIndex::Ordinal(57)
        );
    }

    #[test]
    fn test_absent_is_not_an_error() {
        assert_eq!(
            index_of("lightning", FormatVersion::V3).unwrap(),
            VariableIndex::Absent
        );
        assert_eq!(
            index_of("freezing_rain", FormatVersion::V2).unwrap(),
            VariableIndex::Absent
        );
        assert_eq!(VariableIndex::Absent.ordinal(), None);
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = index_of("dew_point", FormatVersion::V4).unwrap_err();
        assert!(matches!(err, ExtractError::UnknownVariable(name) if name == "dew_point"));
    }

    #[test]
    fn test_unknown_version_has_no_column() {
        let err = index_of("temperature_2m", FormatVersion::Unknown).unwrap_err();
        assert!(matches!(err, ExtractError::NoCatalogColumn(FormatVersion::Unknown)));
    }

    #[test]
    fn test_validate_names() {
        let vars = validate_names(["wind_10m_u", "helicity"]).unwrap();
        assert_eq!(vars, vec![LogicalVariable::Wind10mU, LogicalVariable::Helicity]);

        assert!(validate_names(["wind_10m_u", "wind_100m"]).is_err());
    }
}
