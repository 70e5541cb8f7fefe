//! Parsing of `.idx` manifests into per-message byte ranges.
//!
//! Each manifest line is colon delimited: field 0 is the 1-based message
//! ordinal, field 1 the byte offset where the message starts, field 3 the
//! short variable name and field 4 its level description. A message ends
//! where the next line's message starts; the last message runs to the end
//! of the file.
//!
//! Ranges keep the successor's start offset as their end value, exactly as
//! the manifest lists it. Sent as an inclusive HTTP range this reads one byte
//! past the message, which the decoder drops since it trims to the length
//! declared in the message header.

use std::fmt;

use hrrr_common::RunId;

use crate::catalog::LogicalVariable;
use crate::error::{ExtractError, Result};
use crate::version::FormatVersion;

/// Byte range of one message within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// `None` for the last message, which runs to end of file
    pub end: Option<u64>,
}

impl ByteRange {
    /// Value for an HTTP `Range` header.
    pub fn header_value(&self) -> String {
        format!("bytes={}", self)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

/// One manifest line after pairing with its successor.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub ordinal: u32,
    pub range: ByteRange,
    /// `"{name}: {level}"`
    pub description: String,
}

/// Ordered manifest of a single file.
#[derive(Debug, Clone, Default)]
pub struct ManifestIndex {
    entries: Vec<ManifestEntry>,
}

struct RawLine<'a> {
    ordinal: u32,
    offset: u64,
    name: &'a str,
    level: &'a str,
}

fn parse_line(line_no: usize, line: &str) -> Result<RawLine<'_>> {
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() < 5 {
        return Err(ExtractError::ManifestParse {
            line: line_no,
            reason: format!("expected at least 5 fields, got {}", fields.len()),
        });
    }

    let ordinal = fields[0]
        .trim()
        .parse::<u32>()
        .map_err(|e| ExtractError::ManifestParse {
            line: line_no,
            reason: format!("bad ordinal {:?}: {}", fields[0], e),
        })?;
    let offset = fields[1]
        .trim()
        .parse::<u64>()
        .map_err(|e| ExtractError::ManifestParse {
            line: line_no,
            reason: format!("bad offset {:?}: {}", fields[1], e),
        })?;

    Ok(RawLine {
        ordinal,
        offset,
        name: fields[3],
        level: fields[4],
    })
}

impl ManifestIndex {
    /// Parse manifest lines in file order. Blank lines are ignored.
    pub fn parse<'a, I>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let raw = lines
            .into_iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| parse_line(i + 1, line))
            .collect::<Result<Vec<_>>>()?;

        let entries = raw
            .iter()
            .enumerate()
            .map(|(i, line)| ManifestEntry {
                ordinal: line.ordinal,
                range: ByteRange {
                    start: line.offset,
                    end: raw.get(i + 1).map(|next| next.offset),
                },
                description: format!("{}: {}", line.name, line.level),
            })
            .collect();

        Ok(Self { entries })
    }

    /// Parse a whole manifest body.
    pub fn parse_text(text: &str) -> Result<Self> {
        Self::parse(text.lines())
    }

    /// Number of messages listed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ordinal: u32) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.ordinal == ordinal)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

/// A file's manifest together with the version it was recognized as.
///
/// Only built for known versions, so catalog lookups against it always
/// have a column to read.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub file_url: String,
    pub run: RunId,
    pub version: FormatVersion,
    pub index: ManifestIndex,
}

impl ResolvedManifest {
    pub fn new(file_url: &str, run: RunId, index: ManifestIndex) -> Result<Self> {
        let version = crate::version::resolve(run.forecast_hour(), index.len());
        if !version.is_known() {
            return Err(ExtractError::UnknownFormatVersion {
                url: file_url.to_string(),
                forecast_hour: run.forecast_hour(),
                message_count: index.len(),
            });
        }

        Ok(Self {
            file_url: file_url.to_string(),
            run,
            version,
            index,
        })
    }

    /// Manifest entry of `variable`, or `None` when the version lacks it.
    pub fn entry(&self, variable: LogicalVariable) -> Result<Option<&ManifestEntry>> {
        match variable.index(self.version)?.ordinal() {
            None => Ok(None),
            Some(ordinal) => {
                self.index
                    .get(ordinal)
                    .map(Some)
                    .ok_or_else(|| ExtractError::MissingOrdinal {
                        url: self.file_url.clone(),
                        ordinal,
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::manifest_lines;

    #[test]
    fn test_ranges_pair_with_successor() {
        let lines = manifest_lines(5, 1000);
        let index = ManifestIndex::parse(lines.iter().map(String::as_str)).unwrap();

        assert_eq!(index.len(), 5);
        for (i, entry) in index.entries()[..4].iter().enumerate() {
            assert_eq!(entry.ordinal, i as u32 + 1);
            assert_eq!(entry.range.start, i as u64 * 1000);
            assert_eq!(entry.range.end, Some((i as u64 + 1) * 1000));
        }
    }

    #[test]
    fn test_last_entry_is_open_ended() {
        let lines = manifest_lines(3, 250);
        let index = ManifestIndex::parse(lines.iter().map(String::as_str)).unwrap();

        let last = index.get(3).unwrap();
        assert_eq!(last.range.end, None);
        assert_eq!(last.range.to_string(), "500-");
        assert_eq!(index.get(2).unwrap().range.to_string(), "250-500");
    }

    #[test]
    fn test_description_and_header() {
        let text = "1:0:d=2024011512:REFC:entire atmosphere:anl:\n\
                    2:339271:d=2024011512:RETOP:cloud top:anl:\n";
        let index = ManifestIndex::parse_text(text).unwrap();

        let first = index.get(1).unwrap();
        assert_eq!(first.description, "REFC: entire atmosphere");
        assert_eq!(first.range.header_value(), "bytes=0-339271");
        assert_eq!(index.get(2).unwrap().range.header_value(), "bytes=339271-");
    }

    #[test]
    fn test_single_line_manifest() {
        let index = ManifestIndex::parse_text("1:0:d=2024011512:REFC:entire atmosphere:anl:").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(1).unwrap().range.end, None);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let text = "1:0:d=x:A:a:anl:\n\n2:10:d=x:B:b:anl:\n\n";
        let index = ManifestIndex::parse_text(text).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1).unwrap().range.end, Some(10));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let text = "1:0:d=x:A:a:anl:\nnot a manifest line\n";
        let err = ManifestIndex::parse_text(text).unwrap_err();
        assert!(matches!(err, ExtractError::ManifestParse { line: 2, .. }));

        let err = ManifestIndex::parse_text("x:0:d:A:a:anl:").unwrap_err();
        assert!(matches!(err, ExtractError::ManifestParse { line: 1, .. }));
    }

    #[test]
    fn test_resolved_manifest_rejects_unknown_version() {
        let run = RunId::from_parts("20240115", "12", "05").unwrap();
        let lines = manifest_lines(160, 10);
        let index = ManifestIndex::parse(lines.iter().map(String::as_str)).unwrap();

        let err = ResolvedManifest::new("https://host/f05.grib2", run, index).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnknownFormatVersion { message_count: 160, forecast_hour: 5, .. }
        ));
    }

    #[test]
    fn test_resolved_manifest_entry_lookup() {
        let run = RunId::from_parts("20240115", "12", "00").unwrap();
        let lines = manifest_lines(148, 10);
        let index = ManifestIndex::parse(lines.iter().map(String::as_str)).unwrap();
        let manifest = ResolvedManifest::new("https://host/f00.grib2", run, index).unwrap();

        assert_eq!(manifest.version, FormatVersion::V3);
        let temp = manifest.entry(LogicalVariable::Temperature2m).unwrap().unwrap();
        assert_eq!(temp.ordinal, 66);
        assert!(manifest.entry(LogicalVariable::Lightning).unwrap().is_none());
    }
}
