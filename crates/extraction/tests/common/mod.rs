//! In-memory source for exercising the extraction engine without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use extraction::{ByteRange, ExtractError, GribSource, Result};
use test_utils::SyntheticHrrrFile;

/// Serves synthetic files by URL and counts every call.
#[derive(Default)]
pub struct MockSource {
    files: HashMap<String, (Bytes, Vec<String>)>,
    broken_ranges: HashSet<String>,
    manifest_calls: AtomicUsize,
    range_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file_url: &str, file: &SyntheticHrrrFile) -> Self {
        let (bytes, lines) = file.build();
        self.files
            .insert(file_url.to_string(), (Bytes::from(bytes), lines));
        self
    }

    /// Range requests against `file_url` fail as a server error would.
    pub fn with_broken_ranges(mut self, file_url: &str) -> Self {
        self.broken_ranges.insert(file_url.to_string());
        self
    }

    pub fn manifest_calls(&self) -> usize {
        self.manifest_calls.load(Ordering::SeqCst)
    }

    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GribSource for MockSource {
    async fn fetch_manifest(&self, manifest_url: &str) -> Result<Vec<String>> {
        self.manifest_calls.fetch_add(1, Ordering::SeqCst);

        manifest_url
            .strip_suffix(".idx")
            .and_then(|file_url| self.files.get(file_url))
            .map(|(_, lines)| lines.clone())
            .ok_or_else(|| ExtractError::Unavailable {
                url: manifest_url.to_string(),
            })
    }

    async fn fetch_range(&self, file_url: &str, range: &ByteRange) -> Result<Bytes> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);

        let range_err = |message: &str| ExtractError::RangeFetch {
            url: file_url.to_string(),
            range: range.to_string(),
            message: message.to_string(),
        };

        if self.broken_ranges.contains(file_url) {
            return Err(range_err("HTTP error: 503 Service Unavailable"));
        }
        let (bytes, _) = self
            .files
            .get(file_url)
            .ok_or_else(|| range_err("HTTP error: 404 Not Found"))?;

        // HTTP ranges are inclusive of the end offset
        let start = range.start as usize;
        let end = match range.end {
            Some(end) => (end as usize + 1).min(bytes.len()),
            None => bytes.len(),
        };
        if start >= end {
            return Err(range_err("HTTP error: 416 Range Not Satisfiable"));
        }
        Ok(bytes.slice(start..end))
    }
}
