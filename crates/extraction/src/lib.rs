//! HRRR variable resolution and byte-range extraction.
//!
//! For each forecast run the engine:
//! 1. fetches the file's `.idx` manifest and recognizes its format version
//!    from the forecast hour and message count ([`version`]);
//! 2. maps each logical variable to its message ordinal for that version
//!    ([`catalog`]) and byte range ([`manifest`]);
//! 3. fetches only those messages with HTTP range requests and reduces them
//!    to a fixed grid subset ([`fetch`], [`grid`]);
//! 4. reads hour-dependent accumulations from companion runs ([`derived`]);
//! 5. assembles one record per grid point and publishes it ([`record`],
//!    [`processor`]).

pub mod catalog;
pub mod config;
pub mod derived;
pub mod error;
pub mod fetch;
pub mod grid;
pub mod manifest;
pub mod processor;
pub mod published;
pub mod record;
pub mod source;
pub mod version;

pub use catalog::{index_of, validate_names, LogicalVariable, VariableIndex};
pub use config::ExtractorConfig;
pub use derived::{clamped_delta, Derivation, DerivedPlan, FileRole, ForecastRegime};
pub use error::{ExtractError, Result};
pub use fetch::RangeFetcher;
pub use grid::GridSubset;
pub use manifest::{ByteRange, ManifestEntry, ManifestIndex, ResolvedManifest};
pub use processor::{ProcessorConfig, RunOutcome, RunProcessor, RunPublisher};
pub use published::PublishedRuns;
pub use record::{RecordColumns, RunRecord, RunRecordSet};
pub use source::{GribSource, HttpConfig, HttpSource};
pub use version::FormatVersion;
