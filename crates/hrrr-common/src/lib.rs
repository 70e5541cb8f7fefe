//! Common types and utilities shared across the HRRR extraction crates.

pub mod error;
pub mod layout;
pub mod time;

pub use error::{HrrrError, HrrrResult};
pub use layout::SourceLayout;
pub use time::{hourly_range, parse_datetime, RunId, TIMESTAMP_FORMAT};
