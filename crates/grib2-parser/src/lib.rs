//! GRIB2 message decoding (WMO FM 92 GRIB Edition 2).
//!
//! Decodes exactly one GRIB2 message, as returned by a byte-range fetch,
//! into a flat list of values in the model's native point order.
//! Simple packing (template 5.0) is unpacked here; other packings, such as
//! the complex packing with spatial differencing used by HRRR, are handed
//! to the `grib` crate.

pub mod sections;
pub mod unpacking;

use std::io::Cursor;

use thiserror::Error;
use tracing::debug;

pub use sections::{DataRepresentation, Indicator};
pub use unpacking::unpack_simple;

/// Errors raised while decoding a GRIB2 message.
#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Message truncated: header declares {declared} bytes, got {available}")]
    Truncated { declared: usize, available: usize },

    #[error("Unpacking failed: {0}")]
    UnpackingError(String),

    #[error("Decoding failed: {0}")]
    DecodeError(String),
}

/// Data representation template for simple packing.
const SIMPLE_PACKING: u16 = 0;

/// Decode the first GRIB2 message in `data` into its values.
///
/// Bytes past the length declared in Section 0 are ignored. Points masked
/// out by a bitmap decode as `NaN`.
pub fn decode_message(data: &[u8]) -> Result<Vec<f32>, Grib2Error> {
    let indicator = sections::parse_indicator(data)?;
    let declared = indicator.message_length as usize;
    if declared > data.len() {
        return Err(Grib2Error::Truncated {
            declared,
            available: data.len(),
        });
    }
    let message = &data[..declared];

    let repr = sections::parse_data_representation(message)?;
    debug!(
        template = repr.template_number,
        points = repr.num_data_points,
        trailing_bytes = data.len() - declared,
        "Decoding GRIB2 message"
    );

    if repr.template_number != SIMPLE_PACKING {
        return decode_with_grib_crate(message);
    }

    let num_points = sections::parse_grid_point_count(message)?;
    let bitmap = sections::parse_bitmap(message)?;
    let data_section = sections::parse_data_section(message)?;

    let values = unpack_simple(
        &data_section.data,
        num_points,
        repr.bits_per_value,
        repr.reference_value,
        repr.binary_scale_factor,
        repr.decimal_scale_factor,
        bitmap.as_ref().map(|bm| bm.data.as_ref()),
    )?;

    Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
}

fn decode_with_grib_crate(message: &[u8]) -> Result<Vec<f32>, Grib2Error> {
    let grib2 = grib::from_reader(Cursor::new(message))
        .map_err(|e| Grib2Error::DecodeError(format!("grib reader: {}", e)))?;

    let (_index, submessage) = grib2
        .iter()
        .next()
        .ok_or_else(|| Grib2Error::DecodeError("no submessage in message".to_string()))?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| Grib2Error::DecodeError(format!("grib decoder: {}", e)))?;
    let values = decoder
        .dispatch()
        .map_err(|e| Grib2Error::DecodeError(format!("grib dispatch: {}", e)))?;

    Ok(values.collect())
}
