//! GRIB2 simple packing (Data Representation Template 5.0).

use crate::Grib2Error;

/// Unpack simple packed GRIB2 data
///
/// Simple packing formula: value = (reference_value + (packed_value * 2^binary_scale)) * 10^(-decimal_scale)
///
/// `num_points` is the number of grid points. When a bitmap is present only
/// the points it marks as present consume a packed value; the rest are `None`.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: u32,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<Option<f32>>, Grib2Error> {
    let binary_scale = 2.0_f32.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f32.powi(-(decimal_scale_factor as i32));

    // The point count comes from the message header; check it against the
    // bytes actually present before allocating for it.
    let num_points = num_points as usize;
    match bitmap {
        Some(bm) if bm.len().saturating_mul(8) < num_points => {
            return Err(Grib2Error::UnpackingError(format!(
                "Bitmap of {} bytes cannot cover {} points",
                bm.len(),
                num_points
            )));
        }
        None if bits_per_value > 0
            && (num_points as u64) * (bits_per_value as u64) > (packed_data.len() as u64) * 8 =>
        {
            return Err(Grib2Error::UnpackingError(format!(
                "{} bytes of packed data cannot hold {} values of {} bits",
                packed_data.len(),
                num_points,
                bits_per_value
            )));
        }
        _ => {}
    }

    let mut values = Vec::with_capacity(num_points);
    let mut bit_position = 0;
    let bits_per_value = bits_per_value as usize;

    for i in 0..num_points {
        // Bitmap: 1 bit per data point, 1 = value present, 0 = missing
        let has_value = match bitmap {
            Some(bm) => (bm[i / 8] >> (7 - (i % 8))) & 1 == 1,
            None => true,
        };

        if !has_value {
            values.push(None);
            continue;
        }

        // Zero width means every present point is the reference value
        let packed_value = if bits_per_value == 0 {
            0
        } else {
            extract_bits(packed_data, bit_position, bits_per_value).map_err(|e| {
                Grib2Error::UnpackingError(format!("Failed to extract bits: {}", e))
            })?
        };

        bit_position += bits_per_value;

        // Apply unpacking formula
        let value = (reference_value + (packed_value as f32) * binary_scale) * decimal_scale;
        values.push(Some(value));
    }

    Ok(values)
}

/// Extract bits from a byte array
/// Returns the bits as a 32-bit unsigned integer
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> Result<u32, String> {
    if num_bits > 32 || num_bits == 0 {
        return Err(format!("Invalid number of bits: {}", num_bits));
    }

    let mut result = 0u32;

    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8); // MSB first

        if byte_idx >= data.len() {
            return Err("Not enough data to extract bits".to_string());
        }

        let bit = (data[byte_idx] >> bit_idx) & 1;
        result = (result << 1) | (bit as u32);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bits() {
        // Test with simple byte: 0b10110101
        let data = vec![0b10110101];

        // Extract first 2 bits (should be 0b10 = 2)
        let result = extract_bits(&data, 0, 2).unwrap();
        assert_eq!(result, 0b10);

        // Extract bits 2-4 (should be 0b11 = 3)
        let result = extract_bits(&data, 2, 2).unwrap();
        assert_eq!(result, 0b11);

        // Extract all 8 bits
        let result = extract_bits(&data, 0, 8).unwrap();
        assert_eq!(result, 0b10110101);
    }

    #[test]
    fn test_simple_unpacking() {
        // Simple test: 2 data points, 8 bits per value
        let packed = vec![100, 200];
        let values = unpack_simple(
            &packed, 2,    // 2 data points = 16 bits = 2 bytes
            8,    // 8 bits per value
            0.0,  // reference value
            0,    // binary scale (2^0 = 1)
            0,    // decimal scale (10^0 = 1)
            None, // no bitmap
        );

        assert!(values.is_ok(), "Unpacking failed: {:?}", values);
        let vals = values.unwrap();
        assert_eq!(vals.len(), 2);
        // First value should be close to 100.0
        assert!((vals[0].unwrap() - 100.0).abs() < 0.1);
        // Second value should be close to 200.0
        assert!((vals[1].unwrap() - 200.0).abs() < 0.1);
    }

    #[test]
    fn test_bitmap_missing_points_do_not_consume_values() {
        // Points 0 and 2 present, point 1 missing
        let bitmap = vec![0b1010_0000];
        let packed = vec![10, 20];
        let vals = unpack_simple(&packed, 3, 8, 0.0, 0, 0, Some(&bitmap)).unwrap();

        assert_eq!(vals, vec![Some(10.0), None, Some(20.0)]);
    }

    #[test]
    fn test_zero_width_is_constant_field() {
        let vals = unpack_simple(&[], 4, 0, 273.15, 0, 0, None).unwrap();
        assert_eq!(vals, vec![Some(273.15); 4]);
    }

    #[test]
    fn test_scale_factors() {
        // (5 + 3 * 2^1) * 10^-1 = 1.1
        let vals = unpack_simple(&[3], 1, 8, 5.0, 1, 1, None).unwrap();
        assert!((vals[0].unwrap() - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_short_data_is_error() {
        let result = unpack_simple(&[1], 2, 8, 0.0, 0, 0, None);
        assert!(matches!(result, Err(Grib2Error::UnpackingError(_))));
    }

    #[test]
    fn test_point_count_checked_before_allocating() {
        // A corrupted header claiming billions of points fails up front
        let result = unpack_simple(&[1, 2, 3, 4], u32::MAX, 8, 0.0, 0, 0, None);
        assert!(matches!(result, Err(Grib2Error::UnpackingError(_))));

        let bitmap = vec![0xff; 2];
        let result = unpack_simple(&[1, 2, 3, 4], u32::MAX, 8, 0.0, 0, 0, Some(&bitmap));
        assert!(matches!(result, Err(Grib2Error::UnpackingError(_))));
    }

    #[test]
    fn test_bitmap_must_cover_every_point() {
        let bitmap = vec![0xff];
        let result = unpack_simple(&[0; 9], 9, 8, 0.0, 0, 0, Some(&bitmap));
        assert!(matches!(result, Err(Grib2Error::UnpackingError(_))));
    }
}
