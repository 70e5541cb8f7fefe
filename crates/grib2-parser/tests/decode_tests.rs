//! Decoding tests against synthetic GRIB2 messages.

use grib2_parser::{decode_message, Grib2Error};
use test_utils::{assert_approx_eq, assert_values_approx_eq, Grib2Builder};

#[test]
fn test_gradient_decodes_in_point_order() {
    let data = Grib2Builder::new_hrrr()
        .with_grid(10, 1)
        .with_gradient(0.0, 100.0)
        .build();

    let values = decode_message(&data).expect("decode");
    assert_eq!(values.len(), 10);

    assert!(values[0].abs() < 0.01, "first value {}", values[0]);
    assert_approx_eq!(values[9], 90.0, 0.01);
    for i in 1..values.len() {
        assert!(values[i] >= values[i - 1], "values should increase");
    }
}

#[test]
fn test_constant_field_has_no_packed_bits() {
    let data = Grib2Builder::new_hrrr()
        .with_grid(5, 5)
        .with_constant_value(288.15)
        .build();

    let values = decode_message(&data).expect("decode");
    assert_eq!(values.len(), 25);
    assert!(values.iter().all(|v| (*v - 288.15).abs() < 1e-4));
}

#[test]
fn test_explicit_values_roundtrip_within_packing_precision() {
    let data = Grib2Builder::new_hrrr()
        .with_values(&[1.2, 0.5, -3.25, 0.0])
        .build();

    let values = decode_message(&data).expect("decode");
    assert_values_approx_eq!(values, [1.2_f32, 0.5, -3.25, 0.0], 0.001);
}

#[test]
fn test_trailing_bytes_after_message_are_ignored() {
    let mut data = Grib2Builder::new_hrrr()
        .with_values(&[10.0, 20.0, 30.0])
        .build();
    // A byte range ending at the next message's start offset carries one extra byte
    data.push(b'G');

    let values = decode_message(&data).expect("decode");
    assert_values_approx_eq!(values, [10.0_f32, 20.0, 30.0], 0.001);
}

#[test]
fn test_bitmap_missing_points_decode_as_nan() {
    let data = Grib2Builder::new_hrrr()
        .with_values(&[1.0, f32::NAN, 3.0, 4.0])
        .with_nan_bitmap()
        .build();

    let values = decode_message(&data).expect("decode");
    assert_eq!(values.len(), 4);
    assert_approx_eq!(values[0], 1.0, 0.001);
    assert!(values[1].is_nan());
    assert_approx_eq!(values[2], 3.0, 0.001);
    assert_approx_eq!(values[3], 4.0, 0.001);
}

#[test]
fn test_truncated_message_is_rejected() {
    let data = Grib2Builder::new_hrrr().with_gradient(0.0, 1.0).build();

    let result = decode_message(&data[..data.len() - 10]);
    assert!(matches!(result, Err(Grib2Error::Truncated { .. })));
}

#[test]
fn test_non_grib_payload_is_rejected() {
    let result = decode_message(b"<Error><Code>NoSuchKey</Code></Error>");
    assert!(matches!(result, Err(Grib2Error::InvalidFormat(_))));
}

fn section_length_at(data: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]) as usize
}

/// Byte offset of section `number` in a well-formed message.
fn section_offset(data: &[u8], number: u8) -> usize {
    let mut offset = 16;
    loop {
        if data[offset + 4] == number {
            return offset;
        }
        offset += section_length_at(data, offset);
    }
}

/// Rebuild a message with section `number` swapped for `replacement`.
fn replace_section(data: &[u8], number: u8, replacement: &[u8]) -> Vec<u8> {
    let offset = section_offset(data, number);
    let end = offset + section_length_at(data, offset);

    let mut out = Vec::with_capacity(data.len() + replacement.len());
    out.extend_from_slice(&data[..offset]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&data[end..]);

    let total = out.len() as u64;
    out[8..16].copy_from_slice(&total.to_be_bytes());
    out
}

/// Section 5, template 5.3: complex packing with first-order spatial
/// differencing of 5 points, one group, 3-bit values, R = 0, E = 0, D = 0.
const SECTION5_COMPLEX_SPATIAL: [u8; 49] = [
    0, 0, 0, 49, 5, // length, section number
    0, 0, 0, 5, // encoded points
    0, 3, // template 5.3
    0, 0, 0, 0, // reference value
    0, 0, // binary scale factor
    0, 0, // decimal scale factor
    8, // bits per group reference
    0, // original field type: floating point
    1, // general group splitting
    0, // no missing values
    0, 0, 0, 0, // primary missing substitute
    0, 0, 0, 0, // secondary missing substitute
    0, 0, 0, 1, // number of groups
    3, // group width reference
    8, // bits per group width
    0, 0, 0, 5, // group length reference
    1, // group length increment
    0, 0, 0, 5, // true length of last group
    8, // bits per group length
    1, // first-order spatial differencing
    2, // octets per extra descriptor
];

/// Section 7 for [`SECTION5_COMPLEX_SPATIAL`] encoding `[10, 12, 15, 15, 11]`:
/// first value 10, minimum difference -4, differences minus minimum
/// `[_, 6, 7, 4, 0]` at 3 bits each.
const SECTION7_COMPLEX_SPATIAL: [u8; 14] = [
    0, 0, 0, 14, 7, // length, section number
    0x00, 0x0a, // first value: 10
    0x80, 0x04, // overall minimum: -4 (sign and magnitude)
    0x00, // group reference
    0x00, // group width (added to reference 3)
    0x00, // group length (last group uses its true length)
    0b0001_1011, 0b1100_0000, // 000 110 111 100 000
];

#[test]
fn test_corrupt_bitmap_length_is_error_not_panic() {
    let mut data = Grib2Builder::new_hrrr()
        .with_values(&[1.0, f32::NAN, 3.0])
        .with_nan_bitmap()
        .build();

    // Section 6 declares 5 bytes: no room for the indicator it still carries
    let offset = section_offset(&data, 6);
    data[offset..offset + 4].copy_from_slice(&5u32.to_be_bytes());
    data[offset + 5] = 0;

    let result = decode_message(&data);
    assert!(
        matches!(result, Err(Grib2Error::InvalidSection { section: 6, .. })),
        "unexpected result {:?}",
        result
    );
}

#[test]
fn test_corrupt_point_count_is_error_not_panic() {
    let mut data = Grib2Builder::new_hrrr()
        .with_values(&[1.0, 2.0, 3.0])
        .build();

    // Section 3 octets 7-10: number of data points
    let offset = section_offset(&data, 3);
    data[offset + 6..offset + 10].copy_from_slice(&u32::MAX.to_be_bytes());

    let result = decode_message(&data);
    assert!(matches!(result, Err(Grib2Error::UnpackingError(_))));
}

#[test]
fn test_complex_packing_with_spatial_differencing() {
    let simple = Grib2Builder::new_hrrr()
        .with_values(&[0.0; 5])
        .build();
    let data = replace_section(&simple, 5, &SECTION5_COMPLEX_SPATIAL);
    let data = replace_section(&data, 7, &SECTION7_COMPLEX_SPATIAL);

    let values = decode_message(&data).expect("decode");
    assert_values_approx_eq!(values, [10.0_f32, 12.0, 15.0, 15.0, 11.0], 1e-6);

    // The inclusive range's extra byte is dropped on this path too
    let mut padded = data.clone();
    padded.push(b'G');
    let values = decode_message(&padded).expect("decode");
    assert_eq!(values.len(), 5);
}

#[test]
fn test_unsupported_packing_is_decode_error() {
    // Template 5.40 (JPEG 2000) is not built in
    let section5: [u8; 23] = [
        0, 0, 0, 23, 5, // length, section number
        0, 0, 0, 3, // encoded points
        0, 40, // template 5.40
        0, 0, 0, 0, // reference value
        0, 0, // binary scale factor
        0, 0, // decimal scale factor
        16, // bits per value
        0,  // original field type
        0,  // lossless
        255, // compression ratio: missing
    ];
    let simple = Grib2Builder::new_hrrr()
        .with_values(&[1.0, 2.0, 3.0])
        .build();
    let data = replace_section(&simple, 5, &section5);

    let result = decode_message(&data);
    assert!(
        matches!(result, Err(Grib2Error::DecodeError(_))),
        "unexpected result {:?}",
        result
    );
}
