//! GRIB2 section parsing.
//!
//! Only the sections needed to unpack a single message's values are read:
//! the indicator (0), the point count of the grid definition (3), the data
//! representation (5), the bitmap (6) and the data itself (7).

use crate::Grib2Error;
use bytes::Bytes;

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    /// Number of values actually packed in Section 7
    pub num_data_points: u32,
    pub template_number: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub data: Bytes,
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 1-4: "GRIB"
    // Octets 5-6: Reserved
    // Octet 7: Discipline
    // Octet 8: GRIB Edition Number
    // Octets 9-16: Total length of GRIB message (8-byte big-endian)
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    let mut length = [0u8; 8];
    length.copy_from_slice(&data[8..16]);

    Ok(Indicator {
        discipline,
        edition,
        message_length: u64::from_be_bytes(length),
    })
}

/// Read the total number of grid points from Section 3.
pub fn parse_grid_point_count(data: &[u8]) -> Result<u32, Grib2Error> {
    let section_offset = find_section(data, 3)?;
    let section_data = &data[section_offset..];

    // Bytes 0-3: Section length
    // Byte 4: Section number (3)
    // Byte 5: Source of grid definition
    // Bytes 6-9: Number of data points (u32)
    if section_data.len() < 10 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Not enough data".to_string(),
        });
    }

    Ok(u32::from_be_bytes([
        section_data[6],
        section_data[7],
        section_data[8],
        section_data[9],
    ]))
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let section_offset = find_section(data, 5)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 21 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 6-9 [5-8]: Number of data points (N)
    // Octets 10-11 [9-10]: Data representation template number
    // Octets 12-15 [11-14]: Reference value (R) - IEEE 32-bit float
    // Octets 16-17 [15-16]: Binary scale factor (E)
    // Octets 18-19 [17-18]: Decimal scale factor (D)
    // Octet 20 [19]: Number of bits per packed value
    //
    // Templates 5.0, 5.2, 5.3, 5.40 and 5.41 share this prefix.
    let num_data_points = u32::from_be_bytes([
        section_data[5],
        section_data[6],
        section_data[7],
        section_data[8],
    ]);
    let template_number = u16::from_be_bytes([section_data[9], section_data[10]]);
    let reference_value = f32::from_be_bytes([
        section_data[11],
        section_data[12],
        section_data[13],
        section_data[14],
    ]);

    Ok(DataRepresentation {
        num_data_points,
        template_number,
        reference_value,
        binary_scale_factor: sign_magnitude_i16(section_data[15], section_data[16]),
        decimal_scale_factor: sign_magnitude_i16(section_data[17], section_data[18]),
        bits_per_value: section_data[19],
    })
}

/// Parse Section 6 (Bitmap). `None` when the message carries no bitmap.
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Bitmap>, Grib2Error> {
    let section_offset = find_section(data, 6)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "Not enough data".to_string(),
        });
    }

    let section_length = section_length(section_data);
    if section_length < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Section length {} is shorter than its header", section_length),
        });
    }
    let indicator = section_data[5];

    match indicator {
        255 => Ok(None),
        0 => Ok(Some(Bitmap {
            data: Bytes::copy_from_slice(&section_data[6..section_length]),
        })),
        other => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Unsupported bitmap indicator {}", other),
        }),
    }
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let section_offset = find_section(data, 7)?;
    let section_data = &data[section_offset..];
    let section_length = section_length(section_data);

    let data_bytes = if section_length > 5 {
        Bytes::copy_from_slice(&section_data[5..section_length])
    } else {
        Bytes::new()
    };

    Ok(DataSection { data: data_bytes })
}

// ===== Helper Functions =====

fn section_length(section_data: &[u8]) -> usize {
    u32::from_be_bytes([
        section_data[0],
        section_data[1],
        section_data[2],
        section_data[3],
    ]) as usize
}

/// GRIB2 stores signed integers as sign bit plus magnitude, not two's complement.
fn sign_magnitude_i16(hi: u8, lo: u8) -> i16 {
    let magnitude = (((hi & 0x7f) as i16) << 8) | lo as i16;
    if hi & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Find a section by number within a message. The returned offset always
/// has the whole section available.
fn find_section(data: &[u8], section_num: u8) -> Result<usize, Grib2Error> {
    let mut offset = 16; // After Section 0

    loop {
        if offset + 5 > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Section not found".to_string(),
            });
        }

        // End marker "7777"
        if &data[offset..offset + 4] == b"7777" {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Reached end of message without finding section".to_string(),
            });
        }

        let length = section_length(&data[offset..]);
        if length < 5 || offset + length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Invalid section length".to_string(),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(offset);
        }

        offset += length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_magnitude() {
        assert_eq!(sign_magnitude_i16(0x00, 0x05), 5);
        assert_eq!(sign_magnitude_i16(0x80, 0x05), -5);
        assert_eq!(sign_magnitude_i16(0x80, 0x00), 0);
    }

    #[test]
    fn test_indicator_rejects_bad_magic() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIX");
        data[7] = 2;
        assert!(matches!(parse_indicator(&data), Err(Grib2Error::InvalidFormat(_))));
    }

    #[test]
    fn test_indicator_rejects_edition_1() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIB");
        data[7] = 1;
        assert!(parse_indicator(&data).is_err());
    }

    /// Indicator section followed by the given sections and the end marker.
    fn message_with_sections(sections: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIB");
        data[7] = 2;
        for section in sections {
            data.extend_from_slice(section);
        }
        data.extend_from_slice(b"7777");
        let total = data.len() as u64;
        data[8..16].copy_from_slice(&total.to_be_bytes());
        data
    }

    #[test]
    fn test_bitmap_shorter_than_header_is_error() {
        // Length 5 leaves no room for the bitmap indicator
        let section6: [u8; 5] = [0, 0, 0, 5, 6];
        let data = message_with_sections(&[&section6]);
        assert!(matches!(
            parse_bitmap(&data),
            Err(Grib2Error::InvalidSection { section: 6, .. })
        ));

        // Still caught when the indicator byte happens to follow
        let mut data = message_with_sections(&[&section6]);
        data.insert(21, 0);
        assert!(matches!(
            parse_bitmap(&data),
            Err(Grib2Error::InvalidSection { section: 6, .. })
        ));
    }

    #[test]
    fn test_bitmap_indicator_values() {
        let absent = message_with_sections(&[&[0, 0, 0, 6, 6, 255]]);
        assert!(parse_bitmap(&absent).unwrap().is_none());

        let present = message_with_sections(&[&[0, 0, 0, 7, 6, 0, 0b1010_0000]]);
        let bitmap = parse_bitmap(&present).unwrap().unwrap();
        assert_eq!(bitmap.data.as_ref(), &[0b1010_0000]);

        let predefined = message_with_sections(&[&[0, 0, 0, 6, 6, 254]]);
        assert!(parse_bitmap(&predefined).is_err());
    }

    #[test]
    fn test_find_section_stops_at_end_marker() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIB");
        data.extend_from_slice(b"7777");
        data.push(0);
        assert!(find_section(&data, 5).is_err());
    }
}
