//! Synthetic HRRR files and their `.idx` manifests.
//!
//! A manifest line looks like `71:48151228:d=2024011512:TMP:2 m above ground:anl:`
//! and gives the 1-based message ordinal, its starting byte offset, and a
//! description of the field.

use crate::grib2::Grib2Builder;

/// Build one manifest line.
pub fn manifest_line(ordinal: u32, offset: u64, run: &str, name: &str, level: &str) -> String {
    format!("{}:{}:d={}:{}:{}:anl:", ordinal, offset, run, name, level)
}

/// A manifest with `count` entries spaced `stride` bytes apart.
pub fn manifest_lines(count: u32, stride: u64) -> Vec<String> {
    (1..=count)
        .map(|ordinal| {
            manifest_line(
                ordinal,
                (ordinal as u64 - 1) * stride,
                "2024011512",
                &format!("VAR{}", ordinal),
                "surface",
            )
        })
        .collect()
}

/// A whole HRRR-style file: `count` GRIB2 messages laid end to end.
///
/// Every message decodes to a grid of `points` values. Ordinals without an
/// explicit field are filled with a constant equal to the ordinal.
#[derive(Debug, Clone)]
pub struct SyntheticHrrrFile {
    count: u32,
    points: usize,
    fields: Vec<(u32, Vec<f32>)>,
}

impl SyntheticHrrrFile {
    pub fn new(count: u32, points: usize) -> Self {
        Self {
            count,
            points,
            fields: Vec::new(),
        }
    }

    /// Set the values carried by message `ordinal` (1-based).
    pub fn with_field(mut self, ordinal: u32, values: &[f32]) -> Self {
        assert_eq!(values.len(), self.points, "field length must match grid");
        self.fields.retain(|(o, _)| *o != ordinal);
        self.fields.push((ordinal, values.to_vec()));
        self
    }

    /// File bytes and the manifest lines describing them.
    pub fn build(&self) -> (Vec<u8>, Vec<String>) {
        let mut bytes = Vec::new();
        let mut lines = Vec::with_capacity(self.count as usize);

        for ordinal in 1..=self.count {
            let values = self
                .fields
                .iter()
                .find(|(o, _)| *o == ordinal)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| vec![ordinal as f32; self.points]);

            lines.push(manifest_line(
                ordinal,
                bytes.len() as u64,
                "2024011512",
                &format!("VAR{}", ordinal),
                "surface",
            ));
            bytes.extend(Grib2Builder::new_hrrr().with_values(&values).build());
        }

        (bytes, lines)
    }
}
