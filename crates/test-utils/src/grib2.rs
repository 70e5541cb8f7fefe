//! GRIB2 test data generator.
//!
//! Creates minimal synthetic GRIB2 messages with valid structure. Values are
//! simple packed (template 5.0) at 16 bits unless the field is constant.

/// Build a minimal GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    // Grid definition
    ni: u32,
    nj: u32,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    // Data
    data_values: Vec<f32>,
    /// Presence mask; when set, only `true` points are packed
    bitmap: Option<Vec<bool>>,
}

impl Grib2Builder {
    /// Create a new builder with defaults for HRRR-like surface data
    pub fn new_hrrr() -> Self {
        let ni = 4;
        let nj = 3;
        Self {
            discipline: 0, // Meteorological
            center: 7,     // NCEP
            year: 2024,
            month: 1,
            day: 15,
            hour: 12,
            ni,
            nj,
            param_category: 0,
            param_number: 0, // TMP
            level_type: 103, // m above ground
            level_value: 2,  // 2m
            forecast_hour: 0,
            data_values: vec![288.15; (ni * nj) as usize],
            bitmap: None,
        }
    }

    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self.bitmap = None;
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    /// Set values as a single row; the grid becomes `values.len()` x 1.
    pub fn with_values(mut self, values: &[f32]) -> Self {
        self.ni = values.len() as u32;
        self.nj = 1;
        self.data_values = values.to_vec();
        self.bitmap = None;
        self
    }

    /// Mark points missing; `NaN` entries in the data are masked out.
    pub fn with_nan_bitmap(mut self) -> Self {
        self.bitmap = Some(self.data_values.iter().map(|v| !v.is_nan()).collect());
        self
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let mut message = Vec::new();

        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4();
        let section5 = self.build_section5();
        let section6 = self.build_section6();
        let section7 = self.build_section7();

        let message_length = 16 // Section 0
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4; // Section 8 (end)

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // Reserved
        message.push(self.discipline);
        message.push(2); // Edition 2
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn present_values(&self) -> Vec<f32> {
        match &self.bitmap {
            Some(mask) => self
                .data_values
                .iter()
                .zip(mask)
                .filter(|(_, present)| **present)
                .map(|(v, _)| *v)
                .collect(),
            None => self.data_values.clone(),
        }
    }

    /// (reference value, binary scale factor, bits per value)
    fn packing_parameters(&self) -> (f32, i16, u8) {
        let (min_val, max_val) = self.present_values().iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v)),
        );
        if !min_val.is_finite() {
            return (0.0, 0, 0);
        }

        let range = max_val - min_val;
        if range == 0.0 {
            return (min_val, 0, 0);
        }

        // value = reference + packed * 2^E with packed <= 65535
        let binary_scale_factor = (range / 65535.0).log2().ceil() as i16;
        (min_val, binary_scale_factor, 16)
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let section_length: u32 = 21;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(1); // Section number

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time (start of forecast)

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0); // Minute
        section.push(0); // Second

        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 3.0: Latitude/Longitude
        let template_data_len = 58;
        let section_length: u32 = 14 + template_data_len;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(3); // Section number

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // Number of octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&0u16.to_be_bytes()); // Grid definition template

        section.push(6); // Shape of Earth (spherical with radius 6371229m)
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFFFFFFu32.to_be_bytes()); // Subdivisions

        section.extend_from_slice(&38_000_000i32.to_be_bytes()); // La1
        section.extend_from_slice(&260_000_000i32.to_be_bytes()); // Lo1
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&(38_000_000i32 - self.nj as i32 * 30_000).to_be_bytes());
        section.extend_from_slice(&(260_000_000i32 + self.ni as i32 * 30_000).to_be_bytes());
        section.extend_from_slice(&30_000u32.to_be_bytes()); // Di
        section.extend_from_slice(&30_000u32.to_be_bytes()); // Dj
        section.push(0b01000000); // Scanning mode

        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 4.0: Analysis or forecast at horizontal level
        let section_length: u32 = 34;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(4); // Section number

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Product definition template

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Type of generating process (forecast)
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());

        section.push(self.level_type);
        section.push(0);
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // No second fixed surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_section5(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing_parameters();
        let section_length: u32 = 21;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(5); // Section number

        section.extend_from_slice(&(self.present_values().len() as u32).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&reference_value.to_be_bytes());
        section.extend_from_slice(&sign_magnitude(binary_scale_factor));
        section.extend_from_slice(&sign_magnitude(0)); // Decimal scale factor
        section.push(bits_per_value);
        section.push(0); // Original field type (floating point)

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();

        match &self.bitmap {
            None => {
                section.extend_from_slice(&6u32.to_be_bytes());
                section.push(6);
                section.push(255); // No bitmap, all data present
            }
            Some(mask) => {
                let mut bits = vec![0u8; mask.len().div_ceil(8)];
                for (i, present) in mask.iter().enumerate() {
                    if *present {
                        bits[i / 8] |= 0x80 >> (i % 8);
                    }
                }
                section.extend_from_slice(&(6 + bits.len() as u32).to_be_bytes());
                section.push(6);
                section.push(0); // Bitmap follows
                section.extend_from_slice(&bits);
            }
        }

        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let packed_data = self.pack_simple();
        let section_length: u32 = 5 + packed_data.len() as u32;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(7); // Section number
        section.extend_from_slice(&packed_data);

        section
    }

    fn pack_simple(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing_parameters();
        if bits_per_value == 0 {
            return Vec::new();
        }

        let binary_scale = 2.0_f32.powi(binary_scale_factor as i32);
        let mut packed = Vec::new();
        for val in self.present_values() {
            let packed_value = ((val - reference_value) / binary_scale).round() as u16;
            packed.extend_from_slice(&packed_value.to_be_bytes());
        }

        packed
    }
}

/// GRIB2 signed integers are sign bit plus magnitude.
fn sign_magnitude(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7fff;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}
