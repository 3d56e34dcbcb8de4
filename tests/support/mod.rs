#![allow(dead_code)]

//! In-test assembly of FIT documents.

use fit2gpx::sans::check::compute_crc;

/// How a check value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crc {
    Valid,
    /// Written as zero, meaning not computed.
    Zero,
    /// Non-zero and wrong.
    Corrupt,
    /// Not written at all: a 12-byte header, or no trailing bytes.
    Absent,
}

/// `(field number, size, base type byte)` of the record fields most tests use.
pub const RECORD_FIELDS: [(u8, u8, u8); 6] = [
    (253, 4, 0x86), // timestamp, uint32
    (0, 4, 0x85),   // position_lat, sint32
    (1, 4, 0x85),   // position_long, sint32
    (2, 2, 0x84),   // altitude, uint16
    (3, 1, 0x02),   // heart_rate, uint8
    (4, 1, 0x02),   // cadence, uint8
];

pub const RECORD: u16 = 20;

/// Body of a data record laid out as [`RECORD_FIELDS`], little endian.
pub fn record_body(timestamp: u32, lat: i32, lon: i32, altitude: u16, hr: u8, cadence: u8) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend(timestamp.to_le_bytes());
    body.extend(lat.to_le_bytes());
    body.extend(lon.to_le_bytes());
    body.extend(altitude.to_le_bytes());
    body.push(hr);
    body.push(cadence);
    body
}

#[derive(Debug, Clone)]
pub struct FitBuilder {
    records: Vec<u8>,
    pub header_crc: Crc,
    pub file_crc: Crc,
}

impl Default for FitBuilder {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            header_crc: Crc::Valid,
            file_crc: Crc::Valid,
        }
    }
}

impl FitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a little-endian definition record.
    pub fn define(&mut self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> &mut Self {
        self.records.push(0x40 | local);
        self.records.extend([0, 0]);
        self.records.extend(global.to_le_bytes());
        self.push_fields(fields)
    }

    /// Append a big-endian definition record with developer fields.
    pub fn define_big_endian(
        &mut self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> &mut Self {
        self.records.push(0x60 | local);
        self.records.extend([0, 1]);
        self.records.extend(global.to_be_bytes());
        self.push_fields(fields).push_fields(developer)
    }

    fn push_fields(&mut self, fields: &[(u8, u8, u8)]) -> &mut Self {
        self.records.push(fields.len() as u8);
        for &(number, size, base_type) in fields {
            self.records.extend([number, size, base_type]);
        }
        self
    }

    /// Append a data record with a normal header.
    pub fn data(&mut self, local: u8, body: &[u8]) -> &mut Self {
        self.records.push(local);
        self.records.extend_from_slice(body);
        self
    }

    /// Append a data record with a compressed timestamp header.
    pub fn compressed(&mut self, local: u8, offset: u8, body: &[u8]) -> &mut Self {
        self.records.push(0x80 | (local << 5) | (offset & 0x1F));
        self.records.extend_from_slice(body);
        self
    }

    /// Append bytes verbatim to the record section.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.records.extend_from_slice(bytes);
        self
    }

    /// Length of the record section so far.
    pub fn records_len(&self) -> usize {
        self.records.len()
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_declaring(self.records.len() as u32)
    }

    /// Build with an arbitrary record section length in the header.
    pub fn build_declaring(&self, data_size: u32) -> Vec<u8> {
        let header_len = match self.header_crc {
            Crc::Absent => 12,
            _ => 14,
        };

        let mut out = vec![header_len, 0x20];
        out.extend(2132_u16.to_le_bytes());
        out.extend(data_size.to_le_bytes());
        out.extend(b".FIT");
        if let Some(crc) = check_value(self.header_crc, &out) {
            out.extend(crc.to_le_bytes());
        }

        out.extend_from_slice(&self.records);
        if let Some(crc) = check_value(self.file_crc, &out) {
            out.extend(crc.to_le_bytes());
        }

        out
    }
}

fn check_value(crc: Crc, covered: &[u8]) -> Option<u16> {
    let valid = compute_crc(0, covered);
    match crc {
        Crc::Valid => Some(valid),
        Crc::Zero => Some(0),
        Crc::Corrupt => Some(match valid.wrapping_add(1) {
            0 => 1,
            x => x,
        }),
        Crc::Absent => None,
    }
}

/// A document with a definition for `record` messages and one data record
/// per body.
pub fn ride(bodies: &[Vec<u8>]) -> FitBuilder {
    let mut b = FitBuilder::new();
    b.define(0, RECORD, &RECORD_FIELDS);
    for body in bodies {
        b.data(0, body);
    }
    b
}
