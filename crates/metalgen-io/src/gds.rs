//! GDS-II stream writer.
//!
//! A layout becomes one library holding one structure named after the layout.
//! Every wire segment and via is written as a closed five-point BOUNDARY on
//! the GDS layer/datatype its metal or cut layer maps to.
//!
//! Units: one user unit is 1 nm, one database unit is 1 pm, so every
//! coordinate on the 0.5 nm manufacturing grid is an exact integer.
//!
//! ## Record structure
//! Each record: [2-byte length][2-byte record type][payload]
//! HEADER → BGNLIB → LIBNAME → UNITS → BGNSTR → STRNAME → BOUNDARY* → ENDSTR → ENDLIB

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use metalgen_core::{LayerId, Layout, Rect};

pub(crate) mod record_type {
    pub const HEADER: u16 = 0x0002;
    pub const BGNLIB: u16 = 0x0102;
    pub const LIBNAME: u16 = 0x0206;
    pub const UNITS: u16 = 0x0305;
    pub const ENDLIB: u16 = 0x0400;
    pub const BGNSTR: u16 = 0x0502;
    pub const STRNAME: u16 = 0x0606;
    pub const ENDSTR: u16 = 0x0700;
    pub const BOUNDARY: u16 = 0x0800;
    pub const LAYER: u16 = 0x0D02;
    pub const DATATYPE: u16 = 0x0E02;
    pub const XY: u16 = 0x1003;
    pub const ENDEL: u16 = 0x1100;
}

/// Database units per user unit (1 nm / 1 pm).
const DB_PER_USER: f64 = 1000.0;
/// Size of a database unit in meters.
const DB_UNIT_M: f64 = 1e-12;
/// Name written to LIBNAME.
const LIBRARY_NAME: &str = "metalgen";
/// Fixed modification/access stamp so identical layouts give identical bytes.
const TIMESTAMP: [i16; 12] = [2000, 1, 1, 0, 0, 0, 2000, 1, 1, 0, 0, 0];

#[derive(Error, Debug)]
pub enum GdsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Layer {0} has no GDS mapping in the layer stack")]
    UnmappedLayer(LayerId),

    #[error("GDS layer/datatype {layer}/{datatype} exceeds the 16-bit signed range")]
    LayerOutOfRange { layer: u16, datatype: u16 },

    #[error("Coordinate {0} nm does not fit a 32-bit database unit")]
    CoordinateOverflow(f64),

    #[error("GDS record 0x{record_type:04X} needs {len} bytes; the limit is 65535")]
    RecordTooLong { record_type: u16, len: usize },
}

/// Convert IEEE 754 f64 to GDS-II excess-64 real format.
pub fn f64_to_gds_real8(value: f64) -> [u8; 8] {
    if value == 0.0 {
        return [0u8; 8];
    }

    let sign_bit: u8 = if value < 0.0 { 0x80 } else { 0x00 };
    let mut val = value.abs();

    // Normalize so that 1/16 <= mantissa < 1
    let mut exponent: i32 = 0;
    while val >= 1.0 && exponent < 63 {
        val /= 16.0;
        exponent += 1;
    }
    while val < 1.0 / 16.0 && exponent > -64 {
        val *= 16.0;
        exponent -= 1;
    }

    let mantissa = (val * (1u64 << 56) as f64).round() as u64;
    let mut result = [0u8; 8];
    result[0] = sign_bit | ((exponent + 64) as u8 & 0x7F);
    result[1..].copy_from_slice(&mantissa.to_be_bytes()[1..]);
    result
}

pub struct GdsWriter<W: io::Write> {
    writer: W,
}

impl<W: io::Write> GdsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the layout as a complete GDS-II stream.
    pub fn write(&mut self, layout: &Layout) -> Result<(), GdsError> {
        let stack = layout.rules().layers();
        let rects = layout.rects();

        self.write_i16_record(record_type::HEADER, &[600])?;
        self.write_i16_record(record_type::BGNLIB, &TIMESTAMP)?;
        self.write_string_record(record_type::LIBNAME, LIBRARY_NAME)?;
        self.write_real8_record(record_type::UNITS, &[1.0 / DB_PER_USER, DB_UNIT_M])?;

        self.write_i16_record(record_type::BGNSTR, &TIMESTAMP)?;
        self.write_string_record(record_type::STRNAME, &layout.name)?;
        for rect in &rects {
            let (layer, datatype) = stack
                .gds_mapping(rect.layer_id)
                .ok_or(GdsError::UnmappedLayer(rect.layer_id))?;
            self.write_boundary(rect, layer, datatype)?;
        }
        self.write_record(record_type::ENDSTR, &[])?;
        self.write_record(record_type::ENDLIB, &[])?;
        self.writer.flush()?;

        log::debug!(
            "{}: wrote {} boundaries to GDS library {}",
            layout.name,
            rects.len(),
            LIBRARY_NAME
        );
        Ok(())
    }

    fn write_record(&mut self, record_type: u16, data: &[u8]) -> Result<(), GdsError> {
        let len = data.len() + 4;
        let total_len = u16::try_from(len)
            .map_err(|_| GdsError::RecordTooLong { record_type, len })?;
        self.writer.write_all(&total_len.to_be_bytes())?;
        self.writer.write_all(&record_type.to_be_bytes())?;
        if !data.is_empty() {
            self.writer.write_all(data)?;
        }
        Ok(())
    }

    fn write_i16_record(&mut self, record_type: u16, values: &[i16]) -> Result<(), GdsError> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(record_type, &data)
    }

    fn write_i32_record(&mut self, record_type: u16, values: &[i32]) -> Result<(), GdsError> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(record_type, &data)
    }

    fn write_string_record(&mut self, record_type: u16, s: &str) -> Result<(), GdsError> {
        let mut data: Vec<u8> = s.bytes().collect();
        // GDS strings must be even length
        if data.len() % 2 != 0 {
            data.push(0);
        }
        self.write_record(record_type, &data)
    }

    fn write_real8_record(&mut self, record_type: u16, values: &[f64]) -> Result<(), GdsError> {
        let data: Vec<u8> = values.iter().flat_map(|v| f64_to_gds_real8(*v)).collect();
        self.write_record(record_type, &data)
    }

    fn write_boundary(&mut self, rect: &Rect, layer: u16, datatype: u16) -> Result<(), GdsError> {
        let out_of_range = || GdsError::LayerOutOfRange { layer, datatype };
        let gds_layer = i16::try_from(layer).map_err(|_| out_of_range())?;
        let gds_datatype = i16::try_from(datatype).map_err(|_| out_of_range())?;

        let x1 = to_db(rect.lower_left.x)?;
        let y1 = to_db(rect.lower_left.y)?;
        let x2 = to_db(rect.upper_right.x)?;
        let y2 = to_db(rect.upper_right.y)?;

        self.write_record(record_type::BOUNDARY, &[])?;
        self.write_i16_record(record_type::LAYER, &[gds_layer])?;
        self.write_i16_record(record_type::DATATYPE, &[gds_datatype])?;
        // 5 points: closed rectangle
        self.write_i32_record(record_type::XY, &[x1, y1, x2, y1, x2, y2, x1, y2, x1, y1])?;
        self.write_record(record_type::ENDEL, &[])?;
        Ok(())
    }
}

fn to_db(nm: f64) -> Result<i32, GdsError> {
    let db = (nm * DB_PER_USER).round();
    if db.is_finite() && db >= i32::MIN as f64 && db <= i32::MAX as f64 {
        Ok(db as i32)
    } else {
        Err(GdsError::CoordinateOverflow(nm))
    }
}

/// Write `layout` to a GDS-II file at `path`.
pub fn write_gds(layout: &Layout, path: &Path) -> Result<(), GdsError> {
    let file = File::create(path)?;
    GdsWriter::new(BufWriter::new(file)).write(layout)
}
