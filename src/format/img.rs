//! QSTEM `.img` reader.
//!
//! QSTEM stores a single 2D simulation result per file:
//!
//! ```text
//! 8 x i32   header_size, param_size, comment_size, nx, ny, is_complex, data_size, version
//! 3 x f64   t, dx, dy
//! param_size x f64   auxiliary parameters
//! comment_size bytes comment
//! nx * ny samples, column-major
//! ```
//!
//! All values are little-endian. `data_size` is the size of one sample in
//! bytes, so complex files use 8 (two f32) or 16 (two f64).

use serde_json::{json, Map};
use tracing::debug;

use crate::error::ImgError;
use crate::model::{AxisDescriptor, Calibration, DataType, LogicalArray, PixelData};

use super::samples::decode_samples;
use super::tiff::ByteOrder;

/// Size of the fixed part of the header
pub const FIXED_HEADER_SIZE: usize = 8 * 4 + 3 * 8;

/// Sampling in the file is in Ångström; calibrations are reported in nm.
const ANGSTROM_PER_NM: f64 = 10.0;

// =============================================================================
// Header
// =============================================================================

/// The fixed-size part of a QSTEM header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImgHeader {
    pub header_size: i32,
    pub param_size: usize,
    pub comment_size: usize,
    pub nx: usize,
    pub ny: usize,
    pub is_complex: bool,
    pub data_size: i32,
    pub version: i32,
    /// Thickness or time of the simulation step
    pub t: f64,
    /// Sampling along x (Å)
    pub dx: f64,
    /// Sampling along y (Å)
    pub dy: f64,
}

impl ImgHeader {
    /// Parse the fixed header.
    pub fn parse(bytes: &[u8]) -> Result<Self, ImgError> {
        if bytes.len() < FIXED_HEADER_SIZE {
            return Err(ImgError::FileTooSmall {
                required: FIXED_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let int = |i: usize| {
            let start = i * 4;
            i32::from_le_bytes([
                bytes[start],
                bytes[start + 1],
                bytes[start + 2],
                bytes[start + 3],
            ])
        };
        let double = |i: usize| {
            let start = 32 + i * 8;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[start..start + 8]);
            f64::from_le_bytes(raw)
        };
        let non_negative = |field: &'static str, value: i32| {
            usize::try_from(value).map_err(|_| ImgError::InvalidHeader {
                field,
                value: value as i64,
            })
        };
        let positive = |field: &'static str, value: i32| -> Result<usize, ImgError> {
            match non_negative(field, value)? {
                0 => Err(ImgError::InvalidHeader { field, value: 0 }),
                v => Ok(v),
            }
        };

        Ok(ImgHeader {
            header_size: int(0),
            param_size: non_negative("param_size", int(1))?,
            comment_size: non_negative("comment_size", int(2))?,
            nx: positive("nx", int(3))?,
            ny: positive("ny", int(4))?,
            is_complex: int(5) != 0,
            data_size: int(6),
            version: int(7),
            t: double(0),
            dx: double(1),
            dy: double(2),
        })
    }

    /// Sample type declared by `is_complex` and `data_size`.
    pub fn dtype(&self) -> Result<DataType, ImgError> {
        match (self.is_complex, self.data_size) {
            (false, 4) => Ok(DataType::Float32),
            (false, 8) => Ok(DataType::Float64),
            (true, 8) => Ok(DataType::Complex64),
            (true, 16) => Ok(DataType::Complex128),
            (is_complex, data_size) => Err(ImgError::UnsupportedSampleType {
                data_size,
                is_complex,
            }),
        }
    }

    /// Offset of the first sample.
    pub fn data_offset(&self) -> usize {
        FIXED_HEADER_SIZE + self.param_size * 8 + self.comment_size
    }
}

// =============================================================================
// ImgFile
// =============================================================================

/// A decoded QSTEM file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImgFile {
    pub header: ImgHeader,
    pub parameters: Vec<f64>,
    pub comment: String,
    /// Samples in row-major `(ny, nx)` order
    pub pixels: PixelData,
}

impl ImgFile {
    /// Parse a complete file.
    pub fn parse(bytes: &[u8]) -> Result<Self, ImgError> {
        let header = ImgHeader::parse(bytes)?;
        let dtype = header.dtype()?;

        let data_offset = header.data_offset();
        let required = header
            .nx
            .checked_mul(header.ny)
            .and_then(|n| n.checked_mul(dtype.size_in_bytes()))
            .and_then(|len| len.checked_add(data_offset));
        let required = match required {
            Some(required) if bytes.len() >= required => required,
            _ => {
                return Err(ImgError::FileTooSmall {
                    required: required.map_or(u64::MAX, |r| r as u64),
                    actual: bytes.len() as u64,
                })
            }
        };

        let parameters = bytes[FIXED_HEADER_SIZE..FIXED_HEADER_SIZE + header.param_size * 8]
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();

        let comment_start = FIXED_HEADER_SIZE + header.param_size * 8;
        let comment = String::from_utf8_lossy(&bytes[comment_start..data_offset])
            .trim_end_matches('\0')
            .to_string();

        // Column-major (ny, nx) is row-major (nx, ny) transposed
        let pixels = decode_samples(
            dtype,
            &[header.nx, header.ny],
            &bytes[data_offset..required],
            ByteOrder::LittleEndian,
        )
        .map_err(|_| ImgError::FileTooSmall {
            required: required as u64,
            actual: bytes.len() as u64,
        })?
        .permuted(&[1, 0]);

        debug!(
            nx = header.nx,
            ny = header.ny,
            dtype = %dtype,
            version = header.version,
            "Parsed QSTEM file"
        );

        Ok(ImgFile {
            header,
            parameters,
            comment,
            pixels,
        })
    }

    /// Convert to a 2D datum array calibrated in nm.
    pub fn into_logical_array(self) -> LogicalArray {
        let mut properties = Map::new();
        properties.insert("t".into(), json!(self.header.t));
        properties.insert("version".into(), json!(self.header.version));
        if !self.comment.is_empty() {
            properties.insert("comment".into(), json!(self.comment));
        }
        if !self.parameters.is_empty() {
            properties.insert("parameters".into(), json!(self.parameters));
        }

        let calibrations = vec![
            Calibration::scaled(self.header.dy / ANGSTROM_PER_NM, "nm"),
            Calibration::scaled(self.header.dx / ANGSTROM_PER_NM, "nm"),
        ];
        let descriptor = AxisDescriptor::default_for_rank(2);

        LogicalArray::from_parts(
            self.pixels,
            descriptor,
            Some(calibrations),
            Calibration::identity(),
            None,
            properties,
        )
    }
}
