//! TIFF tag value reading.
//!
//! Small values live inline in the IFD entry; larger ones (arrays, strings,
//! rationals) sit at an offset in the file and take one range read each.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{IfdEntry, TiffHeader};
use super::tags::FieldType;

// =============================================================================
// ValueReader
// =============================================================================

/// Reads entry values with the byte order of the file they came from.
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Raw value bytes of an entry, inline or fetched from its offset.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;
        let size = entry.value_byte_size().ok_or_else(|| TiffError::InvalidTagValue {
            tag: entry.tag_name(),
            message: format!("{} values of type {:?} overflow", entry.count, field_type),
        })?;

        if entry.is_inline {
            return Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ));
        }
        let offset = entry.value_offset(self.header.byte_order);
        let len = usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
            tag: entry.tag_name(),
            message: format!("value of {size} bytes cannot be addressed"),
        })?;
        Ok(self.reader.read_exact_at(offset, len)?)
    }

    /// Unsigned integer array (SHORT, LONG or LONG8), widened to u64.
    ///
    /// Used for StripOffsets and StripByteCounts.
    pub fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;
        let width = match field_type {
            FieldType::Short | FieldType::Long | FieldType::Long8 => field_type.size_in_bytes(),
            other => {
                return Err(TiffError::InvalidTagValue {
                    tag: entry.tag_name(),
                    message: format!("expected an unsigned integer array, got {other:?}"),
                })
            }
        };

        let order = self.header.byte_order;
        let bytes = self.read_bytes(entry)?;
        Ok(bytes
            .chunks_exact(width)
            .map(|chunk| match width {
                2 => order.read_u16(chunk) as u64,
                4 => order.read_u32(chunk) as u64,
                _ => order.read_u64(chunk),
            })
            .collect())
    }

    /// ASCII value up to its first NUL.
    pub fn read_string(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        if entry.field_type != Some(FieldType::Ascii) {
            return Err(TiffError::InvalidTagValue {
                tag: entry.tag_name(),
                message: format!("expected ASCII, got field type {}", entry.field_type_raw),
            });
        }
        let bytes = self.read_bytes(entry)?;
        let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(text).into_owned())
    }

    /// A single RATIONAL.
    pub fn read_rational(&self, entry: &IfdEntry) -> Result<Rational, TiffError> {
        if entry.field_type != Some(FieldType::Rational) || entry.count != 1 {
            return Err(TiffError::InvalidTagValue {
                tag: entry.tag_name(),
                message: format!(
                    "expected one RATIONAL, got {} of field type {}",
                    entry.count, entry.field_type_raw
                ),
            });
        }
        let bytes = self.read_bytes(entry)?;
        let order = self.header.byte_order;
        Ok(Rational::new(
            order.read_u32(&bytes[0..4]),
            order.read_u32(&bytes[4..8]),
        ))
    }
}

// =============================================================================
// Rational
// =============================================================================

/// An unsigned TIFF RATIONAL (two u32 values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub const ONE: Rational = Rational {
        numerator: 1,
        denominator: 1,
    };

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Value as a float, or `None` when the denominator is zero.
    pub fn to_f64(self) -> Option<f64> {
        if self.denominator == 0 {
            None
        } else {
            Some(self.numerator as f64 / self.denominator as f64)
        }
    }

    /// Closest rational with u32 terms, found by continued fraction expansion.
    ///
    /// Returns `None` for values that are not finite and positive, or that
    /// cannot be represented at all (larger than `u32::MAX`, or smaller than
    /// `1 / u32::MAX`).
    pub fn approximate(value: f64) -> Option<Self> {
        if !value.is_finite() || value <= 0.0 {
            return None;
        }

        let max = u32::MAX as u128;
        // Convergents h/k, starting from h(-1)/k(-1) = 1/0 and h(-2)/k(-2) = 0/1
        let (mut h_prev, mut h) = (0u128, 1u128);
        let (mut k_prev, mut k) = (1u128, 0u128);
        let mut x = value;
        let mut best: Option<(u128, u128)> = None;

        for _ in 0..64 {
            let a = x.floor();
            if a > max as f64 {
                break;
            }
            let a = a as u128;
            let h_next = a * h + h_prev;
            let k_next = a * k + k_prev;
            if h_next > max || k_next > max {
                break;
            }
            (h_prev, h) = (h, h_next);
            (k_prev, k) = (k, k_next);
            if h > 0 && k > 0 {
                best = Some((h, k));
            }

            let frac = x - a as f64;
            if frac < 1e-12 {
                break;
            }
            x = 1.0 / frac;
        }

        best.map(|(n, d)| Rational::new(n as u32, d as u32))
    }
}

impl std::fmt::Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

// =============================================================================
// Tests
// =============================================================================
