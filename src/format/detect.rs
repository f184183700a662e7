//! Format detection for microscopy image files.
//!
//! Files are identified by extension first, falling back to magic bytes when
//! the extension is missing or unknown. Supported formats:
//!
//! - **TIFF**: classic TIFF or BigTIFF, with or without an ImageJ description
//! - **QSTEM**: `.img` simulation output, identified by a plausible fixed header

use std::path::Path;

use crate::error::FormatError;

use super::img::{ImgHeader, FIXED_HEADER_SIZE};
use super::tiff::{ByteOrder, TIFF_HEADER_SIZE};

// =============================================================================
// FileFormat
// =============================================================================

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TIFF or BigTIFF
    Tiff,

    /// QSTEM `.img`
    QstemImg,
}

impl FileFormat {
    /// Get a human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            FileFormat::Tiff => "TIFF",
            FileFormat::QstemImg => "QSTEM",
        }
    }

    /// Format implied by a file extension (case-insensitive, without the dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "tif" | "tiff" => Some(FileFormat::Tiff),
            "img" => Some(FileFormat::QstemImg),
            _ => None,
        }
    }

    /// Format implied by a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

// =============================================================================
// Format Detection
// =============================================================================

/// Detect the format of a file from its leading bytes.
///
/// # Returns
/// * `Ok(FileFormat)` - The detected format
/// * `Err(FormatError::UnsupportedFormat)` - File is not a recognized format
///
/// # Format Detection Logic
///
/// 1. TIFF/BigTIFF magic and version
/// 2. A QSTEM header whose sizes and sample type are consistent
pub fn detect_format(bytes: &[u8]) -> Result<FileFormat, FormatError> {
    if is_tiff_header(bytes) {
        return Ok(FileFormat::Tiff);
    }
    if is_img_header(bytes) {
        return Ok(FileFormat::QstemImg);
    }
    Err(FormatError::UnsupportedFormat {
        reason: format!(
            "unrecognized file signature {:02X?}",
            &bytes[..bytes.len().min(4)]
        ),
    })
}

/// Check if bytes start with a plausible QSTEM header.
///
/// QSTEM has no magic number, so this checks that the fixed header parses,
/// declares its own size correctly and names a known sample type.
pub fn is_img_header(bytes: &[u8]) -> bool {
    match ImgHeader::parse(bytes) {
        Ok(header) => header.header_size as usize == FIXED_HEADER_SIZE && header.dtype().is_ok(),
        Err(_) => false,
    }
}

/// Check if bytes represent a valid TIFF header.
///
/// This is a quick check that can be used before attempting full parsing.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    if bytes.len() < TIFF_HEADER_SIZE {
        return false;
    }

    // Check magic bytes
    let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
    if magic != 0x4949 && magic != 0x4D4D {
        return false;
    }

    // Check version
    let byte_order = if magic == 0x4949 {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    };

    let version = byte_order.read_u16(&bytes[2..4]);
    version == 42 || version == 43
}

// =============================================================================
// Tests
// =============================================================================
