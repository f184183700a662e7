//! Reading grayscale page stacks from TIFF files.
//!
//! A hyperstack is stored as a flat list of 2D pages. This module walks the
//! IFD chain, decodes every uncompressed strip-organized page that shares the
//! first page's geometry and sample type, and stacks them into a
//! `(pages, height, width)` array. Interpreting the page axis is left to the
//! caller.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::TiffError;
use crate::format::samples::decode_samples;
use crate::io::RangeReader;
use crate::model::{DataType, PixelData};

use super::parser::{Ifd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::tags::{Compression, ResolutionUnit, SampleFormat, TiffTag};
use super::values::{Rational, ValueReader};

// =============================================================================
// Constants
// =============================================================================

/// Maximum number of IFDs to parse (safety limit)
const MAX_IFDS: usize = 1 << 20;

/// NewSubfileType bit marking a reduced-resolution copy
const REDUCED_RESOLUTION: u32 = 1;

// =============================================================================
// Page
// =============================================================================

/// Geometry and sample layout of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    pub dtype: DataType,
}

impl PageGeometry {
    fn from_ifd(ifd: &Ifd, header: &TiffHeader) -> Result<Self, TiffError> {
        let byte_order = header.byte_order;

        if ifd.is_tiled() {
            return Err(TiffError::TileOrganization);
        }

        let compression = ifd.compression(byte_order);
        match Compression::from_u16(compression) {
            Some(c) if c.is_supported() => {}
            Some(c) => return Err(TiffError::UnsupportedCompression(c.name().to_string())),
            None => return Err(TiffError::UnsupportedCompression(compression.to_string())),
        }

        let width = ifd
            .image_width(byte_order)
            .ok_or(TiffError::MissingTag(TiffTag::ImageWidth.name()))?;
        let height = ifd
            .image_height(byte_order)
            .ok_or(TiffError::MissingTag(TiffTag::ImageLength.name()))?;

        let bits_per_sample = ifd.bits_per_sample(byte_order);
        let sample_format = ifd.sample_format(byte_order);
        let samples_per_pixel = ifd.samples_per_pixel(byte_order);
        let unsupported = TiffError::UnsupportedSampleLayout {
            bits_per_sample,
            sample_format,
            samples_per_pixel,
        };
        if samples_per_pixel != 1 {
            return Err(unsupported);
        }

        let dtype = match (SampleFormat::from_u16(sample_format), bits_per_sample) {
            (Some(SampleFormat::Unsigned), 8) => DataType::UInt8,
            (Some(SampleFormat::Unsigned), 16) => DataType::UInt16,
            (Some(SampleFormat::Unsigned), 32) => DataType::UInt32,
            (Some(SampleFormat::Signed), 8) => DataType::Int8,
            (Some(SampleFormat::Signed), 16) => DataType::Int16,
            (Some(SampleFormat::Signed), 32) => DataType::Int32,
            (Some(SampleFormat::Float), 32) => DataType::Float32,
            (Some(SampleFormat::Float), 64) => DataType::Float64,
            _ => return Err(unsupported),
        };

        Ok(PageGeometry {
            width,
            height,
            dtype,
        })
    }

    /// Bytes needed for one page, `None` on overflow.
    pub fn byte_len(&self) -> Option<u64> {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))?
            .checked_mul(self.dtype.size_in_bytes() as u64)
    }
}

// =============================================================================
// TiffStack
// =============================================================================

/// Pixels and tags read from a TIFF file.
#[derive(Debug, Clone, PartialEq)]
pub struct TiffStack {
    /// Stacked pages with shape `(pages, height, width)`
    pub pixels: PixelData,

    /// ImageDescription of the first page
    pub description: Option<String>,

    pub x_resolution: Option<Rational>,
    pub y_resolution: Option<Rational>,
    pub resolution_unit: ResolutionUnit,
}

impl TiffStack {
    pub fn page_count(&self) -> usize {
        self.pixels.shape()[0]
    }

    pub fn height(&self) -> usize {
        self.pixels.shape()[1]
    }

    pub fn width(&self) -> usize {
        self.pixels.shape()[2]
    }
}

// =============================================================================
// TiffFile
// =============================================================================

/// A parsed TIFF file: the header and every IFD in chain order.
#[derive(Debug, Clone)]
pub struct TiffFile {
    pub header: TiffHeader,
    pub ifds: Vec<Ifd>,
}

impl TiffFile {
    /// Parse the header and walk the IFD chain.
    pub fn parse<R: RangeReader>(reader: &R) -> Result<Self, TiffError> {
        let header_len = (BIGTIFF_HEADER_SIZE as u64).min(reader.size()) as usize;
        let header_bytes = reader.read_exact_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, reader.size())?;

        let ifds = Self::parse_all_ifds(reader, &header)?;
        if ifds.is_empty() {
            return Err(TiffError::NoPages);
        }
        debug!(pages = ifds.len(), bigtiff = header.is_bigtiff, "Parsed TIFF structure");

        Ok(TiffFile { header, ifds })
    }

    /// Parse all IFDs in the file following the next-IFD chain.
    fn parse_all_ifds<R: RangeReader>(
        reader: &R,
        header: &TiffHeader,
    ) -> Result<Vec<Ifd>, TiffError> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 && ifds.len() < MAX_IFDS {
            if !visited.insert(offset) {
                warn!(offset, "IFD chain loops back on itself, stopping");
                break;
            }
            let ifd = Ifd::read(reader, offset, header)?;
            offset = ifd.next_ifd_offset;
            ifds.push(ifd);
        }

        Ok(ifds)
    }

    /// Read the first page's ImageDescription.
    pub fn description<R: RangeReader>(&self, reader: &R) -> Result<Option<String>, TiffError> {
        let values = ValueReader::new(reader, &self.header);
        self.ifds[0]
            .get_entry_by_tag(TiffTag::ImageDescription)
            .map(|entry| values.read_string(entry))
            .transpose()
    }

    /// Read the first page's resolution tags.
    ///
    /// Malformed resolution entries are treated as absent.
    pub fn resolution<R: RangeReader>(
        &self,
        reader: &R,
    ) -> (Option<Rational>, Option<Rational>, ResolutionUnit) {
        let values = ValueReader::new(reader, &self.header);
        let ifd = &self.ifds[0];
        let read = |tag: TiffTag| {
            ifd.get_entry_by_tag(tag)
                .and_then(|entry| values.read_rational(entry).ok())
        };
        let unit = ifd
            .get_u32(TiffTag::ResolutionUnit, self.header.byte_order)
            .and_then(|v| ResolutionUnit::from_u16(v as u16))
            .unwrap_or_default();
        (read(TiffTag::XResolution), read(TiffTag::YResolution), unit)
    }

    /// Read the raw bytes of one page by concatenating its strips.
    fn read_page_bytes<R: RangeReader>(
        &self,
        reader: &R,
        ifd: &Ifd,
        needed: usize,
    ) -> Result<Vec<u8>, TiffError> {
        let values = ValueReader::new(reader, &self.header);
        let offsets_entry = ifd
            .get_entry_by_tag(TiffTag::StripOffsets)
            .ok_or(TiffError::MissingTag(TiffTag::StripOffsets.name()))?;
        let offsets = values.read_u64_array(offsets_entry)?;

        let counts = match ifd.get_entry_by_tag(TiffTag::StripByteCounts) {
            Some(entry) => values.read_u64_array(entry)?,
            // Some writers omit byte counts for a single strip
            None if offsets.len() == 1 => vec![needed as u64],
            None => return Err(TiffError::MissingTag(TiffTag::StripByteCounts.name())),
        };

        if offsets.len() != counts.len() {
            return Err(TiffError::InvalidTagValue {
                tag: TiffTag::StripByteCounts.name(),
                message: format!(
                    "{} strip offsets but {} byte counts",
                    offsets.len(),
                    counts.len()
                ),
            });
        }

        let mut data = Vec::with_capacity(needed);
        for (&offset, &count) in offsets.iter().zip(&counts) {
            if data.len() >= needed {
                break;
            }
            let len = (count as usize).min(needed - data.len());
            data.extend_from_slice(&reader.read_exact_at(offset, len)?);
        }

        if data.len() < needed {
            return Err(TiffError::InvalidTagValue {
                tag: TiffTag::StripByteCounts.name(),
                message: format!("strips hold {} bytes, page needs {}", data.len(), needed),
            });
        }

        Ok(data)
    }

    /// Decode every page that matches the first page and stack them.
    pub fn read_stack<R: RangeReader>(&self, reader: &R) -> Result<TiffStack, TiffError> {
        let byte_order = self.header.byte_order;
        let first = PageGeometry::from_ifd(&self.ifds[0], &self.header)?;

        // Uncompressed pixels cannot outgrow the file they are stored in
        let available = reader.size();
        let page_len = first
            .byte_len()
            .filter(|&n| n <= available)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(TiffError::PixelDataTooLarge {
                needed: first.byte_len().unwrap_or(u64::MAX),
                available,
            })?;

        let mut data = Vec::with_capacity(page_len);
        let mut pages = 0usize;
        for (index, ifd) in self.ifds.iter().enumerate() {
            let subfile_type = ifd.get_u32(TiffTag::NewSubfileType, byte_order).unwrap_or(0);
            if subfile_type & REDUCED_RESOLUTION != 0 {
                debug!(index, "Skipping reduced-resolution page");
                continue;
            }
            match PageGeometry::from_ifd(ifd, &self.header) {
                Ok(geometry) if geometry == first => {}
                Ok(geometry) => {
                    debug!(index, ?geometry, "Skipping page with different geometry");
                    continue;
                }
                Err(e) => {
                    debug!(index, error = %e, "Skipping unreadable page");
                    continue;
                }
            }
            if (data.len() + page_len) as u64 > available {
                return Err(TiffError::PixelDataTooLarge {
                    needed: (page_len as u64).saturating_mul(pages as u64 + 1),
                    available,
                });
            }
            data.extend(self.read_page_bytes(reader, ifd, page_len)?);
            pages += 1;
        }

        let shape = [pages, first.height as usize, first.width as usize];
        let pixels = decode_samples(first.dtype, &shape, &data, byte_order).map_err(|e| {
            TiffError::InvalidTagValue {
                tag: TiffTag::StripOffsets.name(),
                message: e.to_string(),
            }
        })?;

        let (x_resolution, y_resolution, resolution_unit) = self.resolution(reader);
        Ok(TiffStack {
            pixels,
            description: self.description(reader)?,
            x_resolution,
            y_resolution,
            resolution_unit,
        })
    }
}

/// Parse a TIFF file and read its page stack.
pub fn read_stack<R: RangeReader>(reader: &R) -> Result<TiffStack, TiffError> {
    TiffFile::parse(reader)?.read_stack(reader)
}
