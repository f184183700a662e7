//! Test utilities for integration tests.
//!
//! This module provides builders for hand-made TIFF and QSTEM files and
//! helpers for creating annotated arrays.

use ndarray::{ArrayD, IxDyn};

use hyperstack_io::{AxisDescriptor, Calibration, LogicalArray};

// =============================================================================
// Array Helpers
// =============================================================================

/// An f32 array whose values are their own row-major index.
pub fn iota(shape: &[usize]) -> ArrayD<f32> {
    let n = shape.iter().product::<usize>();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|v| v as f32).collect()).unwrap()
}

/// An iota array with a descriptor and one distinct calibration per axis.
pub fn annotated(shape: &[usize], is_sequence: bool, collection: usize, datum: usize) -> LogicalArray {
    let calibrations = (0..shape.len())
        .map(|axis| Calibration::new(axis as f64, 0.25 * (axis + 1) as f64, format!("u{axis}")))
        .collect();
    LogicalArray::new(iota(shape))
        .with_descriptor(AxisDescriptor::new(is_sequence, collection, datum).unwrap())
        .unwrap()
        .with_calibrations(calibrations)
        .unwrap()
}

/// Every descriptor the container can hold, with a shape whose sizes are all
/// distinct and greater than one.
pub fn representable_layouts() -> Vec<(Vec<usize>, AxisDescriptor)> {
    let sizes = [3, 4, 5, 6];
    let mut layouts = Vec::new();
    for is_sequence in [false, true] {
        for collection in 0..=2 {
            for datum in 1..=2 {
                let descriptor = AxisDescriptor::new(is_sequence, collection, datum).unwrap();
                let n = descriptor.axis_count();
                if n > 4 || (is_sequence && collection == 2) {
                    continue;
                }
                layouts.push((sizes[..n].to_vec(), descriptor));
            }
        }
    }
    layouts
}

// =============================================================================
// TIFF File Builders
// =============================================================================

/// Builder for creating test TIFF files with strip-organized pages.
pub struct TiffBuilder {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
    ifds: Vec<IfdBuilder>,
}

#[derive(Clone, Copy)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            is_bigtiff: false,
            ifds: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_bigtiff(mut self, is_bigtiff: bool) -> Self {
        self.is_bigtiff = is_bigtiff;
        self
    }

    pub fn add_ifd(mut self, ifd: IfdBuilder) -> Self {
        self.ifds.push(ifd);
        self
    }

    /// Build the TIFF file data.
    ///
    /// Each page is written as its strip, then its out-of-line values, then
    /// its IFD.
    pub fn build(self) -> Vec<u8> {
        let order = self.byte_order;
        let offset_size = if self.is_bigtiff { 8 } else { 4 };
        let mut data = Vec::new();

        match order {
            ByteOrderType::LittleEndian => data.extend(b"II"),
            ByteOrderType::BigEndian => data.extend(b"MM"),
        }
        if self.is_bigtiff {
            write_value(&mut data, order, 43, 2);
            write_value(&mut data, order, 8, 2);
            write_value(&mut data, order, 0, 2);
        } else {
            write_value(&mut data, order, 42, 2);
        }
        let mut pointer = data.len();
        write_value(&mut data, order, 0, offset_size);

        for ifd in &self.ifds {
            let strip_offset = data.len() as u64;
            for &sample in &ifd.samples {
                write_value(&mut data, order, sample as u64, 2);
            }

            let mut entries: Vec<(u16, u16, u64, Vec<u8>)> = ifd
                .entries
                .iter()
                .map(|e| {
                    let (field_type, count, bytes) = e.value.encode(order, strip_offset);
                    (e.tag, field_type, count, bytes)
                })
                .collect();
            entries.sort_by_key(|e| e.0);

            // Out-of-line values
            let mut fields = Vec::with_capacity(entries.len());
            for (_, _, _, bytes) in &entries {
                if bytes.len() <= offset_size {
                    let mut field = bytes.clone();
                    field.resize(offset_size, 0);
                    fields.push(field);
                } else {
                    if data.len() % 2 == 1 {
                        data.push(0);
                    }
                    let mut field = Vec::new();
                    write_value(&mut field, order, data.len() as u64, offset_size);
                    fields.push(field);
                    data.extend(bytes);
                }
            }

            if data.len() % 2 == 1 {
                data.push(0);
            }
            let ifd_offset = data.len() as u64;
            let mut patched = Vec::new();
            write_value(&mut patched, order, ifd_offset, offset_size);
            data[pointer..pointer + offset_size].copy_from_slice(&patched);

            if self.is_bigtiff {
                write_value(&mut data, order, entries.len() as u64, 8);
            } else {
                write_value(&mut data, order, entries.len() as u64, 2);
            }
            for ((tag, field_type, count, _), field) in entries.iter().zip(fields) {
                write_value(&mut data, order, *tag as u64, 2);
                write_value(&mut data, order, *field_type as u64, 2);
                write_value(&mut data, order, *count, offset_size);
                data.extend(field);
            }
            pointer = data.len();
            write_value(&mut data, order, 0, offset_size);
        }

        data
    }
}

impl Default for TiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tag value as written by [`TiffBuilder`].
enum EntryValue {
    Short(u16),
    Long(u32),
    Rational(u32, u32),
    Ascii(String),
    /// Offset of this page's strip, filled in during build
    StripOffset,
}

impl EntryValue {
    /// Field type, count and value bytes in file byte order.
    fn encode(&self, order: ByteOrderType, strip_offset: u64) -> (u16, u64, Vec<u8>) {
        let mut bytes = Vec::new();
        match self {
            EntryValue::Short(v) => {
                write_value(&mut bytes, order, *v as u64, 2);
                (3, 1, bytes)
            }
            EntryValue::Long(v) => {
                write_value(&mut bytes, order, *v as u64, 4);
                (4, 1, bytes)
            }
            EntryValue::Rational(n, d) => {
                write_value(&mut bytes, order, *n as u64, 4);
                write_value(&mut bytes, order, *d as u64, 4);
                (5, 1, bytes)
            }
            EntryValue::Ascii(s) => {
                bytes.extend(s.as_bytes());
                bytes.push(0);
                (2, bytes.len() as u64, bytes)
            }
            EntryValue::StripOffset => {
                write_value(&mut bytes, order, strip_offset, 4);
                (4, 1, bytes)
            }
        }
    }
}

struct IfdEntryBuilder {
    tag: u16,
    value: EntryValue,
}

/// Builder for one uncompressed 16-bit grayscale page.
pub struct IfdBuilder {
    entries: Vec<IfdEntryBuilder>,
    samples: Vec<u16>,
}

impl IfdBuilder {
    /// A single-strip page with the given row-major samples.
    pub fn strip_u16(width: u32, height: u32, samples: Vec<u16>) -> Self {
        assert_eq!(samples.len(), (width * height) as usize);
        let mut builder = Self {
            entries: Vec::new(),
            samples,
        };
        builder
            .add(256, EntryValue::Long(width)) // ImageWidth
            .add(257, EntryValue::Long(height)) // ImageLength
            .add(258, EntryValue::Short(16)) // BitsPerSample
            .add(259, EntryValue::Short(1)) // Compression = None
            .add(262, EntryValue::Short(1)) // PhotometricInterpretation = MinIsBlack
            .add(273, EntryValue::StripOffset) // StripOffsets
            .add(277, EntryValue::Short(1)) // SamplesPerPixel
            .add(278, EntryValue::Long(height)) // RowsPerStrip
            .add(279, EntryValue::Long(width * height * 2)); // StripByteCounts
        builder
    }

    fn add(&mut self, tag: u16, value: EntryValue) -> &mut Self {
        self.entries.retain(|e| e.tag != tag);
        self.entries.push(IfdEntryBuilder { tag, value });
        self
    }

    pub fn with_description(mut self, text: &str) -> Self {
        self.add(270, EntryValue::Ascii(text.to_string()));
        self
    }

    pub fn with_resolution(mut self, x: (u32, u32), y: (u32, u32), unit: u16) -> Self {
        self.add(282, EntryValue::Rational(x.0, x.1))
            .add(283, EntryValue::Rational(y.0, y.1))
            .add(296, EntryValue::Short(unit));
        self
    }

    pub fn with_compression(mut self, compression: u16) -> Self {
        self.add(259, EntryValue::Short(compression));
        self
    }

    pub fn with_tiles(mut self, tile_width: u32, tile_height: u32) -> Self {
        self.add(322, EntryValue::Long(tile_width))
            .add(323, EntryValue::Long(tile_height));
        self
    }

    /// Declare a page size that need not match the stored samples.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.add(256, EntryValue::Long(width))
            .add(257, EntryValue::Long(height))
            .add(278, EntryValue::Long(height));
        self
    }

    pub fn with_subfile_type(mut self, subfile_type: u32) -> Self {
        self.add(254, EntryValue::Long(subfile_type));
        self
    }
}

fn write_value(data: &mut Vec<u8>, order: ByteOrderType, value: u64, size: usize) {
    match (order, size) {
        (ByteOrderType::LittleEndian, 2) => data.extend((value as u16).to_le_bytes()),
        (ByteOrderType::LittleEndian, 4) => data.extend((value as u32).to_le_bytes()),
        (ByteOrderType::LittleEndian, _) => data.extend(value.to_le_bytes()),
        (ByteOrderType::BigEndian, 2) => data.extend((value as u16).to_be_bytes()),
        (ByteOrderType::BigEndian, 4) => data.extend((value as u32).to_be_bytes()),
        (ByteOrderType::BigEndian, _) => data.extend(value.to_be_bytes()),
    }
}

/// A stack of `pages` pages of `height x width` u16 samples counting up from 0.
pub fn counting_pages(pages: usize, height: u32, width: u32) -> Vec<IfdBuilder> {
    let page_len = (height * width) as usize;
    (0..pages)
        .map(|p| {
            let samples = (0..page_len).map(|i| (p * page_len + i) as u16).collect();
            IfdBuilder::strip_u16(width, height, samples)
        })
        .collect()
}

// =============================================================================
// QSTEM File Builder
// =============================================================================

/// Build a QSTEM file with f32 samples given in row-major `(ny, nx)` order.
pub fn create_img(nx: usize, ny: usize, dx: f64, dy: f64, comment: &str, row_major: &[f32]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in [56i32, 0, comment.len() as i32, nx as i32, ny as i32, 0, 4, 2] {
        out.extend(v.to_le_bytes());
    }
    for v in [5.0f64, dx, dy] {
        out.extend(v.to_le_bytes());
    }
    out.extend(comment.as_bytes());
    for x in 0..nx {
        for y in 0..ny {
            out.extend(row_major[y * nx + x].to_le_bytes());
        }
    }
    out
}

// =============================================================================
// Verification Helpers
// =============================================================================

/// Check if data starts with TIFF magic bytes.
pub fn is_tiff_magic(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }
    let le = data[0] == b'I' && data[1] == b'I' && data[2] == 42 && data[3] == 0;
    let be = data[0] == b'M' && data[1] == b'M' && data[2] == 0 && data[3] == 42;
    le || be
}
