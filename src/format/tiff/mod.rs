//! TIFF codec for ImageJ hyperstacks.
//!
//! This module handles parsing of TIFF and BigTIFF files into grayscale page
//! stacks, and writing page stacks back out as classic TIFF with an ImageJ
//! hyperstack description.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values must be read respecting this order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets (max 4GB files),
//!   while BigTIFF uses 64-bit offsets. The reader handles both transparently; the
//!   writer only produces classic TIFF, which is what ImageJ expects.
//!
//! - **IFD (Image File Directory)**: Contains metadata and pointers to image data.
//!   A hyperstack has one IFD per 2D plane, ordered with channels varying fastest,
//!   then slices, then frames.
//!
//! - **ImageJ description**: The first page's ImageDescription carries the
//!   channel/slice/frame counts, the physical unit and the embedded metadata blob.

mod imagej;
mod parser;
mod reader;
mod tags;
mod values;
mod writer;

pub use imagej::{blob_from_json_description, ImageJDescription, BLOB_KEY};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use reader::{read_stack, PageGeometry, TiffFile, TiffStack};
pub use tags::{Compression, FieldType, ResolutionUnit, SampleFormat, TiffTag};
pub use values::{Rational, ValueReader};
pub use writer::HyperstackEncoder;
