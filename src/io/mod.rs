//! Byte-level access to loaded files.
//!
//! Every read or write operates on one file that is fully loaded into memory
//! for the duration of the call. [`RangeReader`] gives the TIFF parser
//! bounds-checked access to byte ranges of that buffer.

mod range_reader;

pub use range_reader::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le, MemoryReader,
    RangeReader,
};
