//! File format readers and writers.
//!
//! # Format Detection
//!
//! Use [`detect::detect_format`] to identify a file from its leading bytes, or
//! [`FileFormat::from_extension`] when only the name is known. Currently
//! supported formats:
//!
//! - **TIFF**: ImageJ hyperstacks and plain grayscale page stacks (read/write)
//! - **QSTEM**: `.img` simulation output (read only)

pub mod detect;
pub mod img;
mod samples;
pub mod tiff;

pub use detect::{detect_format, is_img_header, is_tiff_header, FileFormat};
pub use img::{ImgFile, ImgHeader};
