//! # hyperstack-io
//!
//! Lossless axis-metadata round trips between N-dimensional scientific arrays
//! and ImageJ-style TIFF hyperstacks.
//!
//! A hyperstack stores every image as up to six axes in the fixed order
//! `TZCYXS`. Scientific arrays instead describe their axes by role: an
//! optional sequence axis, up to two collection axes (e.g. scan positions)
//! and one or two datum axes (the measured spectrum or image). This crate
//! packs role-annotated arrays into hyperstack slots on write, and recovers
//! the roles on read from an embedded metadata blob, from ImageJ's own axis
//! counters, or from the rank alone.
//!
//! ## Architecture
//!
//! - [`model`] - [`LogicalArray`], axis descriptors, calibrations, pixel buffers
//! - [`shape`] - the packer and the resolver
//! - [`metadata`] - the embedded JSON blob
//! - [`mod@format`] - TIFF codec, ImageJ description, QSTEM `.img` reader
//! - [`io`] - bounds-checked byte access for the parsers
//! - [`plugin`] - handlers, registry and host registration
//! - [`config`] - configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use hyperstack_io::{AxisDescriptor, Calibration, Config, Extension, LogicalArray};
//! use ndarray::{ArrayD, IxDyn};
//!
//! let extension = Extension::load(Config::default()).unwrap();
//!
//! // A 4x4 scan of 128-channel spectra
//! let array = LogicalArray::new(ArrayD::<f32>::zeros(IxDyn(&[4, 4, 128])))
//!     .with_descriptor(AxisDescriptor::new(false, 2, 1).unwrap())
//!     .unwrap()
//!     .with_calibrations(vec![
//!         Calibration::scaled(0.5, "nm"),
//!         Calibration::scaled(0.5, "nm"),
//!         Calibration::new(-20.0, 0.1, "eV"),
//!     ])
//!     .unwrap();
//!
//! extension.registry().write(&array, Path::new("scan.tif")).unwrap();
//! let resolved = extension.registry().read(Path::new("scan.tif")).unwrap();
//! assert_eq!(resolved.array, array);
//!
//! extension.close();
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod metadata;
pub mod model;
pub mod plugin;
pub mod shape;

// Re-export commonly used types
pub use config::Config;
pub use error::{
    ArrayError, CodecWriteError, DecodeError, FormatError, HandlerError, ImgError, IoError,
    ShapeMismatchError, TiffError, UnsupportedRankError, WriteError,
};
pub use format::tiff::{HyperstackEncoder, ImageJDescription, Rational};
pub use format::{detect_format, FileFormat, ImgFile};
pub use metadata::MetadataSummary;
pub use model::{
    AxisDescriptor, AxisRole, Calibration, ContainerShape, DataType, LogicalArray, PixelData,
};
pub use plugin::{Extension, HandlerRegistry, ImgIoHandler, IoHandler, TiffIoHandler};
pub use shape::{
    pack, resolve, write_with_retry, ContainerEncoder, Diagnostic, DiagnosticKind, PackedImage,
    RawImage, Resolved,
};
