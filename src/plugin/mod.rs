//! Host-facing plugin layer.
//!
//! - [`IoHandler`] - the interface the host calls to read and write files
//! - [`TiffIoHandler`] / [`ImgIoHandler`] - the two registered handlers
//! - [`HandlerRegistry`] - lookup by extension, with signature fallback
//! - [`Extension`] - explicit load and close

mod extension;
mod handler;
mod registry;

pub use extension::Extension;
pub use handler::{ImgIoHandler, IoHandler, TiffIoHandler};
pub use registry::HandlerRegistry;
