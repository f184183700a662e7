//! File I/O handlers exposed to the host.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::HandlerError;
use crate::format::tiff::{read_stack, HyperstackEncoder};
use crate::format::ImgFile;
use crate::io::MemoryReader;
use crate::model::LogicalArray;
use crate::shape::{container_slots, effective_descriptor, resolve, write_with_retry, RawImage, Resolved};

// =============================================================================
// IoHandler Trait
// =============================================================================

/// A reader (and optionally writer) for one file format.
///
/// Handlers are stateless apart from their configuration; every call opens,
/// uses and closes its own file.
pub trait IoHandler: Send + Sync {
    /// Stable identifier the host registers the handler under.
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Lowercase extensions without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Read a file into a logical array.
    fn read(&self, path: &Path) -> Result<Resolved, HandlerError>;

    /// Whether `write` would accept this array for this extension.
    fn can_write(&self, array: &LogicalArray, extension: &str) -> bool;

    /// Write an array to `path`.
    ///
    /// Nothing is created at `path` when the array cannot be written.
    fn write(&self, array: &LogicalArray, path: &Path, extension: &str) -> Result<(), HandlerError>;

    /// Whether the handler claims this extension (case-insensitive).
    fn handles_extension(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

// =============================================================================
// TIFF
// =============================================================================

/// ImageJ hyperstack TIFF reader and writer.
#[derive(Debug, Clone)]
pub struct TiffIoHandler {
    encoder: HyperstackEncoder,
    embed_metadata: bool,
}

impl TiffIoHandler {
    pub const ID: &'static str = "tiff-io-handler";

    pub fn new(config: &Config) -> Self {
        Self {
            encoder: HyperstackEncoder::new(config),
            embed_metadata: config.embed_metadata,
        }
    }

    /// Resolve a TIFF file that is already in memory.
    pub fn read_bytes(&self, bytes: Vec<u8>) -> Result<Resolved, HandlerError> {
        let reader = MemoryReader::new(bytes);
        let stack = read_stack(&reader)?;
        Ok(resolve(RawImage::from_tiff_stack(stack)))
    }

    /// Encode an array without touching the filesystem.
    pub fn write_bytes(&self, array: &LogicalArray) -> Result<Vec<u8>, HandlerError> {
        Ok(write_with_retry(array, &self.encoder, self.embed_metadata)?)
    }
}

impl IoHandler for TiffIoHandler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "TIFF Files"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tif", "tiff"]
    }

    fn read(&self, path: &Path) -> Result<Resolved, HandlerError> {
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), size = bytes.len(), "Reading TIFF");
        let resolved = self.read_bytes(bytes)?;
        info!(
            path = %path.display(),
            shape = ?resolved.array.shape(),
            diagnostics = resolved.diagnostics.len(),
            "Read TIFF"
        );
        Ok(resolved)
    }

    fn can_write(&self, array: &LogicalArray, extension: &str) -> bool {
        self.handles_extension(extension)
            && effective_descriptor(array)
                .and_then(|d| container_slots(&d))
                .is_ok()
    }

    fn write(&self, array: &LogicalArray, path: &Path, extension: &str) -> Result<(), HandlerError> {
        if !self.handles_extension(extension) {
            return Err(HandlerError::NoHandler(format!(".{extension} in {}", Self::ID)));
        }
        // Encode fully before creating the file
        let bytes = self.write_bytes(array)?;
        fs::write(path, &bytes)?;
        info!(path = %path.display(), size = bytes.len(), "Wrote TIFF");
        Ok(())
    }
}

// =============================================================================
// QSTEM
// =============================================================================

/// Read-only QSTEM `.img` handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImgIoHandler;

impl ImgIoHandler {
    pub const ID: &'static str = "img-io-handler";
}

impl IoHandler for ImgIoHandler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "QSTEM Files"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["img"]
    }

    fn read(&self, path: &Path) -> Result<Resolved, HandlerError> {
        let bytes = fs::read(path)?;
        let array = ImgFile::parse(&bytes)?.into_logical_array();
        info!(path = %path.display(), shape = ?array.shape(), "Read QSTEM file");
        Ok(Resolved {
            array,
            diagnostics: Vec::new(),
        })
    }

    fn can_write(&self, _array: &LogicalArray, _extension: &str) -> bool {
        false
    }

    fn write(&self, _array: &LogicalArray, _path: &Path, _extension: &str) -> Result<(), HandlerError> {
        Err(HandlerError::WriteNotSupported(Self::ID))
    }
}
