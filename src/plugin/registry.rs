//! Handler lookup by extension and file signature.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::HandlerError;
use crate::format::{detect_format, FileFormat};
use crate::model::LogicalArray;
use crate::shape::Resolved;

use super::handler::{ImgIoHandler, IoHandler, TiffIoHandler};

/// Bytes read from a file to identify it by signature.
const SIGNATURE_BYTES: u64 = 64;

/// The set of handlers registered with the host.
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn IoHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Registry with the TIFF and QSTEM handlers.
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TiffIoHandler::new(config)));
        registry.register(Box::new(ImgIoHandler));
        registry
    }

    /// Add a handler. A handler with the same id replaces the earlier one.
    pub fn register(&mut self, handler: Box<dyn IoHandler>) {
        self.handlers.retain(|h| h.id() != handler.id());
        debug!(id = handler.id(), extensions = ?handler.extensions(), "Registered handler");
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.id()).collect()
    }

    pub fn handler(&self, id: &str) -> Option<&dyn IoHandler> {
        self.handlers
            .iter()
            .find(|h| h.id() == id)
            .map(|h| h.as_ref())
    }

    pub fn handler_for_extension(&self, extension: &str) -> Option<&dyn IoHandler> {
        self.handlers
            .iter()
            .find(|h| h.handles_extension(extension))
            .map(|h| h.as_ref())
    }

    /// Handler for a file, by extension and then by the file's leading bytes.
    pub fn handler_for_path(&self, path: &Path) -> Result<&dyn IoHandler, HandlerError> {
        if let Some(handler) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.handler_for_extension(ext))
        {
            return Ok(handler);
        }

        let mut signature = Vec::new();
        File::open(path)?
            .take(SIGNATURE_BYTES)
            .read_to_end(&mut signature)?;
        let format = detect_format(&signature)?;
        debug!(path = %path.display(), format = format.name(), "Detected format from signature");

        let id = match format {
            FileFormat::Tiff => TiffIoHandler::ID,
            FileFormat::QstemImg => ImgIoHandler::ID,
        };
        self.handler(id)
            .ok_or_else(|| HandlerError::NoHandler(path.display().to_string()))
    }

    /// Read a file with whichever handler claims it.
    pub fn read(&self, path: &Path) -> Result<Resolved, HandlerError> {
        self.handler_for_path(path)?.read(path)
    }

    /// Write a file with the handler registered for its extension.
    pub fn write(&self, array: &LogicalArray, path: &Path) -> Result<(), HandlerError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| HandlerError::NoHandler(path.display().to_string()))?;
        let handler = self
            .handler_for_extension(extension)
            .ok_or_else(|| HandlerError::NoHandler(path.display().to_string()))?;
        handler.write(array, path, extension)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.ids())
            .finish()
    }
}
