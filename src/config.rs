//! Configuration for the I/O handlers.
//!
//! The host passes configuration as JSON when it loads the extension. Every
//! field is optional and falls back to the defaults below.
//!
//! # Example
//!
//! ```
//! use hyperstack_io::config::Config;
//!
//! let config: Config = serde_json::from_str(r#"{"embed_metadata": false}"#).unwrap();
//! assert!(!config.embed_metadata);
//! assert_eq!(config.imagej_version, "1.11a");
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

// =============================================================================
// Default Values
// =============================================================================

/// Default value of the TIFF Software tag.
pub const DEFAULT_SOFTWARE: &str = "hyperstack-io";

/// ImageJ version written on the first line of the description.
pub const DEFAULT_IMAGEJ_VERSION: &str = "1.11a";

/// Default limit on the ImageDescription length in bytes (1 MiB).
pub const DEFAULT_MAX_DESCRIPTION_BYTES: usize = 1024 * 1024;

/// Smallest accepted description limit; the ImageJ keys alone need this much.
pub const MIN_DESCRIPTION_BYTES: usize = 64;

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // =========================================================================
    // Writer Configuration
    // =========================================================================
    /// Value of the Software tag on the first page.
    pub software: String,

    /// Version string after `ImageJ=` in the description.
    pub imagej_version: String,

    /// Longest ImageDescription the encoder will write, including the NUL.
    ///
    /// A description over the limit fails the first write attempt, and the
    /// file is then written again without the metadata blob.
    pub max_description_bytes: usize,

    /// Embed the metadata blob in written files.
    pub embed_metadata: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            software: DEFAULT_SOFTWARE.to_string(),
            imagej_version: DEFAULT_IMAGEJ_VERSION.to_string(),
            max_description_bytes: DEFAULT_MAX_DESCRIPTION_BYTES,
            embed_metadata: true,
            verbose: false,
        }
    }
}

impl Config {
    /// Parse a JSON configuration string.
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid configuration: {e}"))
    }

    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.imagej_version.is_empty() {
            return Err("imagej_version must not be empty".to_string());
        }
        if self.imagej_version.contains('\n') || self.software.contains('\n') {
            return Err("imagej_version and software must be single lines".to_string());
        }
        if self.software.contains('\0') {
            return Err("software must not contain NUL bytes".to_string());
        }
        if self.max_description_bytes < MIN_DESCRIPTION_BYTES {
            return Err(format!(
                "max_description_bytes must be at least {MIN_DESCRIPTION_BYTES}"
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
