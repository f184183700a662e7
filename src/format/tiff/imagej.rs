//! ImageJ hyperstack descriptions.
//!
//! ImageJ stores its hyperstack layout in the first page's ImageDescription
//! as newline-separated `key=value` lines, starting with `ImageJ=<version>`:
//!
//! ```text
//! ImageJ=1.11a
//! images=24
//! channels=2
//! slices=3
//! frames=4
//! hyperstack=true
//! mode=grayscale
//! unit=nm
//! loop=false
//! nion_swift={...}
//! ```
//!
//! Counts describe the `T`, `Z` and `C` slots; pages are ordered with `C`
//! varying fastest, then `Z`, then `T`.

use serde_json::Value;

/// Key under which the embedded metadata blob is stored.
pub const BLOB_KEY: &str = "nion_swift";

/// Parsed (or to-be-written) ImageJ description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageJDescription {
    /// Version string from the `ImageJ=` line
    pub version: String,

    /// Total number of pages
    pub images: Option<usize>,

    /// Size of the `C` slot
    pub channels: Option<usize>,

    /// Size of the `Z` slot
    pub slices: Option<usize>,

    /// Size of the `T` slot
    pub frames: Option<usize>,

    /// Whether the file declares itself a hyperstack
    pub hyperstack: bool,

    /// Physical unit of the resolution tags
    pub unit: Option<String>,

    /// Embedded metadata blob
    pub blob: Option<String>,
}

impl ImageJDescription {
    /// Parse a description; `None` if it is not an ImageJ description.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_end_matches('\0');
        let mut lines = text.lines();
        let version = lines.next()?.trim().strip_prefix("ImageJ=")?.to_string();

        let mut desc = ImageJDescription {
            version,
            ..Default::default()
        };

        for line in lines {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            match key {
                "images" => desc.images = parse_count(value),
                "channels" => desc.channels = parse_count(value),
                "slices" => desc.slices = parse_count(value),
                "frames" => desc.frames = parse_count(value),
                "hyperstack" => desc.hyperstack = value.trim() == "true",
                "unit" => desc.unit = Some(unescape_non_ascii(value.trim())),
                BLOB_KEY => desc.blob = Some(value.to_string()),
                _ => {}
            }
        }

        Some(desc)
    }

    /// Whether any axis-count hint is present.
    pub fn has_axis_hints(&self) -> bool {
        self.images.is_some()
            || self.channels.is_some()
            || self.slices.is_some()
            || self.frames.is_some()
    }

    /// Render the description in ImageJ's line format.
    ///
    /// The result is plain ASCII: micrometres are written as ImageJ's
    /// `micron` and any other non-ASCII character as a `\uXXXX` escape,
    /// which the blob's JSON decodes natively. The blob must not contain a
    /// newline; compact JSON never does.
    pub fn build(&self) -> String {
        let mut out = format!("ImageJ={}\n", self.version);
        let mut push = |key: &str, value: &dyn std::fmt::Display| {
            out.push_str(key);
            out.push('=');
            out.push_str(&value.to_string());
            out.push('\n');
        };

        if let Some(images) = self.images {
            push("images", &images);
        }
        if let Some(channels) = self.channels {
            push("channels", &channels);
        }
        if let Some(slices) = self.slices {
            push("slices", &slices);
        }
        if let Some(frames) = self.frames {
            push("frames", &frames);
        }
        if self.hyperstack {
            push("hyperstack", &"true");
        }
        push("mode", &"grayscale");
        if let Some(unit) = &self.unit {
            let unit = if unit == "\u{00B5}m" { "micron" } else { unit.as_str() };
            push("unit", &unit);
        }
        push("loop", &"false");
        if let Some(blob) = &self.blob {
            push(BLOB_KEY, blob);
        }
        escape_non_ascii(&out)
    }
}

fn parse_count(value: &str) -> Option<usize> {
    value.trim().parse().ok()
}

/// Replace characters a TIFF ASCII field cannot hold (non-ASCII and NUL)
/// with `\uXXXX` escapes of their UTF-16 code units.
pub fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for c in text.chars() {
        if c.is_ascii() && c != '\0' {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

/// Inverse of [`escape_non_ascii`]. Malformed escapes are kept as text.
fn unescape_non_ascii(text: &str) -> String {
    if !text.contains("\\u") {
        return text.to_string();
    }
    let mut units = Vec::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let escaped = rest
            .strip_prefix("\\u")
            .and_then(|r| r.get(..4))
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u16::from_str_radix(hex, 16).ok());
        match escaped {
            Some(unit) => {
                units.push(unit);
                rest = &rest[6..];
            }
            None => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(c.encode_utf16(&mut buf));
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Find the embedded blob in a description that is not ImageJ-formatted.
///
/// Files written without ImageJ mode carry their metadata as a JSON object
/// description; the blob is either a string or a nested object under
/// [`BLOB_KEY`].
pub fn blob_from_json_description(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text.trim_end_matches('\0')).ok()?;
    match value.get(BLOB_KEY)? {
        Value::String(blob) => Some(blob.clone()),
        Value::Object(_) => value.get(BLOB_KEY).map(Value::to_string),
        _ => None,
    }
}
