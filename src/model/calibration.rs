use serde::{Deserialize, Serialize};

/// Affine mapping from pixel index to physical coordinate:
/// `physical = offset + scale * index`.
///
/// Serialized as `{offset, scale, units}`; missing keys take the identity values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub offset: f64,
    pub scale: f64,
    #[serde(rename = "units")]
    pub unit: String,
}

impl Calibration {
    pub fn new(offset: f64, scale: f64, unit: impl Into<String>) -> Self {
        Self {
            offset,
            scale,
            unit: unit.into(),
        }
    }

    /// `offset=0, scale=1`, no unit.
    pub fn identity() -> Self {
        Self::new(0.0, 1.0, "")
    }

    /// Calibration with only a scale and unit.
    pub fn scaled(scale: f64, unit: impl Into<String>) -> Self {
        Self::new(0.0, scale, unit)
    }

    pub fn is_identity(&self) -> bool {
        self.offset == 0.0 && self.scale == 1.0 && self.unit.is_empty()
    }

    /// Pixels per unit as written to a resolution tag; a zero scale maps to 1.
    pub fn resolution(&self) -> f64 {
        if self.scale == 0.0 {
            1.0
        } else {
            1.0 / self.scale
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}

/// Normalize the unit spellings ImageJ uses for micrometres.
pub fn normalize_unit(unit: &str) -> String {
    match unit {
        "micron" | "microns" | "um" | "\\u00B5m" | "\\u00b5m" | "\u{00B5}m" | "\u{03BC}m" => {
            "\u{00B5}m".to_string()
        }
        other => other.to_string(),
    }
}
