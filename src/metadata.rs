//! Embedded metadata blob.
//!
//! The blob is a compact JSON object stored in the container's description
//! under the `nion_swift` key. It carries what the container's own tags cannot
//! express: axis roles, per-axis calibrations with offsets, the intensity
//! calibration, the acquisition timestamp and free-form properties.
//!
//! ```json
//! {"spatial_calibrations":[{"offset":0.0,"scale":1.0,"units":""}],
//!  "intensity_calibration":{"offset":0.0,"scale":1.0,"units":""},
//!  "is_sequence":true,"collection_dimension_count":0,"datum_dimension_count":2,
//!  "properties":{},"timestamp":1700000000.0}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::model::{AxisDescriptor, Calibration, LogicalArray};

/// Decoded contents of an embedded metadata blob.
///
/// Every field is optional on decode so that blobs written by other tools
/// with a subset of the keys are still accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_calibrations: Option<Vec<Calibration>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_calibration: Option<Calibration>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_sequence: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_dimension_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum_dimension_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl MetadataSummary {
    /// Summarize an array's metadata.
    pub fn from_array(array: &LogicalArray) -> Self {
        let descriptor = array.descriptor();
        Self {
            spatial_calibrations: array.calibrations().map(<[_]>::to_vec),
            intensity_calibration: Some(array.intensity_calibration().clone()),
            is_sequence: descriptor.is_some_and(|d| d.is_sequence()),
            collection_dimension_count: descriptor.map(|d| d.collection_axis_count()),
            datum_dimension_count: descriptor.map(|d| d.datum_axis_count()),
            properties: array.properties().clone(),
            timestamp: array.timestamp().map(timestamp_to_seconds),
        }
    }

    /// The axis descriptor the blob declares, if it declares one.
    ///
    /// A blob that names only one of the two counts takes the default for the
    /// other (no collection axes, one datum axis).
    pub fn descriptor(&self) -> Result<Option<AxisDescriptor>, DecodeError> {
        if self.collection_dimension_count.is_none() && self.datum_dimension_count.is_none() {
            return Ok(None);
        }
        let collection = self.collection_dimension_count.unwrap_or(0);
        let datum = self.datum_dimension_count.unwrap_or(1);
        AxisDescriptor::new(self.is_sequence, collection, datum)
            .map(Some)
            .map_err(|_| DecodeError::InvalidAxisCounts { collection, datum })
    }

    /// The timestamp as a UTC date-time.
    pub fn datetime(&self) -> Result<Option<DateTime<Utc>>, DecodeError> {
        self.timestamp.map(seconds_to_timestamp).transpose()
    }
}

/// Serialize a summary to its compact JSON form.
///
/// Key order is fixed by the struct and property keys are sorted, so equal
/// summaries always produce identical text.
pub fn encode(summary: &MetadataSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string(summary)
}

/// Parse and validate a blob.
pub fn decode(text: &str) -> Result<MetadataSummary, DecodeError> {
    let summary: MetadataSummary = serde_json::from_str(text)?;
    // Surface invalid counts and timestamps here rather than at first use
    summary.descriptor()?;
    summary.datetime()?;
    Ok(summary)
}

fn timestamp_to_seconds(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp_micros() as f64 / 1e6
}

fn seconds_to_timestamp(seconds: f64) -> Result<DateTime<Utc>, DecodeError> {
    if !seconds.is_finite() {
        return Err(DecodeError::InvalidTimestamp(seconds));
    }
    let micros = (seconds * 1e6).round();
    if micros.abs() >= i64::MAX as f64 {
        return Err(DecodeError::InvalidTimestamp(seconds));
    }
    let micros = micros as i64;
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos).ok_or(DecodeError::InvalidTimestamp(seconds))
}
