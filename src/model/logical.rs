use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ArrayError;

use super::axis::AxisDescriptor;
use super::calibration::Calibration;
use super::pixels::PixelData;

/// An N-dimensional array together with its axis structure and calibrations.
///
/// The descriptor, when present, always describes exactly `pixels.ndim()` axes,
/// and the calibration list, when present, has one entry per axis. Both are
/// enforced by the builder methods.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalArray {
    pixels: PixelData,
    descriptor: Option<AxisDescriptor>,
    calibrations: Option<Vec<Calibration>>,
    intensity_calibration: Calibration,
    timestamp: Option<DateTime<Utc>>,
    properties: Map<String, Value>,
}

impl LogicalArray {
    /// Wrap a pixel buffer with no axis metadata.
    pub fn new(pixels: impl Into<PixelData>) -> Self {
        Self {
            pixels: pixels.into(),
            descriptor: None,
            calibrations: None,
            intensity_calibration: Calibration::identity(),
            timestamp: None,
            properties: Map::new(),
        }
    }

    /// Attach an axis descriptor, which must describe every axis.
    pub fn with_descriptor(mut self, descriptor: AxisDescriptor) -> Result<Self, ArrayError> {
        if descriptor.axis_count() != self.pixels.ndim() {
            return Err(ArrayError::DescriptorMismatch {
                descriptor: descriptor.axis_count(),
                data: self.pixels.ndim(),
            });
        }
        self.descriptor = Some(descriptor);
        Ok(self)
    }

    /// Attach one calibration per axis.
    pub fn with_calibrations(mut self, calibrations: Vec<Calibration>) -> Result<Self, ArrayError> {
        if calibrations.len() != self.pixels.ndim() {
            return Err(ArrayError::CalibrationCount {
                expected: self.pixels.ndim(),
                actual: calibrations.len(),
            });
        }
        self.calibrations = Some(calibrations);
        Ok(self)
    }

    pub fn with_intensity_calibration(mut self, calibration: Calibration) -> Self {
        self.intensity_calibration = calibration;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Assemble an array from parts the resolver has already checked.
    pub(crate) fn from_parts(
        pixels: PixelData,
        descriptor: Option<AxisDescriptor>,
        calibrations: Option<Vec<Calibration>>,
        intensity_calibration: Calibration,
        timestamp: Option<DateTime<Utc>>,
        properties: Map<String, Value>,
    ) -> Self {
        debug_assert!(descriptor.map_or(true, |d| d.axis_count() == pixels.ndim()));
        debug_assert!(calibrations
            .as_ref()
            .map_or(true, |c| c.len() == pixels.ndim()));
        Self {
            pixels,
            descriptor,
            calibrations,
            intensity_calibration,
            timestamp,
            properties,
        }
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    pub fn into_pixels(self) -> PixelData {
        self.pixels
    }

    pub fn shape(&self) -> &[usize] {
        self.pixels.shape()
    }

    pub fn ndim(&self) -> usize {
        self.pixels.ndim()
    }

    pub fn descriptor(&self) -> Option<AxisDescriptor> {
        self.descriptor
    }

    pub fn calibrations(&self) -> Option<&[Calibration]> {
        self.calibrations.as_deref()
    }

    /// Calibration of axis `index`, identity when none are recorded.
    pub fn calibration(&self, index: usize) -> Calibration {
        self.calibrations
            .as_ref()
            .and_then(|c| c.get(index))
            .cloned()
            .unwrap_or_else(Calibration::identity)
    }

    pub fn intensity_calibration(&self) -> &Calibration {
        &self.intensity_calibration
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }
}
