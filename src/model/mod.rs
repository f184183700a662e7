//! In-memory data model.
//!
//! A [`LogicalArray`] is a pixel buffer plus the axis structure that gives it
//! meaning: which axes are a sequence, which index a collection of related
//! measurements, and which span the measured datum itself. Axes are always
//! stored in the logical order `(sequence?)(collection...)(datum...)`.

mod axis;
mod calibration;
mod logical;
mod pixels;

pub use axis::{AxisDescriptor, AxisRole, MAX_COLLECTION_AXES, MAX_DATUM_AXES};
pub use calibration::{normalize_unit, Calibration};
pub use logical::LogicalArray;
pub use pixels::{DataType, PixelData};

/// Number of slots in the container's fixed `TZCYXS` axis model.
pub const CONTAINER_SLOTS: usize = 6;

/// Axis sizes in the container's fixed `TZCYXS` order.
///
/// Unused slots have size 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerShape(pub [usize; CONTAINER_SLOTS]);

impl ContainerShape {
    pub const T: usize = 0;
    pub const Z: usize = 1;
    pub const C: usize = 2;
    pub const Y: usize = 3;
    pub const X: usize = 4;
    pub const S: usize = 5;

    pub fn ones() -> Self {
        Self([1; CONTAINER_SLOTS])
    }

    pub fn frames(&self) -> usize {
        self.0[Self::T]
    }

    pub fn slices(&self) -> usize {
        self.0[Self::Z]
    }

    pub fn channels(&self) -> usize {
        self.0[Self::C]
    }

    pub fn height(&self) -> usize {
        self.0[Self::Y]
    }

    pub fn width(&self) -> usize {
        self.0[Self::X]
    }

    /// Number of 2D planes (`T * Z * C`).
    pub fn page_count(&self) -> usize {
        self.frames() * self.slices() * self.channels()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Default for ContainerShape {
    fn default() -> Self {
        Self::ones()
    }
}
