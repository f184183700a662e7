//! Packing logical arrays into the container's `TZCYXS` slots.
//!
//! With a collection present, the collection axes take the image plane (`X`,
//! or `Y` and `X`) and the datum axes move to `C` (innermost) and `Z`, so a
//! scan of spectra or diffraction patterns shows up in ImageJ as a map with
//! one channel per datum index. Without a collection the datum axes are the
//! image plane. A sequence axis always goes to `T`.

use tracing::{debug, warn};

use crate::error::{CodecWriteError, UnsupportedRankError, WriteError};
use crate::format::tiff::Rational;
use crate::metadata::{self, MetadataSummary};
use crate::model::{AxisDescriptor, Calibration, ContainerShape, LogicalArray, PixelData};

/// Largest number of logical axes a container can hold.
pub const MAX_AXES: usize = 4;

/// A logical array laid out for the container.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedImage {
    pub shape: ContainerShape,
    /// Pixels with `shape` as their 6-D shape, in a container-native type
    pub pixels: PixelData,
    pub x_resolution: Rational,
    pub y_resolution: Rational,
    pub unit: String,
    pub embedded_blob: Option<String>,
}

impl PackedImage {
    /// The same image without its embedded blob.
    pub fn minimal(&self) -> Self {
        PackedImage {
            embedded_blob: None,
            ..self.clone()
        }
    }
}

/// Turns a [`PackedImage`] into file bytes.
pub trait ContainerEncoder {
    fn encode(&self, image: &PackedImage) -> Result<Vec<u8>, CodecWriteError>;
}

/// Descriptor used for writing: the array's own, or the default for its rank.
pub fn effective_descriptor(array: &LogicalArray) -> Result<AxisDescriptor, UnsupportedRankError> {
    if array.ndim() > MAX_AXES {
        return Err(UnsupportedRankError::TooManyAxes(array.ndim()));
    }
    array
        .descriptor()
        .or_else(|| AxisDescriptor::default_for_rank(array.ndim()))
        .ok_or(UnsupportedRankError::MissingDescriptor(array.ndim()))
}

/// Container slot of every logical axis.
pub fn container_slots(descriptor: &AxisDescriptor) -> Result<Vec<usize>, UnsupportedRankError> {
    if descriptor.axis_count() > MAX_AXES {
        return Err(UnsupportedRankError::TooManyAxes(descriptor.axis_count()));
    }
    if descriptor.is_sequence() && descriptor.collection_axis_count() == 2 {
        return Err(UnsupportedRankError::SequenceOfCollections);
    }

    let mut slots = Vec::with_capacity(descriptor.axis_count());
    if descriptor.is_sequence() {
        slots.push(ContainerShape::T);
    }
    match descriptor.collection_axis_count() {
        0 => {}
        1 => slots.push(ContainerShape::X),
        _ => slots.extend([ContainerShape::Y, ContainerShape::X]),
    }
    let datum_slots: &[usize] = match (descriptor.collection_axis_count(), descriptor.datum_axis_count()) {
        (0, 1) => &[ContainerShape::X],
        (0, _) => &[ContainerShape::Y, ContainerShape::X],
        (_, 1) => &[ContainerShape::C],
        (_, _) => &[ContainerShape::Z, ContainerShape::C],
    };
    slots.extend(datum_slots);
    Ok(slots)
}

/// Slots occupied by a descriptor in container order, and the axis
/// permutation taking logical order to that order.
pub fn native_axis_order(
    descriptor: &AxisDescriptor,
) -> Result<(Vec<usize>, Vec<usize>), UnsupportedRankError> {
    let slots = container_slots(descriptor)?;
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by_key(|&axis| slots[axis]);
    let native_slots = order.iter().map(|&axis| slots[axis]).collect();
    Ok((native_slots, order))
}

/// Inverse of a permutation.
pub(crate) fn invert_permutation(order: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; order.len()];
    for (position, &axis) in order.iter().enumerate() {
        inverse[axis] = position;
    }
    inverse
}

/// Lay out an array for the container.
///
/// Arrays with more than four axes, or a sequence of 2D collections, have no
/// slot mapping and are rejected before anything is written.
pub fn pack(array: &LogicalArray, include_blob: bool) -> Result<PackedImage, UnsupportedRankError> {
    let descriptor = effective_descriptor(array)?;
    let slots = container_slots(&descriptor)?;
    let (_, order) = native_axis_order(&descriptor)?;

    let mut shape = ContainerShape::ones();
    for (axis, &slot) in slots.iter().enumerate() {
        shape.0[slot] = array.shape()[axis];
    }

    let source = array.pixels();
    if source.dtype().is_complex() {
        warn!(dtype = %source.dtype(), "Discarding imaginary part, container stores real samples only");
    }
    let pixels = source.to_container_native().permuted(&order);
    let pixels = match pixels.reshaped(shape.as_slice()) {
        Ok(pixels) => pixels,
        // The slot shape holds every axis once, so the element count matches
        Err(_) => return Err(UnsupportedRankError::TooManyAxes(array.ndim())),
    };

    let calibration_in = |slot: usize| {
        slots
            .iter()
            .position(|&s| s == slot)
            .map(|axis| array.calibration(axis))
    };
    let x_calibration = calibration_in(ContainerShape::X).unwrap_or_else(Calibration::identity);
    let y_calibration = calibration_in(ContainerShape::Y);

    let x_resolution = to_rational(x_calibration.resolution());
    let y_resolution = y_calibration.map_or(Rational::ONE, |c| to_rational(c.resolution()));

    let embedded_blob = if include_blob {
        encode_blob(array, &descriptor)
    } else {
        None
    };

    debug!(
        %descriptor,
        shape = ?shape.0,
        %x_resolution,
        %y_resolution,
        "Packed array"
    );

    Ok(PackedImage {
        shape,
        pixels,
        x_resolution,
        y_resolution,
        unit: x_calibration.unit,
        embedded_blob,
    })
}

fn to_rational(value: f64) -> Rational {
    Rational::approximate(value).unwrap_or_else(|| {
        warn!(value, "Resolution cannot be stored as a rational, writing 1");
        Rational::ONE
    })
}

/// Blob for an array, carrying the descriptor actually used for packing.
fn encode_blob(array: &LogicalArray, descriptor: &AxisDescriptor) -> Option<String> {
    let summary = MetadataSummary {
        is_sequence: descriptor.is_sequence(),
        collection_dimension_count: Some(descriptor.collection_axis_count()),
        datum_dimension_count: Some(descriptor.datum_axis_count()),
        ..MetadataSummary::from_array(array)
    };
    match metadata::encode(&summary) {
        Ok(blob) => Some(blob),
        Err(e) => {
            warn!(error = %e, "Could not encode metadata blob, writing without it");
            None
        }
    }
}

/// Pack an array and encode it, retrying once without the blob.
///
/// The first attempt carries the full payload (including the blob when
/// `embed_metadata` is set). If the encoder rejects it, the rejection is
/// logged and the minimal payload (resolution and unit only) is encoded
/// instead. A second rejection is returned.
pub fn write_with_retry<E: ContainerEncoder + ?Sized>(
    array: &LogicalArray,
    encoder: &E,
    embed_metadata: bool,
) -> Result<Vec<u8>, WriteError> {
    let packed = pack(array, embed_metadata)?;
    match encoder.encode(&packed) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            warn!(error = %e, "Could not write full metadata, retrying with resolution and unit only");
            Ok(encoder.encode(&packed.minimal())?)
        }
    }
}
