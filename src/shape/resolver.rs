//! Reconstructing logical axes from a decoded container.
//!
//! Sources are tried in order of trust:
//!
//! 1. The embedded blob, when its descriptor fits the pixel rank. Pixels are
//!    then moved from container slot order back to logical order.
//! 2. ImageJ's channel/slice/frame counters, which only say how the pages
//!    split into `T`, `Z` and `C`. Channels and slices are read as collection
//!    axes, leftover pages as a sequence.
//! 3. The rank alone: three axes are a sequence of images.
//!
//! None of these failing is an error. The array is returned with whatever
//! structure could be established and a [`Diagnostic`] for each fallback.

use tracing::{debug, warn};

use crate::error::ShapeMismatchError;
use crate::metadata::{self, MetadataSummary};
use crate::model::{AxisDescriptor, Calibration, ContainerShape, LogicalArray, PixelData};

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::native::{NativeAxisHints, NativeTags, PageLayout, RawImage};
use super::packer::{invert_permutation, native_axis_order};

/// A resolved array and what had to be recovered from along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub array: LogicalArray,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build a [`LogicalArray`] from decoded container contents.
pub fn resolve(raw: RawImage) -> Resolved {
    let RawImage {
        mut pixels,
        native_tags,
        hints,
        layout,
        embedded_blob,
    } = raw;
    let mut diagnostics = Vec::new();
    let mut report = |kind: DiagnosticKind, message: String| {
        warn!(?kind, "{message}");
        diagnostics.push(Diagnostic::new(kind, message));
    };

    let summary = match embedded_blob.as_deref().map(metadata::decode) {
        Some(Ok(summary)) => Some(summary),
        Some(Err(e)) => {
            report(DiagnosticKind::MalformedBlob, e.to_string());
            None
        }
        None => None,
    };
    // decode() has already validated the counts
    let blob_descriptor = summary
        .as_ref()
        .and_then(|s| s.descriptor().ok())
        .flatten();

    let mut descriptor = None;
    if let Some(d) = blob_descriptor {
        if d.axis_count() == pixels.ndim() {
            if let Ok((_, order)) = native_axis_order(&d) {
                pixels = pixels.permuted(&invert_permutation(&order));
            }
            descriptor = Some(d);
        } else {
            report(
                DiagnosticKind::DescriptorMismatch,
                format!(
                    "embedded descriptor {d} describes {} axes but data has {}",
                    d.axis_count(),
                    pixels.ndim()
                ),
            );
        }
    }

    if descriptor.is_none() {
        if let Some(hints) = hints {
            match infer_from_hints(&pixels, &hints, &layout) {
                Ok((inferred, d)) => {
                    debug!(descriptor = %d, shape = ?inferred.shape(), "Inferred axes from ImageJ counts");
                    pixels = inferred;
                    descriptor = Some(d);
                }
                Err(e) => report(DiagnosticKind::InferenceAbandoned, e.to_string()),
            }
        }
    }

    if descriptor.is_none() && pixels.ndim() == 3 {
        descriptor = AxisDescriptor::default_for_rank(3);
    }

    let ndim = pixels.ndim();
    let blob_calibrations = summary
        .as_ref()
        .and_then(|s| s.spatial_calibrations.clone());
    let calibrations = match blob_calibrations {
        Some(cals) if cals.len() == ndim && (descriptor == blob_descriptor || blob_descriptor.is_none()) => {
            Some(cals)
        }
        Some(cals) => {
            report(
                DiagnosticKind::CalibrationsDiscarded,
                format!(
                    "embedded blob has {} calibrations for {ndim} resolved axes",
                    cals.len()
                ),
            );
            native_calibrations(&native_tags, descriptor.as_ref(), ndim)
        }
        None => native_calibrations(&native_tags, descriptor.as_ref(), ndim),
    };

    let (intensity_calibration, timestamp, properties) = match summary {
        Some(summary) => blob_extras(summary),
        None => (Calibration::identity(), None, Default::default()),
    };

    debug!(
        descriptor = ?descriptor.map(|d| d.to_string()),
        shape = ?pixels.shape(),
        calibrated = calibrations.is_some(),
        "Resolved array"
    );

    let array = LogicalArray::from_parts(
        pixels,
        descriptor,
        calibrations,
        intensity_calibration,
        timestamp,
        properties,
    );
    Resolved { array, diagnostics }
}

/// Split pages into frames, slices and channels using ImageJ's counters.
///
/// Channels and slices are only moved out of the page count when they divide
/// it evenly.
fn infer_from_hints(
    pixels: &PixelData,
    hints: &NativeAxisHints,
    layout: &PageLayout,
) -> Result<(PixelData, AxisDescriptor), ShapeMismatchError> {
    // TZCYX; the page count starts out in T
    let mut slots = [layout.page_count, 1, 1, layout.height, layout.width];

    for (hint, count, slot) in [
        ("channels", hints.channels(), ContainerShape::C),
        ("slices", hints.slices(), ContainerShape::Z),
    ] {
        if count <= 1 || count == slots[slot] {
            continue;
        }
        if slots[ContainerShape::T] % count != 0 {
            return Err(ShapeMismatchError::Indivisible {
                hint,
                count,
                pages: layout.page_count,
            });
        }
        slots[ContainerShape::T] /= count;
        slots[slot] = count;
    }

    let is_sequence = slots[ContainerShape::T] > 1;
    let collection = usize::from(slots[ContainerShape::Z] > 1) + usize::from(slots[ContainerShape::C] > 1);
    let datum = 1 + usize::from(slots[ContainerShape::Y] > 1);

    let mut shape: Vec<usize> = slots[..ContainerShape::X]
        .iter()
        .copied()
        .filter(|&n| n > 1)
        .collect();
    shape.push(slots[ContainerShape::X]);

    let mismatch = || ShapeMismatchError::ElementCount {
        inferred: shape.clone(),
        elements: pixels.len(),
    };
    if shape.iter().product::<usize>() != pixels.len() {
        return Err(mismatch());
    }
    let descriptor = AxisDescriptor::new(is_sequence, collection, datum).map_err(|_| mismatch())?;
    let reshaped = pixels.reshaped(&shape).map_err(|_| mismatch())?;
    Ok((reshaped, descriptor))
}

/// Calibrations from the resolution tags.
///
/// The tags describe the image plane, which holds the collection axes when
/// there is a collection and the trailing datum axes otherwise. Returns
/// `None` when the tags carry no calibration at all.
fn native_calibrations(
    tags: &NativeTags,
    descriptor: Option<&AxisDescriptor>,
    ndim: usize,
) -> Option<Vec<Calibration>> {
    if ndim == 0 {
        return None;
    }
    let scale = |resolution: Option<crate::format::tiff::Rational>| {
        resolution
            .and_then(|r| r.to_f64())
            .filter(|v| v.is_finite() && *v != 0.0)
            .map_or(1.0, |v| 1.0 / v)
    };
    let x = Calibration::scaled(scale(tags.x_resolution), tags.unit.clone());
    let y = Calibration::scaled(scale(tags.y_resolution), tags.unit.clone());

    let mut calibrations = vec![Calibration::identity(); ndim];
    let plane_axes = match descriptor {
        Some(d) if d.collection_axis_count() > 0 => {
            d.collection_start()..d.collection_start() + d.collection_axis_count()
        }
        Some(d) => ndim - d.datum_axis_count()..ndim,
        None => ndim.saturating_sub(2)..ndim,
    };
    match plane_axes.len() {
        1 => calibrations[plane_axes.start] = x,
        2 => {
            calibrations[plane_axes.start] = y;
            calibrations[plane_axes.start + 1] = x;
        }
        _ => {}
    }

    if calibrations.iter().all(Calibration::is_identity) {
        None
    } else {
        Some(calibrations)
    }
}

type BlobExtras = (
    Calibration,
    Option<chrono::DateTime<chrono::Utc>>,
    serde_json::Map<String, serde_json::Value>,
);

fn blob_extras(summary: MetadataSummary) -> BlobExtras {
    let timestamp = summary.datetime().ok().flatten();
    (
        summary
            .intensity_calibration
            .unwrap_or_else(Calibration::identity),
        timestamp,
        summary.properties,
    )
}
