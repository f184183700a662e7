//! What the container tells us before any interpretation.

use tracing::debug;

use crate::format::tiff::{blob_from_json_description, ImageJDescription, Rational, TiffStack};
use crate::metadata;
use crate::model::{normalize_unit, PixelData};

use super::packer::native_axis_order;

/// Resolution tags and unit of the first page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeTags {
    pub x_resolution: Option<Rational>,
    pub y_resolution: Option<Rational>,
    /// Unit from the ImageJ description, else from the ResolutionUnit tag
    pub unit: String,
}

/// ImageJ's axis counters. Absent keys are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeAxisHints {
    pub images: Option<usize>,
    pub channels: Option<usize>,
    pub slices: Option<usize>,
    pub frames: Option<usize>,
}

impl NativeAxisHints {
    pub fn from_description(desc: &ImageJDescription) -> Option<Self> {
        desc.has_axis_hints().then_some(Self {
            images: desc.images,
            channels: desc.channels,
            slices: desc.slices,
            frames: desc.frames,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels.unwrap_or(1)
    }

    pub fn slices(&self) -> usize {
        self.slices.unwrap_or(1)
    }

    pub fn frames(&self) -> usize {
        self.frames.unwrap_or(1)
    }
}

/// Page geometry of the decoded stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub page_count: usize,
    pub height: usize,
    pub width: usize,
}

impl PageLayout {
    pub fn element_count(&self) -> usize {
        self.page_count * self.height * self.width
    }
}

/// Decoded container contents, ready for the resolver.
///
/// `pixels` are in native order with the raw shape the codec chose; see
/// [`RawImage::from_tiff_stack`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub pixels: PixelData,
    pub native_tags: NativeTags,
    pub hints: Option<NativeAxisHints>,
    pub layout: PageLayout,
    pub embedded_blob: Option<String>,
}

impl RawImage {
    /// Interpret a decoded TIFF page stack.
    ///
    /// The raw shape is chosen as follows:
    /// - when the blob declares a descriptor and the ImageJ counts agree with
    ///   the page count, the pages are reshaped to the container slots that
    ///   descriptor occupies, in `TZCYX` order;
    /// - otherwise the `(pages, height, width)` stack with size-1 axes
    ///   dropped (keeping at least one axis).
    pub fn from_tiff_stack(stack: TiffStack) -> Self {
        let layout = PageLayout {
            page_count: stack.page_count(),
            height: stack.height(),
            width: stack.width(),
        };

        let imagej = stack.description.as_deref().and_then(ImageJDescription::parse);
        let (hints, embedded_blob, imagej_unit) = match &imagej {
            Some(desc) => (
                NativeAxisHints::from_description(desc),
                desc.blob.clone(),
                desc.unit.clone(),
            ),
            None => (
                None,
                stack.description.as_deref().and_then(blob_from_json_description),
                None,
            ),
        };

        let unit = match imagej_unit {
            Some(unit) if !unit.is_empty() => normalize_unit(&unit),
            _ => stack.resolution_unit.unit_name().to_string(),
        };

        let raw_shape = blob_layout_shape(embedded_blob.as_deref(), hints.as_ref(), &layout)
            .unwrap_or_else(|| squeezed_shape(&layout));
        debug!(?raw_shape, ?hints, blob = embedded_blob.is_some(), "Chose raw shape");

        let pixels = match stack.pixels.reshaped(&raw_shape) {
            Ok(pixels) => pixels,
            // Unreachable: both shapes hold exactly the stack's elements
            Err(_) => stack.pixels,
        };

        RawImage {
            pixels,
            native_tags: NativeTags {
                x_resolution: stack.x_resolution,
                y_resolution: stack.y_resolution,
                unit,
            },
            hints,
            layout,
            embedded_blob,
        }
    }

    /// A raw image with no tags, hints or blob.
    pub fn from_pixels(pixels: PixelData) -> Self {
        let shape = pixels.shape();
        let (height, width) = match shape.len() {
            0 => (1, 1),
            1 => (1, shape[0]),
            n => (shape[n - 2], shape[n - 1]),
        };
        let page_count = pixels.len() / (height * width).max(1);
        RawImage {
            pixels,
            native_tags: NativeTags::default(),
            hints: None,
            layout: PageLayout {
                page_count,
                height,
                width,
            },
            embedded_blob: None,
        }
    }
}

/// Raw shape implied by the blob's descriptor, if it fits the stack.
fn blob_layout_shape(
    blob: Option<&str>,
    hints: Option<&NativeAxisHints>,
    layout: &PageLayout,
) -> Option<Vec<usize>> {
    let descriptor = metadata::decode(blob?).ok()?.descriptor().ok()??;

    let (frames, slices, channels) = match hints {
        Some(h) => (h.frames(), h.slices(), h.channels()),
        None => (1, 1, 1),
    };
    let pages = frames.checked_mul(slices)?.checked_mul(channels)?;
    if pages != layout.page_count {
        return None;
    }
    let slots = [frames, slices, channels, layout.height, layout.width];

    let (native_slots, _) = native_axis_order(&descriptor).ok()?;
    let shape: Vec<usize> = native_slots.iter().map(|&slot| slots[slot]).collect();
    let elements = shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))?;
    (elements == layout.element_count()).then_some(shape)
}

/// `(pages, height, width)` without its size-1 axes.
fn squeezed_shape(layout: &PageLayout) -> Vec<usize> {
    let shape: Vec<usize> = [layout.page_count, layout.height, layout.width]
        .into_iter()
        .filter(|&n| n != 1)
        .collect();
    if shape.is_empty() {
        vec![1]
    } else {
        shape
    }
}
