//! Write-then-read integration tests.
//!
//! Tests verify:
//! - Every representable axis layout survives a TIFF round trip unchanged
//! - Writing a read-back array reproduces the file byte for byte
//! - Size-1 axes, dtypes and blob-less files behave as documented

use chrono::DateTime;
use ndarray::{ArrayD, IxDyn};
use serde_json::{json, Map};

use hyperstack_io::{
    AxisDescriptor, Calibration, Config, DataType, LogicalArray, PixelData, TiffIoHandler,
};

use super::test_utils::{annotated, iota, is_tiff_magic, representable_layouts};

fn handler() -> TiffIoHandler {
    TiffIoHandler::new(&Config::default())
}

// =============================================================================
// Layout Round Trips
// =============================================================================

#[test]
fn test_round_trip_all_representable_layouts() {
    let handler = handler();
    for (shape, d) in representable_layouts() {
        let original = annotated(&shape, d.is_sequence(), d.collection_axis_count(), d.datum_axis_count());
        let bytes = handler.write_bytes(&original).unwrap();
        assert!(is_tiff_magic(&bytes));

        let resolved = handler.read_bytes(bytes).unwrap();
        assert!(resolved.diagnostics.is_empty(), "{d}: {:?}", resolved.diagnostics);
        assert_eq!(resolved.array, original, "round trip of {d} with shape {shape:?}");
    }
}

#[test]
fn test_round_trip_is_idempotent() {
    let handler = handler();
    for (shape, d) in representable_layouts() {
        let original = annotated(&shape, d.is_sequence(), d.collection_axis_count(), d.datum_axis_count());
        let first = handler.write_bytes(&original).unwrap();
        let resolved = handler.read_bytes(first.clone()).unwrap();
        let second = handler.write_bytes(&resolved.array).unwrap();
        assert_eq!(first, second, "rewrite of {d} changed the file");
    }
}

#[test]
fn test_round_trip_keeps_unit_axes() {
    let handler = handler();
    for (shape, descriptor) in [
        (vec![1, 4, 5], AxisDescriptor::new(true, 0, 2).unwrap()),
        (vec![1, 5], AxisDescriptor::new(false, 0, 2).unwrap()),
        (vec![3, 1, 7], AxisDescriptor::new(false, 2, 1).unwrap()),
        (vec![1], AxisDescriptor::new(false, 0, 1).unwrap()),
    ] {
        let original = LogicalArray::new(iota(&shape))
            .with_descriptor(descriptor)
            .unwrap();
        let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();
        assert_eq!(resolved.array.shape(), shape.as_slice());
        assert_eq!(resolved.array.descriptor(), Some(descriptor));
    }
}

#[test]
fn test_round_trip_metadata_extras() {
    let mut properties = Map::new();
    properties.insert("voltage".into(), json!(300));
    properties.insert("detector".into(), json!({"name": "HAADF", "gain": 1.5}));
    let timestamp = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();

    let original = annotated(&[4, 6], false, 0, 2)
        .with_intensity_calibration(Calibration::new(-3.0, 0.5, "counts"))
        .with_timestamp(timestamp)
        .with_properties(properties);

    let handler = handler();
    let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();
    assert_eq!(resolved.array, original);
}

#[test]
fn test_round_trip_without_descriptor() {
    let original = LogicalArray::new(iota(&[3, 4, 5]));
    let handler = handler();
    let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();

    // The default descriptor is written out and read back
    assert_eq!(resolved.array.descriptor(), AxisDescriptor::new(true, 0, 2).ok());
    assert_eq!(resolved.array.pixels(), original.pixels());
    assert!(resolved.array.calibrations().is_none());
}

// =============================================================================
// Dtype Tests
// =============================================================================

#[test]
fn test_native_dtypes_are_kept() {
    let handler = handler();
    let arrays: Vec<PixelData> = vec![
        ArrayD::from_elem(IxDyn(&[2, 3]), 7u8).into(),
        ArrayD::from_elem(IxDyn(&[2, 3]), 700u16).into(),
        ArrayD::from_elem(IxDyn(&[2, 3]), 0.5f32).into(),
    ];
    for pixels in arrays {
        let original = LogicalArray::new(pixels.clone());
        let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();
        assert_eq!(resolved.array.pixels(), &pixels);
    }
}

#[test]
fn test_other_dtypes_become_float32() {
    let handler = handler();
    let original = LogicalArray::new(ArrayD::from_elem(IxDyn(&[2, 3]), -4i32));
    let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();
    assert_eq!(resolved.array.pixels().dtype(), DataType::Float32);
    assert_eq!(resolved.array.pixels().to_f32()[[1, 2]], -4.0);
}

// =============================================================================
// Blob-less Files
// =============================================================================

#[test]
fn test_without_blob_structure_comes_from_imagej_counts() {
    let config = Config {
        embed_metadata: false,
        ..Config::default()
    };
    let handler = TiffIoHandler::new(&config);

    // Frames become the sequence axis
    let original = annotated(&[3, 4, 5], true, 0, 2);
    let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();
    assert!(resolved.diagnostics.is_empty());
    assert_eq!(resolved.array.descriptor(), original.descriptor());
    assert_eq!(resolved.array.pixels(), original.pixels());
    assert!(resolved.array.intensity_calibration().is_identity());

    // Channels become a collection axis, left in container order (C before X)
    let original = annotated(&[4, 6], false, 1, 1);
    let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();
    assert_eq!(resolved.array.shape(), &[6, 4]);
    assert_eq!(resolved.array.descriptor(), AxisDescriptor::new(false, 1, 1).ok());
}

#[test]
fn test_without_blob_resolution_survives() {
    let config = Config {
        embed_metadata: false,
        ..Config::default()
    };
    let handler = TiffIoHandler::new(&config);

    let original = LogicalArray::new(iota(&[8, 8]))
        .with_calibrations(vec![Calibration::scaled(0.5, "nm"), Calibration::scaled(0.25, "nm")])
        .unwrap();
    let resolved = handler.read_bytes(handler.write_bytes(&original).unwrap()).unwrap();
    assert_eq!(resolved.array.calibrations(), original.calibrations());
}
