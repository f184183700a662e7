//! Reading files from other writers, and write rejections.
//!
//! Tests verify:
//! - Plain TIFF stacks resolve to a sequence of images
//! - Resolution tags become calibrations
//! - Malformed or mismatched blobs fall back without failing the read
//! - Layouts without a container mapping are rejected before any file exists

use std::path::Path;

use hyperstack_io::{
    AxisDescriptor, Calibration, Config, DiagnosticKind, HandlerError, IoHandler, LogicalArray,
    TiffIoHandler, UnsupportedRankError, WriteError,
};

use super::test_utils::{counting_pages, iota, IfdBuilder, TiffBuilder};

fn handler() -> TiffIoHandler {
    TiffIoHandler::new(&Config::default())
}

fn stack(pages: Vec<IfdBuilder>) -> Vec<u8> {
    pages
        .into_iter()
        .fold(TiffBuilder::new(), |builder, page| builder.add_ifd(page))
        .build()
}

// =============================================================================
// Plain TIFF Stacks
// =============================================================================

#[test]
fn test_plain_stack_is_sequence_of_images() {
    let bytes = stack(counting_pages(10, 16, 16));
    let resolved = handler().read_bytes(bytes).unwrap();

    let array = &resolved.array;
    assert_eq!(array.shape(), &[10, 16, 16]);
    assert_eq!(array.descriptor(), AxisDescriptor::new(true, 0, 2).ok());
    assert!(array.calibrations().is_none());
    assert!(resolved.diagnostics.is_empty());
    assert_eq!(array.pixels().to_f32()[[9, 15, 15]], 2559.0);
}

#[test]
fn test_resolution_tags_become_calibrations() {
    let mut pages = counting_pages(1, 32, 32);
    let page = pages.remove(0).with_resolution((100, 1), (100, 1), 1).with_description(
        "ImageJ=1.11a\nunit=nm\n",
    );
    let resolved = handler().read_bytes(stack(vec![page])).unwrap();

    let array = &resolved.array;
    assert_eq!(array.shape(), &[32, 32]);
    assert_eq!(array.descriptor(), None);
    assert_eq!(
        array.calibrations().unwrap(),
        &[Calibration::scaled(0.01, "nm"), Calibration::scaled(0.01, "nm")]
    );
}

#[test]
fn test_resolution_unit_tag_used_without_imagej_unit() {
    let mut pages = counting_pages(1, 4, 4);
    let page = pages.remove(0).with_resolution((2, 1), (4, 1), 3);
    let resolved = handler().read_bytes(stack(vec![page])).unwrap();
    assert_eq!(
        resolved.array.calibrations().unwrap(),
        &[Calibration::scaled(0.25, "cm"), Calibration::scaled(0.5, "cm")]
    );
}

#[test]
fn test_imagej_channels_split_pages() {
    let mut pages = counting_pages(6, 4, 5);
    pages[0] = IfdBuilder::strip_u16(5, 4, (0..20).collect())
        .with_description("ImageJ=1.11a\nimages=6\nchannels=2\nframes=3\nhyperstack=true\n");
    let resolved = handler().read_bytes(stack(pages)).unwrap();
    assert_eq!(resolved.array.shape(), &[3, 2, 4, 5]);
    assert_eq!(resolved.array.descriptor(), AxisDescriptor::new(true, 1, 2).ok());
}

#[test]
fn test_imagej_indivisible_channels_recorded() {
    let mut pages = counting_pages(6, 4, 5);
    pages[0] = IfdBuilder::strip_u16(5, 4, (0..20).collect())
        .with_description("ImageJ=1.11a\nimages=6\nchannels=4\n");
    let resolved = handler().read_bytes(stack(pages)).unwrap();
    assert_eq!(resolved.array.shape(), &[6, 4, 5]);
    assert_eq!(resolved.array.descriptor(), AxisDescriptor::new(true, 0, 2).ok());
    assert_eq!(resolved.diagnostics[0].kind, DiagnosticKind::InferenceAbandoned);
}

// =============================================================================
// Damaged Blobs
// =============================================================================

#[test]
fn test_truncated_blob_falls_back() {
    let mut pages = counting_pages(3, 4, 4);
    pages[0] = IfdBuilder::strip_u16(4, 4, (0..16).collect()).with_description(
        "ImageJ=1.11a\nimages=3\nframes=3\nnion_swift={\"spatial_calibrations\":[{\"offset\":",
    );
    let resolved = handler().read_bytes(stack(pages)).unwrap();

    assert_eq!(resolved.array.shape(), &[3, 4, 4]);
    assert_eq!(resolved.array.descriptor(), AxisDescriptor::new(true, 0, 2).ok());
    assert_eq!(resolved.diagnostics[0].kind, DiagnosticKind::MalformedBlob);
}

#[test]
fn test_blob_for_other_rank_is_ignored() {
    // Blob claims a single image but the file holds three pages
    let blob = r#"{"datum_dimension_count":2}"#;
    let description = format!("ImageJ=1.11a\nnion_swift={blob}\n");
    let mut pages = counting_pages(3, 4, 6);
    pages[0] = IfdBuilder::strip_u16(6, 4, (0..24).collect()).with_description(&description);
    let resolved = handler().read_bytes(stack(pages)).unwrap();

    assert_eq!(resolved.array.shape(), &[3, 4, 6]);
    assert_eq!(resolved.array.descriptor(), AxisDescriptor::new(true, 0, 2).ok());
    assert_eq!(resolved.diagnostics[0].kind, DiagnosticKind::DescriptorMismatch);
}

#[test]
fn test_overflowing_imagej_counts_do_not_abort_read() {
    let description = "ImageJ=1.11a\nframes=4294967296\nslices=4294967296\n\
                       nion_swift={\"datum_dimension_count\":2}\n";
    let page = IfdBuilder::strip_u16(2, 2, vec![1, 2, 3, 4]).with_description(description);
    let resolved = handler().read_bytes(stack(vec![page])).unwrap();

    assert_eq!(resolved.array.shape(), &[2, 2]);
}

#[test]
fn test_blob_in_plain_json_description() {
    let description = r#"{"shape": [2, 3], "nion_swift": {"datum_dimension_count": 2, "properties": {"k": 1}}}"#;
    let mut pages = counting_pages(1, 2, 3);
    let page = pages.remove(0).with_description(description);
    let resolved = handler().read_bytes(stack(vec![page])).unwrap();

    assert_eq!(resolved.array.descriptor(), AxisDescriptor::new(false, 0, 2).ok());
    assert_eq!(resolved.array.properties()["k"], 1);
}

// =============================================================================
// Write Rejections
// =============================================================================

#[test]
fn test_sequence_of_2d_collections_rejected_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rejected.tif");

    let array = LogicalArray::new(iota(&[2, 3, 4, 5]))
        .with_descriptor(AxisDescriptor::new(true, 2, 1).unwrap())
        .unwrap();
    let handler = handler();
    assert!(!handler.can_write(&array, "tif"));

    let result = handler.write(&array, &path, "tif");
    assert!(matches!(
        result,
        Err(HandlerError::Write(WriteError::UnsupportedRank(
            UnsupportedRankError::SequenceOfCollections
        )))
    ));
    assert!(!path.exists());
}

#[test]
fn test_five_axes_rejected() {
    let array = LogicalArray::new(iota(&[2, 2, 2, 2, 2]));
    let result = handler().write_bytes(&array);
    assert!(matches!(
        result,
        Err(HandlerError::Write(WriteError::UnsupportedRank(
            UnsupportedRankError::TooManyAxes(5)
        )))
    ));
}

#[test]
fn test_oversized_blob_retried_without_metadata() {
    let config = Config {
        max_description_bytes: 256,
        ..Config::default()
    };
    let handler = TiffIoHandler::new(&config);

    let mut properties = serde_json::Map::new();
    properties.insert("notes".into(), "x".repeat(1000).into());
    let array = LogicalArray::new(iota(&[3, 4, 5]))
        .with_descriptor(AxisDescriptor::new(true, 0, 2).unwrap())
        .unwrap()
        .with_calibrations(vec![
            Calibration::identity(),
            Calibration::scaled(0.5, "nm"),
            Calibration::scaled(0.5, "nm"),
        ])
        .unwrap()
        .with_properties(properties);

    let resolved = handler.read_bytes(handler.write_bytes(&array).unwrap()).unwrap();

    // Structure and resolution survive through the ImageJ keys alone
    let read = &resolved.array;
    assert_eq!(read.pixels(), array.pixels());
    assert_eq!(read.descriptor(), array.descriptor());
    assert_eq!(read.calibration(2), Calibration::scaled(0.5, "nm"));
    assert!(read.properties().is_empty());
}

#[test]
fn test_unknown_extension_rejected() {
    let array = LogicalArray::new(iota(&[2, 2]));
    let result = handler().write(&array, Path::new("/nonexistent/out.png"), "png");
    assert!(matches!(result, Err(HandlerError::NoHandler(_))));
}
