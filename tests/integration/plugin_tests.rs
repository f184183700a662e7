//! Host-facing integration tests.
//!
//! Tests verify:
//! - Files written through the registry read back unchanged
//! - Handlers are selected by extension, then by file signature
//! - QSTEM files are read through their handler and cannot be written

use std::fs;

use hyperstack_io::{
    AxisDescriptor, Config, Extension, HandlerError, HandlerRegistry, ImgIoHandler, IoHandler,
    LogicalArray,
};

use super::test_utils::{annotated, create_img, iota};

// =============================================================================
// Registry File I/O
// =============================================================================

#[test]
fn test_registry_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = HandlerRegistry::with_defaults(&Config::default());

    for (name, array) in [
        ("series.tif", annotated(&[4, 8, 8], true, 0, 2)),
        ("map.TIFF", annotated(&[3, 5, 16], false, 2, 1)),
        ("line.tif", annotated(&[12], false, 0, 1)),
    ] {
        let path = dir.path().join(name);
        registry.write(&array, &path).unwrap();
        assert!(path.exists());

        let resolved = registry.read(&path).unwrap();
        assert_eq!(resolved.array, array, "{name}");
    }
}

#[test]
fn test_signature_fallback_without_extension() {
    let dir = tempfile::tempdir().unwrap();
    let registry = HandlerRegistry::with_defaults(&Config::default());

    let tiff_path = dir.path().join("tiff.tif");
    let array = annotated(&[6, 7], false, 0, 2);
    registry.write(&array, &tiff_path).unwrap();
    let renamed = dir.path().join("acquisition_0001");
    fs::rename(&tiff_path, &renamed).unwrap();
    assert_eq!(registry.handler_for_path(&renamed).unwrap().id(), "tiff-io-handler");
    assert_eq!(registry.read(&renamed).unwrap().array, array);

    let img_path = dir.path().join("simulation.dat");
    fs::write(&img_path, create_img(2, 2, 1.0, 1.0, "", &[1.0, 2.0, 3.0, 4.0])).unwrap();
    assert_eq!(registry.handler_for_path(&img_path).unwrap().id(), "img-io-handler");
}

#[test]
fn test_unrecognized_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "plain text, not an image").unwrap();

    let registry = HandlerRegistry::with_defaults(&Config::default());
    assert!(matches!(registry.read(&path), Err(HandlerError::Format(_))));
}

#[test]
fn test_write_without_extension_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_extension");
    let registry = HandlerRegistry::with_defaults(&Config::default());

    let result = registry.write(&LogicalArray::new(iota(&[2, 2])), &path);
    assert!(matches!(result, Err(HandlerError::NoHandler(_))));
    assert!(!path.exists());
}

// =============================================================================
// QSTEM Handler
// =============================================================================

#[test]
fn test_img_handler_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wave.img");
    fs::write(&path, create_img(3, 2, 2.0, 1.0, "wave", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();

    let resolved = ImgIoHandler.read(&path).unwrap();
    let array = &resolved.array;
    assert_eq!(array.shape(), &[2, 3]);
    assert_eq!(array.descriptor(), AxisDescriptor::new(false, 0, 2).ok());
    assert_eq!(array.pixels().to_f32()[[1, 2]], 5.0);
    assert_eq!(array.properties()["comment"], "wave");
}

#[test]
fn test_img_converted_to_tiff() {
    let dir = tempfile::tempdir().unwrap();
    let img_path = dir.path().join("wave.img");
    fs::write(&img_path, create_img(4, 4, 0.5, 0.5, "", &[0.5; 16])).unwrap();

    let registry = HandlerRegistry::with_defaults(&Config::default());
    let array = registry.read(&img_path).unwrap().array;
    assert!(!registry.handler("img-io-handler").unwrap().can_write(&array, "img"));

    let tiff_path = dir.path().join("wave.tif");
    registry.write(&array, &tiff_path).unwrap();
    assert_eq!(registry.read(&tiff_path).unwrap().array, array);
}

#[test]
fn test_img_write_not_supported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.img");
    let registry = HandlerRegistry::with_defaults(&Config::default());

    let result = registry.write(&LogicalArray::new(iota(&[2, 2])), &path);
    assert!(matches!(result, Err(HandlerError::WriteNotSupported("img-io-handler"))));
    assert!(!path.exists());
}

// =============================================================================
// Extension Lifecycle
// =============================================================================

#[test]
fn test_extension_load_from_json() {
    let config = Config::from_json(r#"{"software": "host-app", "verbose": true}"#).unwrap();
    let extension = Extension::load(config).unwrap();
    assert_eq!(extension.config().software, "host-app");
    assert_eq!(
        extension.registry().ids(),
        vec!["tiff-io-handler", "img-io-handler"]
    );
    extension.close();
}
