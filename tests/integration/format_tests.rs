//! Format-specific integration tests.
//!
//! Tests verify:
//! - TIFF parser handles little-endian and big-endian files
//! - BigTIFF files are parsed correctly
//! - Unsupported page layouts are rejected or skipped
//! - QSTEM files are detected and decoded

use hyperstack_io::format::tiff::{read_stack, TiffFile};
use hyperstack_io::io::MemoryReader;
use hyperstack_io::{detect_format, FileFormat, ImgFile, TiffError};

use super::test_utils::{counting_pages, create_img, is_tiff_magic, ByteOrderType, IfdBuilder, TiffBuilder};

fn build(order: ByteOrderType, bigtiff: bool, pages: Vec<IfdBuilder>) -> Vec<u8> {
    pages
        .into_iter()
        .fold(
            TiffBuilder::new().with_byte_order(order).with_bigtiff(bigtiff),
            |builder, page| builder.add_ifd(page),
        )
        .build()
}

// =============================================================================
// TIFF Byte Order Tests
// =============================================================================

#[test]
fn test_little_endian_tiff() {
    let data = build(ByteOrderType::LittleEndian, false, counting_pages(2, 3, 4));
    assert_eq!(&data[0..2], b"II");
    assert!(is_tiff_magic(&data));

    let stack = read_stack(&MemoryReader::new(data)).unwrap();
    assert_eq!(stack.pixels.shape(), &[2, 3, 4]);
    assert_eq!(stack.pixels.to_f32()[[1, 2, 3]], 23.0);
}

#[test]
fn test_big_endian_tiff() {
    let data = build(ByteOrderType::BigEndian, false, counting_pages(2, 3, 4));
    assert_eq!(&data[0..2], b"MM");
    assert!(is_tiff_magic(&data));

    let stack = read_stack(&MemoryReader::new(data)).unwrap();
    assert_eq!(stack.pixels.shape(), &[2, 3, 4]);
    assert_eq!(stack.pixels.to_f32()[[1, 2, 3]], 23.0);
    assert_eq!(stack.pixels.to_f32()[[0, 0, 1]], 1.0);
}

#[test]
fn test_big_endian_description_and_resolution() {
    let mut pages = counting_pages(1, 2, 2);
    let page = pages
        .remove(0)
        .with_description("ImageJ=1.11a\nunit=micron\n")
        .with_resolution((300, 1), (150, 1), 2);
    let data = build(ByteOrderType::BigEndian, false, vec![page]);

    let stack = read_stack(&MemoryReader::new(data)).unwrap();
    assert_eq!(stack.description.as_deref(), Some("ImageJ=1.11a\nunit=micron\n"));
    assert_eq!(stack.x_resolution.map(|r| r.numerator), Some(300));
    assert_eq!(stack.y_resolution.map(|r| r.numerator), Some(150));
}

// =============================================================================
// BigTIFF Tests
// =============================================================================

#[test]
fn test_bigtiff() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let data = build(order, true, counting_pages(3, 2, 5));
        let reader = MemoryReader::new(data);
        let file = TiffFile::parse(&reader).unwrap();
        assert!(file.header.is_bigtiff);
        assert_eq!(file.ifds.len(), 3);

        let stack = file.read_stack(&reader).unwrap();
        assert_eq!(stack.pixels.shape(), &[3, 2, 5]);
        assert_eq!(stack.pixels.to_f32()[[2, 1, 4]], 29.0);
    }
}

// =============================================================================
// Page Layout Tests
// =============================================================================

#[test]
fn test_compressed_page_rejected() {
    let mut pages = counting_pages(1, 2, 2);
    let page = pages.remove(0).with_compression(5);
    let data = build(ByteOrderType::LittleEndian, false, vec![page]);

    let result = read_stack(&MemoryReader::new(data));
    assert!(matches!(result, Err(TiffError::UnsupportedCompression(_))));
}

#[test]
fn test_tiled_page_rejected() {
    let mut pages = counting_pages(1, 2, 2);
    let page = pages.remove(0).with_tiles(16, 16);
    let data = build(ByteOrderType::LittleEndian, false, vec![page]);

    let result = read_stack(&MemoryReader::new(data));
    assert!(matches!(result, Err(TiffError::TileOrganization)));
}

#[test]
fn test_thumbnails_and_mismatched_pages_skipped() {
    let mut pages = counting_pages(2, 4, 4);
    // Reduced-resolution copy of the same size, then a page of another size
    pages.push(IfdBuilder::strip_u16(4, 4, vec![7; 16]).with_subfile_type(1));
    pages.push(IfdBuilder::strip_u16(2, 2, vec![9; 4]));
    let data = build(ByteOrderType::LittleEndian, false, pages);

    let reader = MemoryReader::new(data);
    assert_eq!(TiffFile::parse(&reader).unwrap().ifds.len(), 4);
    let stack = read_stack(&reader).unwrap();
    assert_eq!(stack.pixels.shape(), &[2, 4, 4]);
}

#[test]
fn test_truncated_file_rejected() {
    let mut data = build(ByteOrderType::LittleEndian, false, counting_pages(1, 2, 2));
    data.truncate(6);
    assert!(read_stack(&MemoryReader::new(data)).is_err());
}

#[test]
fn test_oversized_page_rejected_before_allocation() {
    // 100000 x 100000 u16 declared, a single sample stored
    let page = IfdBuilder::strip_u16(1, 1, vec![7]).with_dimensions(100_000, 100_000);
    let data = build(ByteOrderType::LittleEndian, false, vec![page]);
    let size = data.len() as u64;

    let reader = MemoryReader::new(data);
    let file = TiffFile::parse(&reader).unwrap();
    match file.read_stack(&reader) {
        Err(TiffError::PixelDataTooLarge { needed, available }) => {
            assert_eq!(needed, 20_000_000_000);
            assert_eq!(available, size);
        }
        other => panic!("expected PixelDataTooLarge, got {other:?}"),
    }
}

#[test]
fn test_page_larger_than_file_rejected() {
    let page = IfdBuilder::strip_u16(2, 2, vec![1, 2, 3, 4]).with_dimensions(64, 64);
    let data = build(ByteOrderType::BigEndian, false, vec![page]);
    assert!(matches!(
        read_stack(&MemoryReader::new(data)),
        Err(TiffError::PixelDataTooLarge { needed: 8192, .. })
    ));
}

// =============================================================================
// QSTEM Tests
// =============================================================================

#[test]
fn test_detect_formats() {
    let tiff = build(ByteOrderType::LittleEndian, false, counting_pages(1, 2, 2));
    assert_eq!(detect_format(&tiff).unwrap(), FileFormat::Tiff);

    let img = create_img(2, 2, 1.0, 1.0, "", &[0.0; 4]);
    assert_eq!(detect_format(&img).unwrap(), FileFormat::QstemImg);

    assert!(detect_format(b"GIF89a.........................................................").is_err());
}

#[test]
fn test_qstem_decoding() {
    let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let img = create_img(4, 3, 0.5, 0.25, "beam scan", &values);
    let file = ImgFile::parse(&img).unwrap();
    assert_eq!(file.comment, "beam scan");
    assert!(file.parameters.is_empty());

    let array = file.into_logical_array();
    assert_eq!(array.shape(), &[3, 4]);
    assert_eq!(array.pixels().to_f32()[[2, 1]], 9.0);
    assert_eq!(array.calibration(0).scale, 0.025);
    assert_eq!(array.calibration(1).scale, 0.05);
    assert_eq!(array.calibration(1).unit, "nm");
}
