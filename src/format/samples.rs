//! Raw sample decoding shared by the file readers.

use ndarray::{ArrayD, IxDyn, ShapeError};
use num_complex::Complex;

use crate::model::{DataType, PixelData};

use super::tiff::ByteOrder;

/// Decode `shape.iter().product()` samples of `dtype` from `bytes`.
///
/// Samples are taken in row-major order; trailing bytes are ignored. Complex
/// samples are interleaved real/imaginary pairs.
pub fn decode_samples(
    dtype: DataType,
    shape: &[usize],
    bytes: &[u8],
    byte_order: ByteOrder,
) -> Result<PixelData, ShapeError> {
    let count: usize = shape.iter().product();
    let size = dtype.size_in_bytes();
    let bytes = &bytes[..(count * size).min(bytes.len())];

    macro_rules! decode {
        ($ty:ty, $n:expr) => {{
            let values: Vec<$ty> = bytes
                .chunks_exact($n)
                .map(|chunk| {
                    let mut raw = [0u8; $n];
                    raw.copy_from_slice(chunk);
                    match byte_order {
                        ByteOrder::LittleEndian => <$ty>::from_le_bytes(raw),
                        ByteOrder::BigEndian => <$ty>::from_be_bytes(raw),
                    }
                })
                .collect();
            ArrayD::from_shape_vec(IxDyn(shape), values)?
        }};
    }

    macro_rules! decode_complex {
        ($ty:ty, $n:expr) => {{
            let values: Vec<Complex<$ty>> = bytes
                .chunks_exact(2 * $n)
                .map(|chunk| {
                    let mut re = [0u8; $n];
                    let mut im = [0u8; $n];
                    re.copy_from_slice(&chunk[..$n]);
                    im.copy_from_slice(&chunk[$n..]);
                    match byte_order {
                        ByteOrder::LittleEndian => {
                            Complex::new(<$ty>::from_le_bytes(re), <$ty>::from_le_bytes(im))
                        }
                        ByteOrder::BigEndian => {
                            Complex::new(<$ty>::from_be_bytes(re), <$ty>::from_be_bytes(im))
                        }
                    }
                })
                .collect();
            ArrayD::from_shape_vec(IxDyn(shape), values)?
        }};
    }

    Ok(match dtype {
        DataType::UInt8 => PixelData::UInt8(ArrayD::from_shape_vec(IxDyn(shape), bytes.to_vec())?),
        DataType::UInt16 => PixelData::UInt16(decode!(u16, 2)),
        DataType::UInt32 => PixelData::UInt32(decode!(u32, 4)),
        DataType::Int8 => PixelData::Int8(decode!(i8, 1)),
        DataType::Int16 => PixelData::Int16(decode!(i16, 2)),
        DataType::Int32 => PixelData::Int32(decode!(i32, 4)),
        DataType::Float32 => PixelData::Float32(decode!(f32, 4)),
        DataType::Float64 => PixelData::Float64(decode!(f64, 8)),
        DataType::Complex64 => PixelData::Complex64(decode_complex!(f32, 4)),
        DataType::Complex128 => PixelData::Complex128(decode_complex!(f64, 8)),
    })
}
