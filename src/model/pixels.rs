//! Dense N-dimensional pixel buffers.

use ndarray::{ArrayD, IxDyn, ShapeError};
use num_complex::Complex;

/// Sample type of a [`PixelData`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    UInt8,
    UInt16,
    UInt32,
    Int8,
    Int16,
    Int32,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl DataType {
    /// Size of one sample in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 | DataType::Complex64 => 8,
            DataType::Complex128 => 16,
        }
    }

    pub const fn is_complex(self) -> bool {
        matches!(self, DataType::Complex64 | DataType::Complex128)
    }

    /// Whether ImageJ hyperstacks store this type without conversion.
    pub const fn is_container_native(self) -> bool {
        matches!(self, DataType::UInt8 | DataType::UInt16 | DataType::Float32)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Complex64 => "complex64",
            DataType::Complex128 => "complex128",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An N-dimensional pixel buffer tagged with its sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    UInt8(ArrayD<u8>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Complex64(ArrayD<Complex<f32>>),
    Complex128(ArrayD<Complex<f64>>),
}

/// Apply an expression to the inner array of every variant, rewrapping the result.
macro_rules! map_pixels {
    ($pixels:expr, $array:ident => $body:expr) => {
        match $pixels {
            PixelData::UInt8($array) => PixelData::UInt8($body),
            PixelData::UInt16($array) => PixelData::UInt16($body),
            PixelData::UInt32($array) => PixelData::UInt32($body),
            PixelData::Int8($array) => PixelData::Int8($body),
            PixelData::Int16($array) => PixelData::Int16($body),
            PixelData::Int32($array) => PixelData::Int32($body),
            PixelData::Float32($array) => PixelData::Float32($body),
            PixelData::Float64($array) => PixelData::Float64($body),
            PixelData::Complex64($array) => PixelData::Complex64($body),
            PixelData::Complex128($array) => PixelData::Complex128($body),
        }
    };
}

/// Evaluate an expression against the inner array of any variant.
macro_rules! with_pixels {
    ($pixels:expr, $array:ident => $body:expr) => {
        match $pixels {
            PixelData::UInt8($array) => $body,
            PixelData::UInt16($array) => $body,
            PixelData::UInt32($array) => $body,
            PixelData::Int8($array) => $body,
            PixelData::Int16($array) => $body,
            PixelData::Int32($array) => $body,
            PixelData::Float32($array) => $body,
            PixelData::Float64($array) => $body,
            PixelData::Complex64($array) => $body,
            PixelData::Complex128($array) => $body,
        }
    };
}

impl PixelData {
    pub fn shape(&self) -> &[usize] {
        with_pixels!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_pixels!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DataType {
        match self {
            PixelData::UInt8(_) => DataType::UInt8,
            PixelData::UInt16(_) => DataType::UInt16,
            PixelData::UInt32(_) => DataType::UInt32,
            PixelData::Int8(_) => DataType::Int8,
            PixelData::Int16(_) => DataType::Int16,
            PixelData::Int32(_) => DataType::Int32,
            PixelData::Float32(_) => DataType::Float32,
            PixelData::Float64(_) => DataType::Float64,
            PixelData::Complex64(_) => DataType::Complex64,
            PixelData::Complex128(_) => DataType::Complex128,
        }
    }

    /// Reorder axes so that output axis `i` is input axis `order[i]`.
    ///
    /// The result is materialized in standard (row-major) layout.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of `0..ndim`.
    pub fn permuted(&self, order: &[usize]) -> PixelData {
        map_pixels!(self, a => a
            .view()
            .permuted_axes(IxDyn(order))
            .as_standard_layout()
            .into_owned())
    }

    /// Reinterpret the elements (in logical row-major order) with a new shape.
    pub fn reshaped(&self, shape: &[usize]) -> Result<PixelData, ShapeError> {
        Ok(map_pixels!(self, a => ArrayD::from_shape_vec(
            IxDyn(shape),
            a.iter().cloned().collect(),
        )?))
    }

    /// Convert to 32-bit float; complex samples keep only their real part.
    pub fn to_f32(&self) -> ArrayD<f32> {
        match self {
            PixelData::UInt8(a) => a.mapv(f32::from),
            PixelData::UInt16(a) => a.mapv(f32::from),
            PixelData::UInt32(a) => a.mapv(|v| v as f32),
            PixelData::Int8(a) => a.mapv(f32::from),
            PixelData::Int16(a) => a.mapv(f32::from),
            PixelData::Int32(a) => a.mapv(|v| v as f32),
            PixelData::Float32(a) => a.clone(),
            PixelData::Float64(a) => a.mapv(|v| v as f32),
            PixelData::Complex64(a) => a.mapv(|v| v.re),
            PixelData::Complex128(a) => a.mapv(|v| v.re as f32),
        }
    }

    /// Buffer in a type ImageJ hyperstacks store (`u8`, `u16` or `f32`).
    pub fn to_container_native(&self) -> PixelData {
        if self.dtype().is_container_native() {
            self.clone()
        } else {
            PixelData::Float32(self.to_f32())
        }
    }

    /// Little-endian sample bytes in logical (row-major) order.
    ///
    /// Complex samples are written as interleaved real/imaginary pairs.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.dtype().size_in_bytes());
        match self {
            PixelData::UInt8(a) => out.extend(a.iter().copied()),
            PixelData::UInt16(a) => a.iter().for_each(|v| out.extend(v.to_le_bytes())),
            PixelData::UInt32(a) => a.iter().for_each(|v| out.extend(v.to_le_bytes())),
            PixelData::Int8(a) => a.iter().for_each(|v| out.extend(v.to_le_bytes())),
            PixelData::Int16(a) => a.iter().for_each(|v| out.extend(v.to_le_bytes())),
            PixelData::Int32(a) => a.iter().for_each(|v| out.extend(v.to_le_bytes())),
            PixelData::Float32(a) => a.iter().for_each(|v| out.extend(v.to_le_bytes())),
            PixelData::Float64(a) => a.iter().for_each(|v| out.extend(v.to_le_bytes())),
            PixelData::Complex64(a) => a.iter().for_each(|v| {
                out.extend(v.re.to_le_bytes());
                out.extend(v.im.to_le_bytes());
            }),
            PixelData::Complex128(a) => a.iter().for_each(|v| {
                out.extend(v.re.to_le_bytes());
                out.extend(v.im.to_le_bytes());
            }),
        }
        out
    }
}

macro_rules! impl_from_array {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$ty>> for PixelData {
                fn from(array: ArrayD<$ty>) -> Self {
                    PixelData::$variant(array)
                }
            }
        )*
    };
}

impl_from_array! {
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    f32 => Float32,
    f64 => Float64,
    Complex<f32> => Complex64,
    Complex<f64> => Complex128,
}
