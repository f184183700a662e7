use thiserror::Error;

/// I/O errors that can occur when reading byte ranges from a loaded file
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },
}

/// Errors related to format detection
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// TIFF parsing error
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// File format is not supported
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },
}

/// Errors that can occur when parsing TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// The file contains no image directories
    #[error("TIFF file contains no pages")]
    NoPages,

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unsupported compression scheme
    #[error("Unsupported compression: {0} (only uncompressed data is supported)")]
    UnsupportedCompression(String),

    /// File uses tiles instead of strips
    #[error("Unsupported organization: file uses tiles instead of strips")]
    TileOrganization,

    /// Sample layout that cannot be mapped onto a grayscale array
    #[error("Unsupported sample layout: {bits_per_sample} bits, sample format {sample_format}, {samples_per_pixel} samples per pixel")]
    UnsupportedSampleLayout {
        bits_per_sample: u16,
        sample_format: u16,
        samples_per_pixel: u16,
    },

    /// Declared pixel data is larger than the file holding it
    #[error("Pixel data needs {needed} bytes but the file has {available}")]
    PixelDataTooLarge { needed: u64, available: u64 },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Malformed embedded metadata blob.
///
/// Recovered locally by the resolver, which then behaves as if no blob was present.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The blob is not valid JSON or has the wrong structure
    #[error("malformed metadata blob: {0}")]
    Json(#[from] serde_json::Error),

    /// The declared axis counts do not form a valid descriptor
    #[error("invalid axis counts in metadata blob: {collection} collection, {datum} datum")]
    InvalidAxisCounts { collection: usize, datum: usize },

    /// The timestamp cannot be represented
    #[error("invalid timestamp in metadata blob: {0}")]
    InvalidTimestamp(f64),
}

/// Inferred axis sizes that do not agree with the decoded pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeMismatchError {
    /// A native axis counter does not evenly divide the page count
    #[error("{hint} count {count} does not divide the page count {pages}")]
    Indivisible {
        hint: &'static str,
        count: usize,
        pages: usize,
    },

    /// The product of the inferred sizes differs from the element count
    #[error("cannot reshape {elements} elements to inferred shape {inferred:?}")]
    ElementCount {
        inferred: Vec<usize>,
        elements: usize,
    },
}

/// Axis layouts the container's six fixed slots cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedRankError {
    /// More than four logical axes
    #[error("cannot pack {0} axes, at most 4 are supported")]
    TooManyAxes(usize),

    /// A sequence of two-dimensional collections
    #[error("a sequence of 2D collections cannot be represented in a TZCYXS hyperstack")]
    SequenceOfCollections,

    /// The array carries no descriptor and none can be derived from its rank
    #[error("no axis descriptor for a {0}-dimensional array")]
    MissingDescriptor(usize),
}

/// Errors raised by a container encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecWriteError {
    /// ImageDescription is longer than the configured limit
    #[error("image description is {len} bytes, limit is {limit}")]
    DescriptionTooLong { len: usize, limit: usize },

    /// Classic TIFF offsets are 32-bit
    #[error("encoded file would be {size} bytes, which exceeds classic TIFF's 4 GiB limit")]
    FileTooLarge { size: u64 },

    /// Planes with a zero-sized dimension cannot be stored
    #[error("cannot encode an empty image with shape {0:?}")]
    EmptyImage(Vec<usize>),

    /// Pixel type the container does not store natively
    #[error("unsupported pixel type for encoding: {0}")]
    UnsupportedDataType(&'static str),

    /// The pixel buffer does not match the container shape
    #[error("pixel buffer with shape {actual:?} does not match container shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The TIFF encoder failed
    #[error("TIFF encoder error: {0}")]
    Tiff(String),

    /// Any other encoder rejection
    #[error("encoder rejected payload: {0}")]
    Rejected(String),
}

impl From<tiff::TiffError> for CodecWriteError {
    fn from(err: tiff::TiffError) -> Self {
        CodecWriteError::Tiff(err.to_string())
    }
}

/// Errors when assembling a [`crate::model::LogicalArray`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// Descriptor axis count differs from the pixel rank
    #[error("descriptor describes {descriptor} axes but data has {data}")]
    DescriptorMismatch { descriptor: usize, data: usize },

    /// Calibration list length differs from the pixel rank
    #[error("expected {expected} calibrations, got {actual}")]
    CalibrationCount { expected: usize, actual: usize },

    /// Axis counts outside the supported ranges
    #[error("invalid descriptor: {collection} collection axes, {datum} datum axes")]
    InvalidDescriptor { collection: usize, datum: usize },
}

/// Errors that can occur when parsing QSTEM `.img` files
#[derive(Debug, Clone, Error)]
pub enum ImgError {
    /// File ends before the header or data is complete
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// A header field has a value the reader cannot use
    #[error("Invalid header field {field}: {value}")]
    InvalidHeader { field: &'static str, value: i64 },

    /// Sample size / complex flag combination not supported
    #[error("Unsupported sample type: data_size {data_size}, complex {is_complex}")]
    UnsupportedSampleType { data_size: i32, is_complex: bool },
}

/// Errors surfaced by the write path.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The axis layout has no container mapping
    #[error(transparent)]
    UnsupportedRank(#[from] UnsupportedRankError),

    /// The encoder rejected both the full and the minimal payload
    #[error(transparent)]
    Codec(#[from] CodecWriteError),
}

/// Top-level error returned by I/O handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF parsing error
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// QSTEM parsing error
    #[error("IMG error: {0}")]
    Img(#[from] ImgError),

    /// Format detection error
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Write path error
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Handler cannot write this kind of file
    #[error("Handler {0} does not support writing")]
    WriteNotSupported(&'static str),

    /// No handler is registered for the file
    #[error("No handler registered for {0}")]
    NoHandler(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
