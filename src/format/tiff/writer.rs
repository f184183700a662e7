//! Writing ImageJ hyperstacks.
//!
//! Pages are encoded with the `tiff` crate as classic, uncompressed,
//! single-sample TIFF, one page per `T*Z*C` plane in that order. The first
//! page carries the ImageJ description and the Software tag; every page
//! carries the resolution tags.

use std::io::{Cursor, Seek, Write};

use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{Rational as TiffRational, TiffEncoder, TiffValue};
use tiff::tags::{ResolutionUnit as TiffResolutionUnit, Tag};
use tracing::debug;

use crate::config::Config;
use crate::error::CodecWriteError;
use crate::model::{ContainerShape, PixelData};
use crate::shape::{ContainerEncoder, PackedImage};

use super::imagej::{escape_non_ascii, ImageJDescription};
use super::values::Rational;

/// Room reserved for the header and per-page IFDs when sizing a file
const STRUCTURE_BYTES_PER_PAGE: u64 = 512;

/// Encodes [`PackedImage`]s as ImageJ hyperstack TIFF files.
#[derive(Debug, Clone)]
pub struct HyperstackEncoder {
    software: String,
    imagej_version: String,
    max_description_bytes: usize,
}

impl HyperstackEncoder {
    pub fn new(config: &Config) -> Self {
        Self {
            software: escape_non_ascii(&config.software),
            imagej_version: config.imagej_version.clone(),
            max_description_bytes: config.max_description_bytes,
        }
    }

    /// Build the ImageJ description for a packed image.
    pub fn description(&self, image: &PackedImage) -> String {
        let shape = &image.shape;
        let pages = shape.page_count();
        let count = |n: usize| (n > 1).then_some(n);
        ImageJDescription {
            version: self.imagej_version.clone(),
            images: count(pages),
            channels: count(shape.channels()),
            slices: count(shape.slices()),
            frames: count(shape.frames()),
            hyperstack: pages > 1,
            unit: (!image.unit.is_empty()).then(|| image.unit.clone()),
            blob: image.embedded_blob.clone(),
        }
        .build()
    }

    fn validate(&self, image: &PackedImage, description: &str) -> Result<(), CodecWriteError> {
        let shape = image.shape.as_slice();
        if image.pixels.shape() != shape {
            return Err(CodecWriteError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: image.pixels.shape().to_vec(),
            });
        }
        if shape.contains(&0) {
            return Err(CodecWriteError::EmptyImage(shape.to_vec()));
        }
        if !image.pixels.dtype().is_container_native() {
            return Err(CodecWriteError::UnsupportedDataType(image.pixels.dtype().name()));
        }
        if image.shape.0[ContainerShape::S] != 1 {
            return Err(CodecWriteError::Rejected(format!(
                "{} samples per pixel, only grayscale pages are written",
                image.shape.0[ContainerShape::S]
            )));
        }
        if description.len() + 1 > self.max_description_bytes {
            return Err(CodecWriteError::DescriptionTooLong {
                len: description.len() + 1,
                limit: self.max_description_bytes,
            });
        }

        let pages = image.shape.page_count() as u64;
        let size = (image.pixels.len() * image.pixels.dtype().size_in_bytes()) as u64
            + pages * STRUCTURE_BYTES_PER_PAGE
            + description.len() as u64;
        if size > u32::MAX as u64 {
            return Err(CodecWriteError::FileTooLarge { size });
        }
        Ok(())
    }

    /// Write every plane of `samples` as one page.
    fn write_pages<C, W>(
        &self,
        tiff: &mut TiffEncoder<W>,
        image: &PackedImage,
        description: &str,
        samples: &[C::Inner],
    ) -> tiff::TiffResult<()>
    where
        C: ColorType,
        W: Write + Seek,
        [C::Inner]: TiffValue,
    {
        let width = image.shape.width() as u32;
        let height = image.shape.height() as u32;
        let plane_len = image.shape.width() * image.shape.height();

        for (index, plane) in samples.chunks(plane_len).enumerate() {
            let mut page = tiff.new_image::<C>(width, height)?;
            if index == 0 {
                let tags = page.encoder();
                tags.write_tag(Tag::ImageDescription, description)?;
                tags.write_tag(Tag::Software, self.software.as_str())?;
            }
            page.x_resolution(to_tiff_rational(image.x_resolution));
            page.y_resolution(to_tiff_rational(image.y_resolution));
            page.resolution_unit(TiffResolutionUnit::None);
            page.write_data(plane)?;
        }
        Ok(())
    }
}

impl ContainerEncoder for HyperstackEncoder {
    fn encode(&self, image: &PackedImage) -> Result<Vec<u8>, CodecWriteError> {
        let description = self.description(image);
        self.validate(image, &description)?;

        let mut out = Cursor::new(Vec::new());
        let mut tiff = TiffEncoder::new(&mut out)?;
        match &image.pixels {
            PixelData::UInt8(a) => {
                let samples: Vec<u8> = a.iter().copied().collect();
                self.write_pages::<colortype::Gray8, _>(&mut tiff, image, &description, &samples)?
            }
            PixelData::UInt16(a) => {
                let samples: Vec<u16> = a.iter().copied().collect();
                self.write_pages::<colortype::Gray16, _>(&mut tiff, image, &description, &samples)?
            }
            PixelData::Float32(a) => {
                let samples: Vec<f32> = a.iter().copied().collect();
                self.write_pages::<colortype::Gray32Float, _>(
                    &mut tiff,
                    image,
                    &description,
                    &samples,
                )?
            }
            other => return Err(CodecWriteError::UnsupportedDataType(other.dtype().name())),
        }
        drop(tiff);

        let bytes = out.into_inner();
        debug!(
            pages = image.shape.page_count(),
            bytes = bytes.len(),
            blob = image.embedded_blob.is_some(),
            "Encoded hyperstack"
        );
        Ok(bytes)
    }
}

fn to_tiff_rational(r: Rational) -> TiffRational {
    TiffRational {
        n: r.numerator,
        d: r.denominator,
    }
}
