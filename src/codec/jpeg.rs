//! JPEG codec: decode with the `image` crate, encode with `jpeg-encoder` so every output gets
//! Huffman tables optimised for its own data.

use image::{DynamicImage, GenericImageView, ImageFormat};
use jpeg_encoder::{ColorType, Encoder};
use log::debug;

use super::markers::{app_segment_parts, extract_metadata_segments};
use super::{CodecError, Decoded, ImageCodec, ImageMetadata};

#[derive(Clone, Copy, Debug)]
pub struct JpegCodec {
    optimize_huffman: bool,
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self {
            optimize_huffman: true,
        }
    }
}

impl JpegCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// On by default. Off writes the standard tables from Annex K.
    pub fn with_optimized_huffman(mut self, enabled: bool) -> Self {
        self.optimize_huffman = enabled;
        self
    }
}

impl ImageCodec for JpegCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let raster = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
        let metadata = ImageMetadata::from_segments(extract_metadata_segments(bytes));
        Ok(Decoded { raster, metadata })
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        metadata: &ImageMetadata,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError> {
        let (width, height) = raster.dimensions();
        let too_large =
            || CodecError::Other(format!("{width}x{height} exceeds the JPEG size limit"));
        let w = u16::try_from(width).map_err(|_| too_large())?;
        let h = u16::try_from(height).map_err(|_| too_large())?;

        let mut encoded = Vec::new();
        let mut encoder = Encoder::new(&mut encoded, quality.clamp(1, 100));
        encoder.set_optimized_huffman_tables(self.optimize_huffman);
        for segment in metadata.segments() {
            match app_segment_parts(segment) {
                Some((number, payload)) => encoder.add_app_segment(number, payload)?,
                None => debug!("Dropping malformed metadata segment ({} bytes)", segment.len()),
            }
        }

        match raster {
            DynamicImage::ImageLuma8(gray) => encoder.encode(gray.as_raw(), w, h, ColorType::Luma)?,
            // JPEG has no alpha and the encoder only takes 8-bit samples.
            other => {
                let rgb = other.to_rgb8();
                encoder.encode(rgb.as_raw(), w, h, ColorType::Rgb)?
            }
        }
        Ok(encoded)
    }
}
