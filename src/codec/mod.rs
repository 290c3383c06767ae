//! Image codec collaborator: decode JPEG bytes to a raster plus metadata, encode a raster back.
//!
//! The pipeline only talks to [`ImageCodec`]; [`JpegCodec`] is the production implementation.

pub mod jpeg;
pub mod markers;

use image::DynamicImage;
use thiserror::Error;

pub use jpeg::JpegCodec;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Encode(#[from] jpeg_encoder::EncodingError),
    #[error("{0}")]
    Other(String),
}

/// Metadata carried from the source to the output. Raw APPn segments (marker + length + payload),
/// in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    segments: Vec<Vec<u8>>,
}

impl ImageMetadata {
    pub fn from_segments(segments: Vec<Vec<u8>>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Result of [`ImageCodec::decode`].
pub struct Decoded {
    pub raster: DynamicImage,
    pub metadata: ImageMetadata,
}

/// Decode/encode capability used by the workers. Must be shareable across worker threads.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError>;

    /// Encode `raster` at `quality` (1..=100), reattaching `metadata` where the format allows.
    fn encode(
        &self,
        raster: &DynamicImage,
        metadata: &ImageMetadata,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError>;
}
