//! Per-item work: read, decode, resize, re-encode, write the sibling output.
//!
//! Failures here only ever skip the one item; they are logged and counted, never propagated.

use image::DynamicImage;
use image::imageops::FilterType;
use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::ImageCodec;
use crate::engine::tools::{destination_path, target_dimensions};
use crate::error::PipelineError;
use crate::types::{CompressionConfig, WorkItem};
use crate::utils::tempfiles::write_atomically;

use super::context::{ProgressFn, SharedStats};

/// Resampling filter for downscaling.
const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// What a successful item produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedItem {
    pub destination: PathBuf,
    pub source_bytes: u64,
    pub output_bytes: u64,
    pub dimensions: (u32, u32),
}

/// Shared by every task of a run (wrapped in an `Arc` by the dispatcher).
pub struct ItemCompressor {
    codec: Arc<dyn ImageCodec>,
    quality: u8,
    scale: f32,
    suffix: String,
    stats: SharedStats,
    progress: Option<ProgressFn>,
}

impl ItemCompressor {
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        config: &CompressionConfig,
        stats: SharedStats,
        progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            codec,
            quality: config.encoder_quality(),
            scale: config.scale(),
            suffix: config.suffix().to_string(),
            stats,
            progress,
        }
    }

    /// Task body: compress one item and record the outcome. Never fails; a panic inside the
    /// codec is recorded as a skipped item.
    pub fn process(&self, item: WorkItem) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.compress(item.path())))
            .unwrap_or_else(|_| {
                Err(PipelineError::ItemEncode {
                    path: item.path().to_path_buf(),
                    reason: "panicked during compression".to_string(),
                })
            });
        match outcome {
            Ok(done) => {
                debug!(
                    "Compressed {} -> {} ({} -> {} bytes, {}x{})",
                    item.path().display(),
                    done.destination.display(),
                    done.source_bytes,
                    done.output_bytes,
                    done.dimensions.0,
                    done.dimensions.1
                );
                self.stats.record_consumed(done.source_bytes);
            }
            Err(e) => {
                warn!("Skipping {}: {}", item.path().display(), e);
                self.stats.record_skipped(item.into_path(), e.to_string());
            }
        }
        if let Some(progress) = &self.progress {
            progress(1);
        }
    }

    /// Steps 1-5 for one source file. Source files are only ever read.
    pub fn compress(&self, source: &Path) -> Result<CompressedItem, PipelineError> {
        let decode_err = |reason: String| PipelineError::ItemDecode {
            path: source.to_path_buf(),
            reason,
        };
        let encode_err = |reason: String| PipelineError::ItemEncode {
            path: source.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(source).map_err(|e| decode_err(e.to_string()))?;
        let decoded = self
            .codec
            .decode(&bytes)
            .map_err(|e| decode_err(e.to_string()))?;

        let destination = destination_path(source, &self.suffix)
            .ok_or_else(|| encode_err("source has no file name".to_string()))?;
        let (width, height) = target_dimensions(
            decoded.raster.width(),
            decoded.raster.height(),
            self.scale,
        );
        let raster = resize(decoded.raster, width, height);

        let encoded = self
            .codec
            .encode(&raster, &decoded.metadata, self.quality)
            .map_err(|e| encode_err(e.to_string()))?;
        write_atomically(&destination, &encoded).map_err(|e| encode_err(e.to_string()))?;

        Ok(CompressedItem {
            destination,
            source_bytes: bytes.len() as u64,
            output_bytes: encoded.len() as u64,
            dimensions: (width, height),
        })
    }
}

fn resize(raster: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if raster.width() == width && raster.height() == height {
        return raster;
    }
    raster.resize_exact(width, height, RESIZE_FILTER)
}
