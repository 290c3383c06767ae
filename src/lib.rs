//! jpegpress: batch JPEG recompression over a directory tree.
//!
//! A producer thread walks the tree and queues every JPEG; a dispatcher thread drains the queue
//! in order into a fixed worker pool that decodes, resizes, re-encodes and writes
//! `<stem>_compressed.<ext>` next to each source. See [`pipeline`] for the moving parts.

pub mod codec;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use error::{PipelineError, RunFailure};
pub use pipeline::{CancelToken, Pipeline};

use log::debug;
use std::path::Path;

/// Result alias used by the high-level jpegpress API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: compress every JPEG under `root` with `opts` and return the run summary.
///
/// Fails if the options are invalid, the root is not a directory, the walk breaks, or the run is
/// cancelled. Files that fail to decode or encode are skipped and counted in
/// [`RunSummary::items_skipped`]; they do not fail the run.
///
/// For cancellation, progress or a custom codec, build a [`Pipeline`] directly.
pub fn compress_dir(root: &Path, opts: &CompressionOpts) -> Result<RunSummary> {
    let config = CompressionConfig::new(opts)?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        config
    );
    let summary = Pipeline::new(root, config).run()?;
    Ok(summary)
}
