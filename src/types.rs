//! Public and internal types for the jpegpress API and pipeline.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::utils::config::Defaults;

/// One source JPEG to compress. Created once by the enumerator, consumed once by one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    path: PathBuf,
}

impl WorkItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// What travels on the [`WorkQueue`](crate::pipeline::WorkQueue).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Work(WorkItem),
    /// End of stream. Posted once after enumeration, consumed once by the dispatcher.
    Terminator,
}

impl Message {
    pub fn is_terminator(&self) -> bool {
        matches!(self, Message::Terminator)
    }
}

/// Run-level counters. Mutated only under the stats guard, read after the run is terminal.
#[derive(Clone, Debug, Default)]
pub struct AggregateStats {
    pub items_produced: u64,
    pub items_consumed: u64,
    /// Items that failed to decode/encode/write. Kept apart from `items_consumed`.
    pub items_skipped: u64,
    pub total_bytes_processed: u64,
    /// (source path, reason) for every skipped item, in completion order.
    pub skipped_paths: Vec<(PathBuf, String)>,
}

impl AggregateStats {
    /// produced == consumed + skipped
    pub fn is_consistent(&self) -> bool {
        self.items_produced == self.items_consumed + self.items_skipped
    }
}

/// Summary reported at the end of a run (complete or partial).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub items_produced: u64,
    /// Successfully compressed files only.
    pub items_processed: u64,
    pub items_skipped: u64,
    pub elapsed_millis: u64,
    pub total_bytes_processed: u64,
    /// Whether produced == processed + skipped held when the run ended.
    pub consistent: bool,
}

impl RunSummary {
    pub fn from_stats(stats: &AggregateStats, elapsed_millis: u64) -> Self {
        Self {
            items_produced: stats.items_produced,
            items_processed: stats.items_consumed,
            items_skipped: stats.items_skipped,
            elapsed_millis,
            total_bytes_processed: stats.total_bytes_processed,
            consistent: stats.is_consistent(),
        }
    }
}

/// Lifecycle of one pipeline run. `Completed` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Preparing,
    Running,
    Draining,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Allowed forward transitions. Anything may fail; nothing goes back to `Running` once draining.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Preparing)
                | (Preparing, Running)
                | (Running, Draining)
                | (Draining, Completed)
                | (Idle | Preparing | Running | Draining, Failed)
        )
    }
}

/// Lib-facing options for [`compress_dir`](crate::compress_dir). Every field is optional; unset
/// fields take the defaults in [`Defaults`].
#[derive(Clone, Debug, Default)]
pub struct CompressionOpts {
    /// Encode quality in (0, 1]. 1.0 is best quality.
    pub quality: Option<f32>,
    /// Linear resize ratio in (0, 1] applied to width and height.
    pub scale: Option<f32>,
    /// Worker thread count. When None, uses rayon's thread count.
    pub workers: Option<usize>,
    /// Descend into subdirectories.
    pub recursive: Option<bool>,
    /// Pool submission backlog before `submit` blocks. When None, `workers * 4`.
    pub backlog: Option<usize>,
    /// Suffix appended to the file stem of every output. When None, `_compressed`.
    pub suffix: Option<String>,
}

/// Validated, immutable run configuration. Build with [`CompressionConfig::new`].
#[derive(Clone, Debug, PartialEq)]
pub struct CompressionConfig {
    quality: f32,
    scale: f32,
    workers: usize,
    recursive: bool,
    backlog: usize,
    suffix: String,
}

impl CompressionConfig {
    pub fn new(opts: &CompressionOpts) -> Result<Self, PipelineError> {
        let quality = opts.quality.unwrap_or(Defaults::QUALITY);
        let scale = opts.scale.unwrap_or(Defaults::SCALE);
        let workers = opts.workers.unwrap_or_else(Defaults::workers);
        let backlog = opts
            .backlog
            .unwrap_or(workers.saturating_mul(Defaults::BACKLOG_PER_WORKER));
        let suffix = opts
            .suffix
            .clone()
            .unwrap_or_else(|| Defaults::SUFFIX.to_string());

        check_unit_interval("quality", quality)?;
        check_unit_interval("scale", scale)?;
        if workers == 0 {
            return Err(PipelineError::Configuration(
                "workers must be at least 1".to_string(),
            ));
        }
        if backlog == 0 {
            return Err(PipelineError::Configuration(
                "backlog must be at least 1".to_string(),
            ));
        }
        if suffix.is_empty() || suffix.contains(std::path::is_separator) {
            return Err(PipelineError::Configuration(format!(
                "suffix {suffix:?} must be non-empty and contain no path separators"
            )));
        }

        Ok(Self {
            quality,
            scale,
            workers,
            recursive: opts.recursive.unwrap_or(false),
            backlog,
            suffix,
        })
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Quality mapped onto the encoder's 1..=100 scale.
    pub fn encoder_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn backlog(&self) -> usize {
        self.backlog
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<(), PipelineError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(PipelineError::Configuration(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}
