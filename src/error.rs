//! Error taxonomy for a compression run.
//!
//! Per-item variants ([`PipelineError::ItemDecode`], [`PipelineError::ItemEncode`]) are caught at
//! the task boundary and only ever logged and counted. Everything else is run-level and ends the
//! run in the `Failed` state.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::RunSummary;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid root or option values. The run never starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The tree became unreadable while it was being walked.
    #[error("enumeration failed at {}: {reason}", .path.display())]
    Enumeration { path: PathBuf, reason: String },

    #[error("cannot decode {}: {reason}", .path.display())]
    ItemDecode { path: PathBuf, reason: String },

    #[error("cannot encode or write {}: {reason}", .path.display())]
    ItemEncode { path: PathBuf, reason: String },

    /// External interruption (Ctrl+C or a tripped [`CancelToken`](crate::pipeline::CancelToken)).
    #[error("run cancelled")]
    Cancelled,

    #[error(
        "produced {produced} items but consumed {consumed} and skipped {skipped}; counts do not add up"
    )]
    Consistency {
        produced: u64,
        consumed: u64,
        skipped: u64,
    },

    #[error("message pushed after the terminator")]
    QueueClosed,

    #[error("{0} thread panicked")]
    StagePanicked(String),

    #[error("worker pool no longer accepts tasks")]
    PoolClosed,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }
}

/// A run that ended in the `Failed` state, with whatever was counted before it stopped.
///
/// `partial` is `None` when the run failed during preparation (nothing was started).
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: PipelineError,
    pub partial: Option<RunSummary>,
}
