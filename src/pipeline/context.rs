//! Per-run shared state: the work queue, the stats guard, the cancel token and the first fatal error.
//! Built once per run by the coordinator and handed to the enumerator and dispatcher explicitly.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::PipelineError;
use crate::types::AggregateStats;

use super::queue::{CancelToken, WorkQueue};

/// Counters shared by the enumerator and every worker task. Each update takes the lock briefly;
/// the lock is never held across file or codec work.
#[derive(Clone, Debug, Default)]
pub struct SharedStats(Arc<Mutex<AggregateStats>>);

impl SharedStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AggregateStats> {
        // Counters stay meaningful even if a holder panicked mid-update.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_produced(&self) {
        self.lock().items_produced += 1;
    }

    pub fn record_consumed(&self, source_bytes: u64) {
        let mut stats = self.lock();
        stats.items_consumed += 1;
        stats.total_bytes_processed += source_bytes;
    }

    pub fn record_skipped(&self, path: PathBuf, reason: String) {
        let mut stats = self.lock();
        stats.items_skipped += 1;
        stats.skipped_paths.push((path, reason));
    }

    pub fn snapshot(&self) -> AggregateStats {
        self.lock().clone()
    }
}

/// Progress hook invoked once per finished item (processed or skipped).
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// Everything the two stages of one run share.
#[derive(Clone)]
pub struct PipelineContext {
    pub queue: Arc<WorkQueue>,
    pub stats: SharedStats,
    pub cancel: CancelToken,
    pub first_error: Arc<Mutex<Option<PipelineError>>>,
}

impl PipelineContext {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            queue: Arc::new(WorkQueue::new(cancel.clone())),
            stats: SharedStats::new(),
            cancel,
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Keep the first run-level error; later ones are logged and dropped.
    pub fn record_failure(&self, error: PipelineError) {
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            None => *slot = Some(error),
            Some(first) => log::debug!("Ignoring later failure ({}) after: {}", error, first),
        }
    }

    pub fn take_failure(&self) -> Option<PipelineError> {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// A pipeline stage run on its own thread by the coordinator.
pub trait Stage: Send + 'static {
    type Output: Send + 'static;

    /// Thread name for the stage.
    fn name(&self) -> &'static str;

    fn run(self) -> Result<Self::Output, PipelineError>;
}
