//! End-of-run reporting: the skipped-file list and the produced/consumed cross-check.

use log::{debug, warn};

use crate::error::PipelineError;
use crate::types::AggregateStats;
use crate::utils::config::SKIPPED_LIST_THRESHOLD;

/// Log the files that were skipped: the first few at warn, all of them at debug.
pub fn report_skipped_items(stats: &AggregateStats) {
    if stats.skipped_paths.is_empty() {
        return;
    }
    warn!(
        "Skipped {} files that could not be decoded, encoded or written",
        stats.skipped_paths.len()
    );
    for (i, (path, reason)) in stats.skipped_paths.iter().enumerate() {
        if i < SKIPPED_LIST_THRESHOLD {
            warn!("  skipped: {} ({})", path.display(), reason);
        } else {
            debug!("  skipped: {} ({})", path.display(), reason);
        }
    }
}

/// Cross-check produced against consumed + skipped.
pub fn check_consistency(stats: &AggregateStats) -> Result<(), PipelineError> {
    if stats.is_consistent() {
        return Ok(());
    }
    Err(PipelineError::Consistency {
        produced: stats.items_produced,
        consumed: stats.items_consumed,
        skipped: stats.items_skipped,
    })
}
