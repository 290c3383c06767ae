//! Pipeline components: work queue, enumerator (producer), dispatcher + worker pool (consumer),
//! and the coordinator that runs both and cross-checks their counts.

pub mod compress;
pub mod context;
pub mod dispatch;
pub mod error_handler;
pub mod orchestrator;
pub mod pool;
pub mod queue;
pub mod walk;

pub use compress::{CompressedItem, ItemCompressor};
pub use context::{PipelineContext, ProgressFn, SharedStats, Stage};
pub use dispatch::{DispatchSummary, Dispatcher};
pub use error_handler::{check_consistency, report_skipped_items};
pub use orchestrator::Pipeline;
pub use pool::{Task, WorkerPool};
pub use queue::{CancelToken, WorkQueue};
pub use walk::{PathEnumerator, WalkOutcome, check_root, to_outcome_walkdir};
