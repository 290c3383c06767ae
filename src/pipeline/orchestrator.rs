//! Run coordinator: owns the run state, starts the enumerator and dispatcher on named threads,
//! collects the first fatal error and builds the summary.

use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::codec::{ImageCodec, JpegCodec};
use crate::error::{PipelineError, RunFailure};
use crate::types::{CompressionConfig, Message, RunState, RunSummary};

use super::context::{PipelineContext, ProgressFn, Stage};
use super::dispatch::Dispatcher;
use super::error_handler::{check_consistency, report_skipped_items};
use super::queue::CancelToken;
use super::walk::{PathEnumerator, check_root};

/// Coordinates one compression run: enumerator and dispatcher on their own threads over a fresh
/// queue and stats, then the produced/consumed cross-check.
///
/// A `Pipeline` can be run more than once; every run gets its own queue and counters.
pub struct Pipeline {
    root: PathBuf,
    config: Arc<CompressionConfig>,
    codec: Arc<dyn ImageCodec>,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
    state: Arc<Mutex<RunState>>,
}

impl Pipeline {
    pub fn new(root: &Path, config: CompressionConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config: Arc::new(config),
            codec: Arc::new(JpegCodec::new()),
            cancel: CancelToken::new(),
            progress: None,
            state: Arc::new(Mutex::new(RunState::Idle)),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: RunState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // A finished run may start over.
        let current = if state.is_terminal() && next == RunState::Preparing {
            RunState::Idle
        } else {
            *state
        };
        if current.can_transition_to(next) {
            debug!("Run state {:?} -> {:?}", current, next);
            *state = next;
        } else {
            error!("Ignoring invalid run state change {:?} -> {:?}", current, next);
        }
    }

    fn fail(&self, error: PipelineError, partial: Option<RunSummary>) -> RunFailure {
        self.transition(RunState::Failed);
        error!("Run failed: {}", error);
        RunFailure { error, partial }
    }

    /// Run the pipeline to a terminal state.
    pub fn run(&self) -> Result<RunSummary, RunFailure> {
        let start = Instant::now();
        self.transition(RunState::Preparing);
        if let Err(e) = check_root(&self.root) {
            return Err(self.fail(e, None));
        }

        let ctx = PipelineContext::new(self.cancel.clone());
        let enumerator = PathEnumerator::new(
            &self.root,
            self.config.recursive(),
            self.config.suffix(),
            ctx.clone(),
        );
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.config),
            Arc::clone(&self.codec),
            ctx.clone(),
            self.progress.clone(),
        );

        self.transition(RunState::Running);
        let dispatch_handle = match spawn_stage(dispatcher) {
            Ok(h) => h,
            Err(e) => return Err(self.fail(e, None)),
        };
        let walked = spawn_stage(enumerator).and_then(join_stage);
        if let Err(e) = walked {
            // Make sure the dispatcher still sees an end of stream.
            if !ctx.queue.is_terminated() {
                let _ = ctx.queue.push(Message::Terminator);
            }
            ctx.record_failure(e);
        }

        self.transition(RunState::Draining);
        if let Err(e) = join_stage(dispatch_handle) {
            ctx.record_failure(e);
        }

        let stats = ctx.stats.snapshot();
        let summary = RunSummary::from_stats(&stats, start.elapsed().as_millis() as u64);
        report_skipped_items(&stats);

        if let Some(e) = ctx.take_failure() {
            return Err(self.fail(e, Some(summary)));
        }
        if let Err(e) = check_consistency(&stats) {
            // Reported through `summary.consistent`; the run still completes.
            error!("{}", e);
        }
        self.transition(RunState::Completed);
        info!(
            "Run completed: {} of {} files compressed ({} skipped) in {} ms",
            summary.items_processed,
            summary.items_produced,
            summary.items_skipped,
            summary.elapsed_millis
        );
        Ok(summary)
    }
}

type StageHandle<T> = JoinHandle<Result<T, PipelineError>>;

fn spawn_stage<S: Stage>(stage: S) -> Result<StageHandle<S::Output>, PipelineError> {
    thread::Builder::new()
        .name(stage.name().to_string())
        .spawn(move || stage.run())
        .map_err(|e| PipelineError::io("spawn pipeline thread", e))
}

fn join_stage<T>(handle: StageHandle<T>) -> Result<T, PipelineError> {
    let name = handle.thread().name().unwrap_or("stage").to_string();
    handle
        .join()
        .map_err(|_| PipelineError::StagePanicked(name))?
}
