//! Consumer stage: the only reader of the work queue. Hands each item to the worker pool,
//! stops at the terminator, then drains the pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::codec::ImageCodec;
use crate::error::PipelineError;
use crate::types::{CompressionConfig, Message};

use super::compress::ItemCompressor;
use super::context::{PipelineContext, ProgressFn, Stage};
use super::pool::WorkerPool;

/// Returned by the dispatcher once its pool has drained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Items handed to the pool.
    pub items_dispatched: u64,
    /// Items that compressed successfully.
    pub items_consumed: u64,
    pub elapsed: Duration,
    pub total_bytes_processed: u64,
}

pub struct Dispatcher {
    config: Arc<CompressionConfig>,
    codec: Arc<dyn ImageCodec>,
    ctx: PipelineContext,
    progress: Option<ProgressFn>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<CompressionConfig>,
        codec: Arc<dyn ImageCodec>,
        ctx: PipelineContext,
        progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            config,
            codec,
            ctx,
            progress,
        }
    }

    /// Pop until the terminator. The terminator is neither re-pushed nor forwarded.
    fn dispatch_loop(
        &self,
        pool: &WorkerPool,
        compressor: &Arc<ItemCompressor>,
    ) -> Result<u64, PipelineError> {
        let mut dispatched = 0_u64;
        loop {
            match self.ctx.queue.pop()? {
                Message::Terminator => {
                    debug!("Terminator received after {} items", dispatched);
                    return Ok(dispatched);
                }
                Message::Work(item) => {
                    let compressor = Arc::clone(compressor);
                    pool.submit(Box::new(move || compressor.process(item)))?;
                    dispatched += 1;
                }
            }
        }
    }
}

impl Stage for Dispatcher {
    type Output = DispatchSummary;

    fn name(&self) -> &'static str {
        "dispatcher"
    }

    fn run(self) -> Result<DispatchSummary, PipelineError> {
        let start = Instant::now();
        let pool = WorkerPool::new(
            self.config.workers(),
            self.config.backlog(),
            self.ctx.cancel.clone(),
        )?;
        debug!(
            "Worker pool: {} threads, backlog {}",
            pool.size(),
            self.config.backlog()
        );
        let compressor = Arc::new(ItemCompressor::new(
            Arc::clone(&self.codec),
            &self.config,
            self.ctx.stats.clone(),
            self.progress.clone(),
        ));

        let dispatched = self.dispatch_loop(&pool, &compressor);
        // Drain whatever was submitted even when the loop failed.
        let drained = pool.drain();
        let dispatched = dispatched?;
        drained?;

        let elapsed = start.elapsed();
        let stats = self.ctx.stats.snapshot();
        info!("Total number of processed images: {}", stats.items_consumed);
        info!("Images processed in {} ms", elapsed.as_millis());
        info!(
            "Total size of processed files: {} MB",
            stats.total_bytes_processed / 1024 / 1024
        );
        Ok(DispatchSummary {
            items_dispatched: dispatched,
            items_consumed: stats.items_consumed,
            elapsed,
            total_bytes_processed: stats.total_bytes_processed,
        })
    }
}
