//! Per-run work queue and the cancel token shared by every blocking wait in the pipeline.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::PipelineError;
use crate::types::Message;
use crate::utils::config::CANCEL_POLL_INTERVAL;

/// External interruption flag. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the token has been tripped.
    pub fn check(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Unbounded FIFO of [`Message`]s between the enumerator and the dispatcher.
///
/// `push` never blocks. `pop` blocks until a message arrives or the cancel token trips.
/// At most one [`Message::Terminator`] is ever accepted and nothing is accepted after it.
pub struct WorkQueue {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    terminated: AtomicBool,
    cancel: CancelToken,
}

impl WorkQueue {
    pub fn new(cancel: CancelToken) -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            terminated: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn push(&self, message: Message) -> Result<(), PipelineError> {
        self.cancel.check()?;
        let closing = message.is_terminator();
        if closing {
            if self.terminated.swap(true, Ordering::AcqRel) {
                return Err(PipelineError::QueueClosed);
            }
        } else if self.terminated.load(Ordering::Acquire) {
            return Err(PipelineError::QueueClosed);
        }
        // We hold a receiver, so the channel can't be disconnected.
        self.tx
            .send(message)
            .map_err(|_| PipelineError::QueueClosed)
    }

    pub fn pop(&self) -> Result<Message, PipelineError> {
        loop {
            self.cancel.check()?;
            match self.rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(message) => return Ok(message),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(PipelineError::QueueClosed),
            }
        }
    }

    /// Whether the terminator has been pushed (it may not have been popped yet).
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
