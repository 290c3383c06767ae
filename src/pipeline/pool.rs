//! Fixed-size worker pool with a bounded submission backlog.
//!
//! `submit` blocks while the backlog is full (it never drops work). `drain` closes the pool and
//! waits until every task submitted before it has finished. Both waits give up when the cancel
//! token trips; queued tasks that have not started by then are discarded, running ones finish.

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::error::PipelineError;
use crate::utils::config::CANCEL_POLL_INTERVAL;

use super::queue::CancelToken;

/// A unit of work run on one pool thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    task_tx: Option<Sender<Task>>,
    /// Disconnects once every worker has exited; lets `drain` wait with a timeout.
    exited_rx: Receiver<()>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancelToken,
}

/// Single worker: run tasks until the task channel closes.
/// `_exited` is dropped when the thread ends, which is how `drain` learns the worker is done.
fn worker_loop(task_rx: Receiver<Task>, cancel: CancelToken, _exited: Sender<()>) {
    while let Ok(task) = task_rx.recv() {
        if cancel.is_cancelled() {
            continue;
        }
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            log::error!("A compression task panicked; the worker keeps running");
        }
    }
}

impl WorkerPool {
    /// Spawn `size` workers sharing a task channel of capacity `backlog`.
    pub fn new(size: usize, backlog: usize, cancel: CancelToken) -> Result<Self, PipelineError> {
        if size == 0 {
            return Err(PipelineError::Configuration(
                "worker pool needs at least one thread".to_string(),
            ));
        }
        let (task_tx, task_rx) = bounded::<Task>(backlog.max(1));
        let (exited_tx, exited_rx) = bounded::<()>(0);

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let task_rx = task_rx.clone();
            let cancel = cancel.clone();
            let exited_tx = exited_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || worker_loop(task_rx, cancel, exited_tx))
                .map_err(|e| PipelineError::io("spawn worker thread", e))?;
            workers.push(handle);
        }

        Ok(Self {
            task_tx: Some(task_tx),
            exited_rx,
            workers,
            cancel,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task. Blocks while the backlog is full; fails once closed or cancelled.
    pub fn submit(&self, task: Task) -> Result<(), PipelineError> {
        let tx = self.task_tx.as_ref().ok_or(PipelineError::PoolClosed)?;
        let mut task = task;
        loop {
            self.cancel.check()?;
            match tx.send_timeout(task, CANCEL_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) => task = back,
                Err(SendTimeoutError::Disconnected(_)) => return Err(PipelineError::PoolClosed),
            }
        }
    }

    /// Stop accepting tasks. Workers finish the backlog and exit.
    pub fn close(&mut self) {
        self.task_tx.take();
    }

    pub fn is_closed(&self) -> bool {
        self.task_tx.is_none()
    }

    /// Close, then block until every submitted task has finished.
    /// On cancellation the wait is abandoned and the workers are left to wind down on their own.
    pub fn drain(mut self) -> Result<(), PipelineError> {
        self.close();
        loop {
            match self.exited_rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Err(RecvTimeoutError::Disconnected) => break,
                Ok(()) | Err(RecvTimeoutError::Timeout) => self.cancel.check()?,
            }
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
        if self.cancel.is_cancelled() {
            // Detach: running tasks are not aborted, and we don't wait on them either.
            self.workers.clear();
            return;
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[test]
    fn test_drain_waits_for_all_tasks() {
        let pool = WorkerPool::new(3, 2, CancelToken::new()).unwrap();
        assert_eq!(pool.size(), 3);
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let done = Arc::clone(&done);
            pool.submit(Box::new(move || {
                thread::sleep(Duration::from_millis(5));
                done.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        pool.drain().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_submit_after_close_fails() {
        let mut pool = WorkerPool::new(1, 1, CancelToken::new()).unwrap();
        pool.close();
        assert!(pool.is_closed());
        assert!(matches!(
            pool.submit(Box::new(|| {})),
            Err(PipelineError::PoolClosed)
        ));
    }

    #[test]
    fn test_panicking_task_does_not_kill_pool() {
        let pool = WorkerPool::new(1, 4, CancelToken::new()).unwrap();
        let done = Arc::new(AtomicUsize::new(0));
        pool.submit(Box::new(|| panic!("boom"))).unwrap();
        let counter = Arc::clone(&done);
        pool.submit(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();
        pool.drain().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(WorkerPool::new(0, 1, CancelToken::new()).is_err());
    }

    #[test]
    fn test_cancel_aborts_drain() {
        let cancel = CancelToken::new();
        let pool = WorkerPool::new(1, 1, cancel.clone()).unwrap();
        pool.submit(Box::new(|| thread::sleep(Duration::from_millis(400))))
            .unwrap();
        let canceller = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                cancel.cancel();
            })
        };
        let start = Instant::now();
        assert!(matches!(pool.drain(), Err(PipelineError::Cancelled)));
        assert!(start.elapsed() < Duration::from_millis(350));
        canceller.join().unwrap();
    }
}
