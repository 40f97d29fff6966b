//! Bounded-concurrency task queue
//!
//! Runs at most `max_concurrency` futures at a time on the tokio runtime.
//! Tasks submitted while the queue is full wait in FIFO order and start as
//! slots free up. A failing or panicking task still releases its slot, and
//! its outcome is only observed through its own [`TaskHandle`].
//!
//! [`BoundedTaskQueue::await_all`] waits on the live running + pending
//! count rather than a snapshot, so tasks may keep submitting more tasks
//! (e.g. recursion) while someone is waiting for the queue to drain.

use crate::error::QueueError;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Notify};

type Job = BoxFuture<'static, ()>;

/// Bounded-concurrency async task runner
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct BoundedTaskQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    max_concurrency: usize,
    state: Mutex<QueueState>,
    idle: Notify,
}

#[derive(Default)]
struct QueueState {
    running: usize,
    pending: VecDeque<Job>,
    completed: u64,
}

impl BoundedTaskQueue {
    /// Create queue running at most `max_concurrency` tasks at once
    ///
    /// A width of zero is treated as one.
    #[must_use]
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                max_concurrency: max_concurrency.max(1),
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Submit a task
    ///
    /// Starts immediately if a slot is free, otherwise queues behind earlier
    /// submissions. Must be called from within a tokio runtime.
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = async move {
            let output = task.await;
            // Receiver may have been dropped; the task still counts as done.
            let _ = tx.send(output);
        }
        .boxed();

        let start_now = {
            let mut state = self.inner.state.lock();
            if state.running < self.inner.max_concurrency {
                state.running += 1;
                Some(job)
            } else {
                state.pending.push_back(job);
                None
            }
        };

        if let Some(job) = start_now {
            launch(Arc::clone(&self.inner), job);
        }

        TaskHandle { rx }
    }

    /// Wait until no task is running or pending
    pub async fn await_all(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Maximum number of concurrently running tasks
    #[inline]
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency
    }

    /// Tasks currently running
    #[must_use]
    pub fn running(&self) -> usize {
        self.inner.state.lock().running
    }

    /// Tasks waiting for a slot
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Tasks finished since creation, including failed ones
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.inner.state.lock().completed
    }
}

impl fmt::Debug for BoundedTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BoundedTaskQueue")
            .field("max_concurrency", &self.inner.max_concurrency)
            .field("running", &state.running)
            .field("pending", &state.pending.len())
            .field("completed", &state.completed)
            .finish()
    }
}

impl QueueInner {
    fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.running == 0 && state.pending.is_empty()
    }
}

fn launch(inner: Arc<QueueInner>, job: Job) {
    tokio::spawn(async move {
        let _slot = SlotGuard(inner);
        job.await;
    });
}

/// Releases the slot when the task ends, including by panic
struct SlotGuard(Arc<QueueInner>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let inner = &self.0;
        let (next, became_idle) = {
            let mut state = inner.state.lock();
            state.completed += 1;
            match state.pending.pop_front() {
                // Slot passes straight to the next job; running stays unchanged.
                Some(job) => (Some(job), false),
                None => {
                    state.running -= 1;
                    (None, state.running == 0)
                }
            }
        };

        if let Some(job) = next {
            launch(Arc::clone(inner), job);
        } else if became_idle {
            inner.idle.notify_waiters();
        }
    }
}

/// Result of one submitted task
///
/// Resolves to `Err(QueueError::TaskAborted)` if the task panicked or was
/// dropped before finishing.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| QueueError::TaskAborted))
    }
}
