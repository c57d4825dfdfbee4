/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A fixed-size pool of worker threads fed by a shared FIFO queue.
//!
//! A [`WorkerPool`] spawns its threads immediately; each thread repeatedly
//! takes a [`Task`] from the [`TaskQueue`] and runs it. Tasks may submit
//! further tasks through the [`Submitter`] they receive, so a computation
//! can schedule itself. The owner of the pool decides when the computation
//! is over by passing a predicate to [`WorkerPool::stop_when`], which waits
//! until the predicate holds and then shuts the pool down.
//!
//! Workers wait on a condition variable when the queue is empty, and the
//! owner waits on another condition variable signaled every time a task
//! completes or a detached [`Submitter`] is dropped, so no thread ever spins.
//!
//! ```
//! use dsi_progress_logger::no_logging;
//! use graphsum::pool::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! type Countdown = (usize, Arc<AtomicUsize>);
//!
//! // Counts down from the argument, one task per step
//! fn countdown((n, count): Countdown, submitter: &Submitter<Countdown>) {
//!     count.fetch_add(1, Ordering::Relaxed);
//!     if n > 0 {
//!         submitter.submit(Task::new((n - 1, count), countdown));
//!     }
//! }
//!
//! let count = Arc::new(AtomicUsize::new(0));
//! let pool = WorkerPool::new(&PoolConfig::default(), no_logging![])?;
//! pool.submit(Task::new((9, count.clone()), countdown));
//! let stats = pool.stop_when(|| count.load(Ordering::Relaxed) == 10)?;
//! assert_eq!(stats.executed, 10);
//! # Ok::<(), PoolError>(())
//! ```

mod queue;
mod task;

pub use queue::TaskQueue;
pub use task::{Task, TaskFn};

use dsi_progress_logger::ConcurrentProgressLog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Errors raised by a [`WorkerPool`].
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("A worker pool needs at least one thread")]
    NoThreads,
    #[error("Could not spawn worker thread {index}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker thread {worker} panicked")]
    WorkerPanicked { worker: String },
    #[error("No task is left to run, but the stop predicate does not hold")]
    Stalled,
}

/// Configuration of a [`WorkerPool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// The number of worker threads.
    pub max_threads: usize,
    /// A soft limit on the number of queued tasks.
    ///
    /// The limit is never enforced: submission never blocks nor fails. The
    /// first time the queue grows beyond the limit a warning is logged.
    pub max_queued_tasks: Option<usize>,
}

impl PoolConfig {
    pub const DEFAULT_MAX_THREADS: usize = 4;
    pub const DEFAULT_MAX_QUEUED_TASKS: usize = 100;

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_max_queued_tasks(mut self, max_queued_tasks: Option<usize>) -> Self {
        self.max_queued_tasks = max_queued_tasks;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_threads: Self::DEFAULT_MAX_THREADS,
            max_queued_tasks: Some(Self::DEFAULT_MAX_QUEUED_TASKS),
        }
    }
}

/// Statistics returned by [`WorkerPool::stop_when`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// The number of worker threads.
    pub threads: usize,
    /// The number of submitted tasks.
    pub submitted: usize,
    /// The number of tasks that ran to completion or panicked.
    pub executed: usize,
}

#[derive(Default)]
struct Progress {
    /// Submitted tasks that have not completed yet.
    pending: usize,
    submitted: usize,
    completed: usize,
    /// Incremented whenever a task completes or a detached submitter is
    /// dropped.
    events: usize,
    /// Live detached submitters.
    detached: usize,
    panicked: Option<String>,
}

struct Shared<A> {
    queue: TaskQueue<A>,
    progress: Mutex<Progress>,
    /// Signaled every time `events` is incremented.
    changed: Condvar,
    max_queued_tasks: Option<usize>,
    warned: AtomicBool,
}

impl<A> Shared<A> {
    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(&self, task: Task<A>) {
        {
            let mut progress = self.progress();
            progress.pending += 1;
            progress.submitted += 1;
        }
        let len = self.queue.enqueue(task);
        if let Some(max_queued_tasks) = self.max_queued_tasks {
            if len > max_queued_tasks && !self.warned.swap(true, Ordering::Relaxed) {
                log::warn!(
                    "The task queue contains {} tasks, more than the suggested maximum of {}",
                    len,
                    max_queued_tasks
                );
            }
        }
    }
}

/// A handle that submits tasks to a [`WorkerPool`].
///
/// Every task function receives a submitter, which makes it possible to
/// submit tasks from within running tasks.
///
/// Submitters returned by [`WorkerPool::submitter`], and all clones of a
/// submitter, are *detached*: they can be moved to other threads, and while
/// any of them is alive [`WorkerPool::stop_when`] never reports
/// [`PoolError::Stalled`], since a task might still be submitted through it.
pub struct Submitter<A> {
    shared: Arc<Shared<A>>,
    detached: bool,
}

impl<A> Submitter<A> {
    fn detached(shared: &Arc<Shared<A>>) -> Self {
        shared.progress().detached += 1;
        Self {
            shared: Arc::clone(shared),
            detached: true,
        }
    }

    /// Submits a task. It never blocks nor fails.
    pub fn submit(&self, task: Task<A>) {
        self.shared.submit(task)
    }
}

impl<A> Clone for Submitter<A> {
    fn clone(&self) -> Self {
        Self::detached(&self.shared)
    }
}

impl<A> Drop for Submitter<A> {
    fn drop(&mut self) {
        if self.detached {
            let mut progress = self.shared.progress();
            progress.detached -= 1;
            progress.events += 1;
            drop(progress);
            self.shared.changed.notify_all();
        }
    }
}

/// Marks the completion of a task when dropped, even during unwinding.
struct TaskGuard<'a, A> {
    shared: &'a Shared<A>,
}

impl<A> Drop for TaskGuard<'_, A> {
    fn drop(&mut self) {
        let mut progress = self.shared.progress();
        progress.pending -= 1;
        progress.completed += 1;
        progress.events += 1;
        if thread::panicking() && progress.panicked.is_none() {
            let worker = thread::current()
                .name()
                .unwrap_or("<unnamed>")
                .to_owned();
            log::warn!("A task panicked in {}", worker);
            progress.panicked = Some(worker);
        }
        drop(progress);
        self.shared.changed.notify_all();
    }
}

fn work<A>(shared: Arc<Shared<A>>, mut pl: impl ConcurrentProgressLog) {
    let submitter = Submitter {
        shared: Arc::clone(&shared),
        detached: false,
    };
    log::debug!("{} started", thread::current().name().unwrap_or_default());
    while let Some(task) = shared.queue.dequeue_wait() {
        let guard = TaskGuard { shared: &shared };
        task.run(&submitter);
        drop(guard);
        pl.light_update();
    }
    log::debug!("{} exiting", thread::current().name().unwrap_or_default());
}

/// A fixed set of worker threads executing [tasks](Task) from a shared
/// [queue](TaskQueue).
///
/// A pool is created once, fed with [`submit`](WorkerPool::submit) (or
/// through [submitters](Submitter)), and shut down once with
/// [`stop_when`](WorkerPool::stop_when). Workers exit only when the queue
/// has been stopped *and* is empty, so every task submitted before shutdown
/// is executed.
///
/// Dropping a pool without calling [`stop_when`](WorkerPool::stop_when)
/// discards the queued tasks, and stops and joins the workers.
pub struct WorkerPool<A> {
    shared: Arc<Shared<A>>,
    workers: Vec<JoinHandle<()>>,
    num_threads: usize,
}

impl<A: Send + 'static> WorkerPool<A> {
    /// Creates a pool and spawns its worker threads, which start waiting for
    /// tasks immediately.
    ///
    /// Each worker receives a clone of `pl`, on which it performs a light
    /// update for every executed task; starting and stopping `pl` is up to
    /// the caller.
    pub fn new(
        config: &PoolConfig,
        pl: &mut (impl ConcurrentProgressLog + Send + 'static),
    ) -> Result<Self, PoolError> {
        if config.max_threads == 0 {
            return Err(PoolError::NoThreads);
        }

        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            progress: Mutex::new(Progress::default()),
            changed: Condvar::new(),
            max_queued_tasks: config.max_queued_tasks,
            warned: AtomicBool::new(false),
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(config.max_threads),
            num_threads: config.max_threads,
        };

        for index in 0..config.max_threads {
            let shared = Arc::clone(&pool.shared);
            let pl = pl.clone();
            // On failure, dropping the pool joins the workers spawned so far
            let handle = thread::Builder::new()
                .name(format!("graphsum-worker-{}", index))
                .spawn(move || work(shared, pl))
                .map_err(|source| PoolError::Spawn { index, source })?;
            pool.workers.push(handle);
        }

        log::info!("Started a pool of {} worker threads", config.max_threads);
        Ok(pool)
    }
}

impl<A> WorkerPool<A> {
    /// Returns the number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Submits a task. It never blocks nor fails.
    pub fn submit(&self, task: Task<A>) {
        self.shared.submit(task)
    }

    /// Returns a handle that submits tasks to this pool.
    pub fn submitter(&self) -> Submitter<A> {
        Submitter::detached(&self.shared)
    }

    /// Waits until `predicate` holds, then shuts the pool down.
    ///
    /// The predicate is evaluated immediately, and then every time some task
    /// completes or a [detached submitter](Submitter) is dropped; it is never
    /// evaluated while a lock of the pool is held, but it is evaluated while
    /// workers run, so it must be thread safe with respect to the tasks. Once the predicate holds, the queue is stopped,
    /// the workers drain it and exit, and they are joined: when this method
    /// returns, every task has completed and all its effects are visible to
    /// the caller.
    ///
    /// # Errors
    ///
    /// - [`PoolError::WorkerPanicked`] if a task panicked; the remaining
    ///   workers are joined after discarding the queued tasks.
    /// - [`PoolError::Stalled`] if the predicate does not hold, no task is
    ///   pending, no detached submitter is alive, and nothing happened since
    ///   its last evaluation, that is, if the predicate cannot become true
    ///   anymore as an effect of the tasks of the pool.
    pub fn stop_when(
        mut self,
        mut predicate: impl FnMut() -> bool,
    ) -> Result<PoolStats, PoolError> {
        let outcome = loop {
            let generation = self.shared.progress().events;
            let holds = predicate();

            let progress = self.shared.progress();
            if let Some(worker) = &progress.panicked {
                break Err(PoolError::WorkerPanicked {
                    worker: worker.clone(),
                });
            }
            if holds {
                break Ok(());
            }
            if progress.pending == 0 && progress.detached == 0 && progress.events == generation {
                break Err(PoolError::Stalled);
            }
            // Wait for something to happen after the predicate was evaluated
            drop(
                self.shared
                    .changed
                    .wait_while(progress, |progress| {
                        progress.events == generation && progress.panicked.is_none()
                    })
                    .unwrap_or_else(PoisonError::into_inner),
            );
        };

        if outcome.is_err() {
            self.shared.queue.clear();
        }
        let joined = self.join_workers();
        let discarded = self.shared.queue.clear();
        if discarded != 0 {
            log::debug!("Discarded {} queued tasks", discarded);
        }

        outcome?;
        joined?;

        let progress = self.shared.progress();
        Ok(PoolStats {
            threads: self.num_threads,
            submitted: progress.submitted,
            executed: progress.completed,
        })
    }

    /// Stops the queue and joins all workers.
    fn join_workers(&mut self) -> Result<(), PoolError> {
        self.shared.queue.stop();
        let mut result = Ok(());
        for handle in self.workers.drain(..) {
            let worker = handle.thread().name().unwrap_or_default().to_owned();
            if handle.join().is_err() && result.is_ok() {
                result = Err(PoolError::WorkerPanicked { worker });
            }
        }
        result
    }
}

impl<A> Drop for WorkerPool<A> {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            let discarded = self.shared.queue.clear();
            log::debug!(
                "Dropping a running pool, discarded {} queued tasks",
                discarded
            );
            let _ = self.join_workers();
        }
    }
}
