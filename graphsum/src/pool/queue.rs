/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::Task;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct QueueState<A> {
    tasks: VecDeque<Task<A>>,
    stopped: bool,
}

/// An unbounded, thread-safe FIFO queue of [tasks](Task).
///
/// All operations are serialized by a single lock, which also protects a
/// *stop* flag: once the queue has been [stopped](TaskQueue::stop),
/// [`dequeue_wait`](TaskQueue::dequeue_wait) keeps returning queued tasks, but
/// returns `None` instead of blocking when the queue is empty. The queue never
/// executes tasks, and no task is executed while its lock is held.
pub struct TaskQueue<A> {
    state: Mutex<QueueState<A>>,
    available: Condvar,
}

impl<A> Default for TaskQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TaskQueue<A> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                stopped: false,
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<A>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a task at the tail of the queue and returns the length of the
    /// queue after the insertion.
    ///
    /// One thread blocked in [`dequeue_wait`](TaskQueue::dequeue_wait), if
    /// any, is woken up.
    pub fn enqueue(&self, task: Task<A>) -> usize {
        let mut state = self.lock();
        state.tasks.push_back(task);
        let len = state.tasks.len();
        drop(state);
        self.available.notify_one();
        len
    }

    /// Removes and returns the task at the head of the queue, or returns
    /// `None` if the queue is empty. It never blocks.
    pub fn dequeue(&self) -> Option<Task<A>> {
        self.lock().tasks.pop_front()
    }

    /// Removes and returns the task at the head of the queue, waiting for
    /// one to be enqueued if necessary.
    ///
    /// Returns `None` only if the queue is empty and has been
    /// [stopped](TaskQueue::stop).
    pub fn dequeue_wait(&self) -> Option<Task<A>> {
        let mut state = self.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.stopped {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Sets the stop flag and wakes up all threads blocked in
    /// [`dequeue_wait`](TaskQueue::dequeue_wait).
    pub fn stop(&self) {
        self.lock().stopped = true;
        self.available.notify_all();
    }

    /// Returns whether the stop flag is set.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Returns the number of queued tasks.
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Drops all queued tasks without running them, returning their number.
    pub fn clear(&self) -> usize {
        let tasks = std::mem::take(&mut self.lock().tasks);
        tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Submitter;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn noop(_: usize, _: &Submitter<usize>) {}

    #[test]
    fn test_fifo() {
        let queue = TaskQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.enqueue(Task::new(1, noop)), 1);
        assert_eq!(queue.enqueue(Task::new(2, noop)), 2);
        assert_eq!(queue.enqueue(Task::new(3, noop)), 3);
        assert_eq!(queue.len(), 3);

        let order = std::iter::from_fn(|| queue.dequeue())
            .map(|task| *task.argument())
            .collect::<Vec<_>>();
        assert_eq!(order, [1, 2, 3]);
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_stopped_queue_drains() {
        let queue = TaskQueue::new();
        queue.enqueue(Task::new(1, noop));
        queue.enqueue(Task::new(2, noop));
        queue.stop();
        assert!(queue.is_stopped());
        assert_eq!(queue.dequeue_wait().map(|t| *t.argument()), Some(1));
        assert_eq!(queue.dequeue_wait().map(|t| *t.argument()), Some(2));
        assert!(queue.dequeue_wait().is_none());
        assert!(queue.dequeue_wait().is_none());
    }

    #[test]
    fn test_dequeue_wait_wakes_up() {
        let queue = Arc::new(TaskQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut received = vec![];
                while let Some(task) = queue.dequeue_wait() {
                    received.push(*task.argument());
                }
                received
            })
        };

        for i in 0..10 {
            queue.enqueue(Task::new(i, noop));
            thread::sleep(Duration::from_millis(1));
        }
        queue.stop();

        assert_eq!(consumer.join().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_clear() {
        let queue = TaskQueue::new();
        for i in 0..5 {
            queue.enqueue(Task::new(i, noop));
        }
        assert_eq!(queue.clear(), 5);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }
}
