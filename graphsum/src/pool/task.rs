/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::Submitter;
use std::fmt;

/// The function executed by a [`Task`].
///
/// It receives the argument of the task by value and a [`Submitter`] it can
/// use to submit further tasks to the pool running it.
pub type TaskFn<A> = fn(A, &Submitter<A>);

/// A unit of deferred work: an argument and the function to invoke on it.
///
/// The task owns its argument. Running the task moves the argument into the
/// function, so the argument is consumed exactly once and released as soon
/// as the function returns.
pub struct Task<A> {
    argument: A,
    function: TaskFn<A>,
}

impl<A> Task<A> {
    /// Creates a task that will invoke `function` on `argument`.
    pub fn new(argument: A, function: TaskFn<A>) -> Self {
        Self { argument, function }
    }

    /// Returns the argument of the task.
    pub fn argument(&self) -> &A {
        &self.argument
    }

    /// Runs the task, consuming it.
    pub fn run(self, submitter: &Submitter<A>) {
        (self.function)(self.argument, submitter)
    }
}

impl<A: fmt::Debug> fmt::Debug for Task<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("argument", &self.argument)
            .finish_non_exhaustive()
    }
}
