/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::graph::Graph;
use crate::pool::{PoolConfig, PoolError, PoolStats, Submitter, Task, WorkerPool};
use dsi_progress_logger::ConcurrentProgressLog;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use sux::prelude::*;

/// The result of [`ParSum::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SumReport {
    /// The sum of the values of all nodes.
    pub sum: i64,
    /// Statistics about the pool that executed the visit.
    pub stats: PoolStats,
    /// For each node, the number of tasks submitted for it.
    pub submissions: Vec<usize>,
}

struct Visited {
    bits: BitVec,
    /// The number of set bits.
    count: usize,
}

struct State {
    graph: Arc<Graph>,
    visited: Mutex<Visited>,
    sum: Mutex<i64>,
    submissions: Box<[AtomicUsize]>,
}

impl State {
    fn visited(&self) -> MutexGuard<'_, Visited> {
        self.visited.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `node` as visited, returning whether it was not visited before.
    fn discover(&self, node: usize) -> bool {
        let mut visited = self.visited();
        if visited.bits[node] {
            return false;
        }
        visited.bits.set(node, true);
        visited.count += 1;
        true
    }

    fn submit(self: &Arc<Self>, node: usize, submitter: &Submitter<NodeTask>) {
        self.submissions[node].fetch_add(1, Ordering::Relaxed);
        submitter.submit(Task::new(
            NodeTask {
                state: Arc::clone(self),
                node,
            },
            visit_node,
        ));
    }
}

/// The argument of the tasks of a [`ParSum`]: a node to be summed.
///
/// The node has already been marked as visited when the task is created.
pub struct NodeTask {
    state: Arc<State>,
    node: usize,
}

impl NodeTask {
    /// Returns the node of the task.
    pub fn node(&self) -> usize {
        self.node
    }
}

impl fmt::Debug for NodeTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTask")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

fn visit_node(task: NodeTask, submitter: &Submitter<NodeTask>) {
    let NodeTask { state, node } = task;
    let node = &state.graph[node];

    *state.sum.lock().unwrap_or_else(PoisonError::into_inner) += node.value();

    for &succ in node.neighbors() {
        // The visited lock is released before submitting
        if state.discover(succ) {
            state.submit(succ, submitter);
        }
    }
}

/// A self-scheduling parallel visit summing the values of the nodes of a
/// graph.
///
/// Every node is visited by exactly one task. A task adds the value of its
/// node to the sum, and submits a new task for each neighbor that has not
/// been visited yet; nodes are marked as visited when they are discovered,
/// that is, before their task is submitted, so two tasks racing to discover
/// the same node cannot both submit it. Visits are seeded by
/// [`seed`](ParSum::seed) with every node not visited yet, so that all
/// connected components are reached.
///
/// All the state of a visit lives in this structure and is shared with the
/// tasks it creates, so any number of visits can run at the same time.
///
/// [`run`](ParSum::run) performs a complete visit on a new [`WorkerPool`];
/// the other methods make it possible to drive a visit step by step.
pub struct ParSum {
    state: Arc<State>,
}

impl ParSum {
    pub fn new(graph: impl Into<Arc<Graph>>) -> Self {
        let graph = graph.into();
        let num_nodes = graph.num_nodes();
        Self {
            state: Arc::new(State {
                graph,
                visited: Mutex::new(Visited {
                    bits: BitVec::new(num_nodes),
                    count: 0,
                }),
                sum: Mutex::new(0),
                submissions: (0..num_nodes).map(|_| AtomicUsize::new(0)).collect(),
            }),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.state.graph
    }

    /// Submits a task for every node that has not been visited yet, marking
    /// it as visited, and returns the number of submitted tasks.
    pub fn seed(&self, submitter: &Submitter<NodeTask>) -> usize {
        let mut seeded = 0;
        for node in 0..self.state.graph.num_nodes() {
            if self.state.discover(node) {
                self.state.submit(node, submitter);
                seeded += 1;
            }
        }
        seeded
    }

    /// Returns whether all nodes have been visited.
    ///
    /// Once true, it stays true. At that point all tasks have been
    /// submitted, but some of them might still be queued or running, so
    /// [`sum`](ParSum::sum) is not necessarily final: it becomes final when
    /// all workers have been joined.
    pub fn all_visited(&self) -> bool {
        let visited = self.state.visited();
        visited.count == visited.bits.len()
    }

    /// Returns the number of visited nodes.
    pub fn num_visited(&self) -> usize {
        self.state.visited().count
    }

    /// Returns whether `node` has been visited.
    pub fn is_visited(&self, node: usize) -> bool {
        self.state.visited().bits[node]
    }

    /// Returns the current value of the sum.
    pub fn sum(&self) -> i64 {
        *self.state.sum.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns, for each node, the number of tasks submitted for it.
    pub fn submissions(&self) -> Vec<usize> {
        self.state
            .submissions
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .collect()
    }

    /// Sums the values of all nodes using a new [`WorkerPool`] configured by
    /// `config`.
    ///
    /// The pool is seeded and then stopped when [all nodes have been
    /// visited](ParSum::all_visited); the sum is read after all workers have
    /// been joined. `pl` is started and stopped by this method, even when it
    /// fails, and it is updated once per node.
    pub fn run(
        self,
        config: &PoolConfig,
        pl: &mut (impl ConcurrentProgressLog + Send + 'static),
    ) -> Result<SumReport, PoolError> {
        let num_nodes = self.state.graph.num_nodes();
        pl.item_name("node");
        pl.expected_updates(Some(num_nodes));
        pl.start(format!(
            "Summing the values of {} nodes using {} threads...",
            num_nodes, config.max_threads
        ));

        let outcome = WorkerPool::new(config, pl).and_then(|pool| {
            let seeded = self.seed(&pool.submitter());
            log::debug!("Seeded {} tasks", seeded);
            pool.stop_when(|| self.all_visited())
        });

        pl.done();
        let stats = outcome?;

        let sum = self.sum();
        log::info!("The sum of the values of {} nodes is {}", num_nodes, sum);
        Ok(SumReport {
            sum,
            stats,
            submissions: self.submissions(),
        })
    }
}
