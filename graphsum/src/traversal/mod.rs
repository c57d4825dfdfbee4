/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Visits summing the values of the nodes of a [`Graph`].
//!
//! [`compute_sum`] is the entry point: it runs a self-scheduling parallel
//! visit ([`ParSum`]) on a [`WorkerPool`](crate::pool::WorkerPool) and
//! returns the sum once every node has been visited and every worker has
//! been joined. [`seq_sum`] is a sequential reference implementation.

mod par;
pub use par::*;

mod seq;
pub use seq::*;

use crate::graph::Graph;
use crate::pool::{PoolConfig, PoolError};
use dsi_progress_logger::ConcurrentProgressLog;
use std::sync::Arc;

/// Sums the values of all nodes of a graph in parallel.
///
/// This is a shorthand for [`ParSum::run`] returning just the sum. The call
/// blocks until the visit is complete.
pub fn compute_sum(
    graph: impl Into<Arc<Graph>>,
    config: &PoolConfig,
    pl: &mut (impl ConcurrentProgressLog + Send + 'static),
) -> Result<i64, PoolError> {
    Ok(ParSum::new(graph).run(config, pl)?.sum)
}
