/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::graph::Graph;
use sux::prelude::*;

/// Sums the values of the nodes of a graph with a sequential depth-first
/// visit.
///
/// Nodes are marked as visited when discovered, and every connected
/// component is visited starting from its node of smallest index. The
/// result is the same as that of [`compute_sum`](super::compute_sum), and it
/// is useful as a reference.
pub fn seq_sum(graph: &Graph) -> i64 {
    let num_nodes = graph.num_nodes();
    let mut visited = BitVec::new(num_nodes);
    let mut stack = Vec::new();
    let mut sum = 0;

    for root in 0..num_nodes {
        if visited[root] {
            continue;
        }
        visited.set(root, true);
        stack.push(root);

        while let Some(node) = stack.pop() {
            sum += graph[node].value();
            for &succ in graph[node].neighbors() {
                if !visited[succ] {
                    visited.set(succ, true);
                    stack.push(succ);
                }
            }
        }
    }

    sum
}
