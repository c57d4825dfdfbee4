/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Immutable node-valued graphs.
//!
//! A [`Graph`] is a sequence of [`Node`]s indexed from zero, each carrying a
//! value and the ordered list of its neighbors. Graphs are built once, either
//! from their nodes ([`Graph::new`]), from a list of undirected edges
//! ([`Graph::from_edges`]), or by parsing the text format described in
//! [`Graph::read`]; afterwards they are only read, so they can be shared by
//! any number of threads.

mod load;

use std::num::ParseIntError;
use std::ops::Index;
use thiserror::Error;

/// Errors raised while building or loading a [`Graph`].
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Could not read the graph")]
    Io(#[from] std::io::Error),
    #[error("Unexpected end of input while reading {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("Could not parse '{token}' as an integer")]
    InvalidInteger {
        token: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Node {node} does not exist (the graph has {num_nodes} nodes)")]
    NodeOutOfRange { node: usize, num_nodes: usize },
}

/// A node of a [`Graph`]: a value and an ordered list of neighbors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    value: i64,
    neighbors: Vec<usize>,
}

impl Node {
    /// Creates a node with the given value and neighbors.
    pub fn new(value: i64, neighbors: Vec<usize>) -> Self {
        Self { value, neighbors }
    }

    /// Creates a node with the given value and no neighbors.
    pub fn isolated(value: i64) -> Self {
        Self::new(value, Vec::new())
    }

    /// Returns the value of the node.
    #[inline(always)]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Returns the neighbors of the node, in insertion order.
    #[inline(always)]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Returns the number of neighbors of the node.
    #[inline(always)]
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}

/// An immutable graph whose nodes carry an integer value.
///
/// Neighbor lists are kept exactly as provided: they might contain
/// duplicates and self-loops, and they are not required to be symmetric.
/// The only invariant is that every neighbor is a valid node index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Creates a graph from its nodes.
    ///
    /// Returns [`GraphError::NodeOutOfRange`] if a neighbor list mentions a
    /// node that does not exist.
    pub fn new(nodes: Vec<Node>) -> Result<Self, GraphError> {
        let num_nodes = nodes.len();
        if let Some(&node) = nodes
            .iter()
            .flat_map(|node| node.neighbors.iter())
            .find(|&&succ| succ >= num_nodes)
        {
            return Err(GraphError::NodeOutOfRange { node, num_nodes });
        }
        Ok(Self { nodes })
    }

    /// Creates a graph with the given node values from a list of undirected
    /// edges.
    ///
    /// Each edge `(a, b)` appends `b` to the neighbors of `a` and `a` to the
    /// neighbors of `b`, in iteration order; a self-loop `(a, a)` thus
    /// appears twice in the neighbors of `a`.
    pub fn from_edges(
        values: impl IntoIterator<Item = i64>,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GraphError> {
        let mut nodes = values.into_iter().map(Node::isolated).collect::<Vec<_>>();
        let num_nodes = nodes.len();
        for (a, b) in edges {
            let node = a.max(b);
            if node >= num_nodes {
                return Err(GraphError::NodeOutOfRange { node, num_nodes });
            }
            nodes[a].neighbors.push(b);
            nodes[b].neighbors.push(a);
        }
        Ok(Self { nodes })
    }

    /// Returns the number of nodes.
    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the total length of the neighbor lists.
    pub fn num_arcs(&self) -> usize {
        self.nodes.iter().map(Node::degree).sum()
    }

    /// Returns the node of given index.
    ///
    /// # Panics
    ///
    /// If `node` is not smaller than [the number of nodes](Graph::num_nodes).
    #[inline(always)]
    pub fn node(&self, node: usize) -> &Node {
        &self.nodes[node]
    }

    /// Returns the nodes of the graph.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the sum of all node values, without visiting the graph.
    pub fn total_value(&self) -> i64 {
        self.nodes.iter().map(Node::value).sum()
    }
}

impl Index<usize> for Graph {
    type Output = Node;

    #[inline(always)]
    fn index(&self, node: usize) -> &Node {
        &self.nodes[node]
    }
}
