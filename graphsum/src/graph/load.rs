/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Graph, GraphError};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

/// Whitespace-separated integer tokens.
struct Tokens<'a>(SplitWhitespace<'a>);

impl<'a> Tokens<'a> {
    fn next<T: FromStr<Err = std::num::ParseIntError>>(
        &mut self,
        expected: &'static str,
    ) -> Result<T, GraphError> {
        let token = self.0.next().ok_or(GraphError::UnexpectedEnd { expected })?;
        token
            .parse::<T>()
            .map_err(|source| GraphError::InvalidInteger {
                token: token.to_owned(),
                source,
            })
    }
}

impl Graph {
    /// Reads a graph in text format.
    ///
    /// The input is a sequence of whitespace-separated integers: the number
    /// of nodes `n` and the number of edges `m`, followed by the `n` node
    /// values, followed by `m` pairs of node indices, each describing an
    /// undirected edge. Line breaks are not significant, and tokens after the
    /// last edge are ignored. For example,
    ///
    /// ```text
    /// 5 3
    /// 1 2 3 4 5
    /// 0 1
    /// 0 2
    /// 2 3
    /// ```
    ///
    /// describes a graph with five nodes in which node 4 is isolated. Edges
    /// are added as in [`Graph::from_edges`].
    pub fn read(mut reader: impl Read) -> Result<Self, GraphError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let mut tokens = Tokens(text.split_whitespace());

        let num_nodes: usize = tokens.next("the number of nodes")?;
        let num_edges: usize = tokens.next("the number of edges")?;

        let values = (0..num_nodes)
            .map(|_| tokens.next::<i64>("a node value"))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = (0..num_edges)
            .map(|_| Ok((tokens.next("an edge")?, tokens.next("an edge")?)))
            .collect::<Result<Vec<(usize, usize)>, GraphError>>()?;

        Graph::from_edges(values, edges)
    }

    /// Loads a graph in [text format](Graph::read) from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        log::info!("Loading the graph from {}", path.display());
        let graph = Self::read(BufReader::new(File::open(path)?))?;
        log::info!(
            "Loaded a graph with {} nodes and {} arcs",
            graph.num_nodes(),
            graph.num_arcs()
        );
        Ok(graph)
    }
}
