/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_progress_logger::no_logging;
use graphsum::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn random_graph(rng: &mut SmallRng, num_nodes: usize, num_edges: usize) -> Result<Graph> {
    let values = (0..num_nodes)
        .map(|_| rng.random_range(-1000..1000))
        .collect::<Vec<i64>>();
    let edges = (0..num_edges)
        .map(|_| (rng.random_range(0..num_nodes), rng.random_range(0..num_nodes)))
        .collect::<Vec<_>>();
    Ok(Graph::from_edges(values, edges)?)
}

/// Returns a copy of the graph with shuffled neighbor lists.
fn shuffle_neighbors(rng: &mut SmallRng, graph: &Graph) -> Result<Graph> {
    Ok(Graph::new(
        graph
            .nodes()
            .iter()
            .map(|node| {
                let mut neighbors = node.neighbors().to_vec();
                neighbors.shuffle(rng);
                Node::new(node.value(), neighbors)
            })
            .collect(),
    )?)
}

macro_rules! test_par_sum {
    ($threads:expr, $name:ident) => {
        mod $name {
            use super::*;

            fn config() -> PoolConfig {
                PoolConfig::default().with_max_threads($threads)
            }

            #[test]
            fn test_isolated_node_is_visited() -> Result<()> {
                let graph = Graph::from_edges([1, 2, 3, 4, 5], [(0, 1), (0, 2), (2, 3)])?;
                let par_sum = ParSum::new(graph);
                let pool = WorkerPool::new(&config(), no_logging![])?;
                par_sum.seed(&pool.submitter());
                let stats = pool.stop_when(|| par_sum.all_visited())?;

                assert_eq!(par_sum.sum(), 15);
                assert!(par_sum.is_visited(4));
                assert_eq!(stats.threads, $threads);
                assert_eq!(stats.executed, 5);
                Ok(())
            }

            #[test]
            fn test_compute_sum() -> Result<()> {
                let graph = Graph::from_edges([1, 2, 3, 4, 5], [(0, 1), (0, 2), (2, 3)])?;
                assert_eq!(compute_sum(graph, &config(), no_logging![])?, 15);
                Ok(())
            }

            #[test]
            fn test_self_loop() -> Result<()> {
                let graph = Graph::new(vec![Node::new(7, vec![0])])?;
                let report = ParSum::new(graph).run(&config(), no_logging![])?;
                assert_eq!(report.sum, 7);
                assert_eq!(report.submissions, [1]);
                assert_eq!(report.stats.submitted, 1);
                Ok(())
            }

            #[test]
            fn test_isolated_nodes() -> Result<()> {
                let values = (0..1000).map(|i| i * 3 - 1000).collect::<Vec<i64>>();
                let graph = Graph::from_edges(values.iter().copied(), [])?;
                let report = ParSum::new(graph).run(&config(), no_logging![])?;
                assert_eq!(report.sum, values.iter().sum::<i64>());
                assert_eq!(report.stats.submitted, 1000);
                assert_eq!(report.stats.executed, 1000);
                Ok(())
            }

            #[test]
            fn test_exactly_once() -> Result<()> {
                let mut rng = SmallRng::seed_from_u64(0);
                for _ in 0..10 {
                    let graph = random_graph(&mut rng, 1000, 3000)?;
                    let num_nodes = graph.num_nodes();
                    let par_sum = ParSum::new(graph);
                    let pool = WorkerPool::new(&config(), no_logging![])?;
                    par_sum.seed(&pool.submitter());
                    let stats = pool.stop_when(|| par_sum.all_visited())?;

                    assert!(par_sum.submissions().iter().all(|&count| count == 1));
                    assert_eq!(par_sum.num_visited(), num_nodes);
                    assert_eq!(stats.submitted, num_nodes);
                    assert_eq!(stats.executed, num_nodes);
                    assert_eq!(par_sum.sum(), seq_sum(par_sum.graph()));
                    assert_eq!(par_sum.sum(), par_sum.graph().total_value());
                }
                Ok(())
            }

            #[test]
            fn test_order_independence() -> Result<()> {
                let mut rng = SmallRng::seed_from_u64(1);
                let graph = random_graph(&mut rng, 500, 2000)?;
                let expected = compute_sum(graph.clone(), &config(), no_logging![])?;
                for _ in 0..5 {
                    let shuffled = shuffle_neighbors(&mut rng, &graph)?;
                    assert_eq!(compute_sum(shuffled, &config(), no_logging![])?, expected);
                }
                Ok(())
            }

            #[test]
            fn test_disconnected_components() -> Result<()> {
                // Two triangles and a path, with no edge in between
                let values = [1, 2, 3, 10, 20, 30, 100, 200];
                let edges = [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (6, 7)];
                let graph = Graph::from_edges(values, edges)?;
                let report = ParSum::new(graph).run(&config(), no_logging![])?;
                assert_eq!(report.sum, 6 + 60 + 300);
                assert!(report.submissions.iter().all(|&count| count == 1));
                Ok(())
            }

            #[test]
            fn test_all_visited_is_monotone() -> Result<()> {
                let mut rng = SmallRng::seed_from_u64(2);
                let par_sum = ParSum::new(random_graph(&mut rng, 200, 400)?);
                for _ in 0..10 {
                    assert!(!par_sum.all_visited());
                }

                let pool = WorkerPool::new(&config(), no_logging![])?;
                let mut last = false;
                let seeded = par_sum.seed(&pool.submitter());
                assert!(seeded > 0);
                let stats = pool.stop_when(|| {
                    let now = par_sum.all_visited();
                    assert!(now || !last);
                    last = now;
                    now
                })?;

                assert!(last);
                for _ in 0..10 {
                    assert!(par_sum.all_visited());
                }
                assert_eq!(stats.executed, 200);
                assert_eq!(par_sum.sum(), par_sum.graph().total_value());
                Ok(())
            }

            #[test]
            fn test_random_graphs() -> Result<()> {
                let mut rng = SmallRng::seed_from_u64(3);
                for _ in 0..20 {
                    let num_nodes = rng.random_range(1..300);
                    let num_edges = rng.random_range(0..3 * num_nodes);
                    let graph = random_graph(&mut rng, num_nodes, num_edges)?;
                    let expected = seq_sum(&graph);
                    assert_eq!(compute_sum(graph, &config(), no_logging![])?, expected);
                }
                Ok(())
            }
        }
    };
}

test_par_sum!(1, one_thread);
test_par_sum!(2, two_threads);
test_par_sum!(8, eight_threads);
test_par_sum!(64, sixty_four_threads);

#[test]
fn test_same_submissions_for_all_thread_counts() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(4);
    let graph = std::sync::Arc::new(random_graph(&mut rng, 2000, 5000)?);
    for threads in [1, 2, 8, 64] {
        let report = ParSum::new(graph.clone()).run(
            &PoolConfig::default().with_max_threads(threads),
            no_logging![],
        )?;
        assert_eq!(report.submissions, vec![1; 2000]);
        assert_eq!(report.sum, graph.total_value());
    }
    Ok(())
}

#[test]
fn test_independent_computations() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(5);
    let graphs = (0..4)
        .map(|_| random_graph(&mut rng, 500, 1000))
        .collect::<Result<Vec<_>>>()?;
    let handles = graphs
        .into_iter()
        .map(|graph| {
            std::thread::spawn(move || -> Result<bool> {
                let expected = seq_sum(&graph);
                Ok(compute_sum(graph, &PoolConfig::default(), no_logging![])? == expected)
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert!(handle.join().unwrap()?);
    }
    Ok(())
}
