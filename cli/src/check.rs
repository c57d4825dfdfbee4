/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::{node_logger, GlobalArgs, PoolArgs};
use anyhow::{ensure, Context, Result};
use clap::Args;
use graphsum::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
#[command(about = "Checks repeatedly that the parallel sum of the node values of a graph is equal to the sequential one.", long_about = None)]
pub struct CliArgs {
    /// The graph, in text format.
    pub path: PathBuf,

    #[clap(flatten)]
    pub pool: PoolArgs,

    #[arg(short, long, default_value_t = 100)]
    /// The number of parallel runs.
    pub runs: usize,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let graph = Arc::new(
        Graph::load(&args.path)
            .with_context(|| format!("Could not load the graph {}", args.path.display()))?,
    );
    let config = PoolConfig::from(&args.pool);

    let expected = seq_sum(&graph);
    log::info!("The sequential sum is {}", expected);

    let mut pl = node_logger(&global_args);
    for run in 0..args.runs {
        let report = ParSum::new(graph.clone())
            .run(&config, &mut pl)
            .with_context(|| format!("Run {} failed", run))?;
        ensure!(
            report.sum == expected,
            "Run {}: the parallel sum {} is different from the sequential sum {}",
            run,
            report.sum,
            expected
        );
        ensure!(
            report.submissions.iter().all(|&count| count == 1),
            "Run {}: some node was submitted more than once",
            run
        );
    }

    log::info!("All {} runs returned {}", args.runs, expected);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli_main;
    use anyhow::Result;

    #[test]
    fn test_check() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("graph.in");
        std::fs::write(&path, "6 4\n1 -2 3 -4 5 -6\n0 1\n1 2\n2 0\n3 4\n")?;
        let path = path.to_str().unwrap();
        cli_main(["graphsum", "check", path, "-j", "4", "-r", "10"])?;
        cli_main(["graphsum", "check", path, "--runs", "1"])?;
        Ok(())
    }

    #[test]
    fn test_check_malformed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("graph.in");
        std::fs::write(&path, "2 1\n1 2\n0 2\n")?;
        assert!(cli_main(["graphsum", "check", path.to_str().unwrap()]).is_err());
        Ok(())
    }
}
