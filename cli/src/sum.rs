/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::{node_logger, GlobalArgs, PoolArgs};
use anyhow::{Context, Result};
use clap::Args;
use graphsum::prelude::*;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(about = "Prints the sum of the node values of a graph.", long_about = None)]
pub struct CliArgs {
    /// The graph, in text format.
    pub path: PathBuf,

    #[clap(flatten)]
    pub pool: PoolArgs,

    #[arg(long)]
    /// Use a sequential visit instead of the worker pool.
    pub seq: bool,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    println!("{}", sum(&global_args, &args)?);
    Ok(())
}

/// Loads the graph and computes the sum of its node values.
pub fn sum(global_args: &GlobalArgs, args: &CliArgs) -> Result<i64> {
    let graph = Graph::load(&args.path)
        .with_context(|| format!("Could not load the graph {}", args.path.display()))?;

    if args.seq {
        log::info!("Summing the node values sequentially");
        return Ok(seq_sum(&graph));
    }

    let mut pl = node_logger(global_args);
    compute_sum(graph, &PoolConfig::from(&args.pool), &mut pl)
        .context("Could not compute the sum")
}
