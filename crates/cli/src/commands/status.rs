// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `merlin status` - per-queue stats for a study specification.

use super::{load_spec, output_root};
use anyhow::Result;
use clap::Args;
use merlin_server::{dump_status_csv, task_server_for};
use std::path::PathBuf;

#[derive(Args)]
pub struct StatusArgs {
    /// Path to the workflow specification yaml file
    pub specification: PathBuf,

    /// The specific steps to query
    #[arg(long, num_args = 1.., default_values_t = vec!["all".to_string()])]
    pub steps: Vec<String>,

    /// Variable overrides, space-delimited KEY=VALUE pairs
    #[arg(long, num_args = 1.., value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Dump the status report to a csv file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub async fn execute(args: StatusArgs) -> Result<()> {
    println!("{}", crate::banner::BANNER_SMALL);
    let (spec, spec_dir) = load_spec(&args.specification, &args.vars)?;
    let root = output_root(&spec, &spec_dir);
    let server = task_server_for(&spec.merlin.resources.task_server, &root)?;

    let rows = server.query_status(&spec, &args.steps).await?;
    for row in &rows {
        println!(
            "{:<30} - Workers: {:<10} - Queued Tasks: {:<10}",
            row.name, row.workers, row.queued
        );
    }
    if let Some(csv) = &args.csv {
        dump_status_csv(&rows, csv)?;
        println!("Status dumped to '{}'", csv.display());
    }
    Ok(())
}
