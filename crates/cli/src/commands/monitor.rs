// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `merlin monitor` - poll the queues until the study drains.

use super::{load_spec, output_root};
use anyhow::Result;
use clap::Args;
use merlin_server::task_server_for;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct MonitorArgs {
    /// Path to the workflow specification yaml file
    pub specification: PathBuf,

    /// The specific steps to monitor
    #[arg(long, num_args = 1.., default_values_t = vec!["all".to_string()])]
    pub steps: Vec<String>,

    /// Variable overrides, space-delimited KEY=VALUE pairs
    #[arg(long, num_args = 1.., value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Seconds to sleep between checks
    #[arg(long, default_value_t = 60)]
    pub sleep: u64,
}

pub async fn execute(args: MonitorArgs) -> Result<()> {
    println!("Monitor: checking queues ...");
    let (spec, spec_dir) = load_spec(&args.specification, &args.vars)?;
    let root = output_root(&spec, &spec_dir);
    let server = task_server_for(&spec.merlin.resources.task_server, &root)?;

    loop {
        let rows = server.query_status(&spec, &args.steps).await?;
        let queued: usize = rows.iter().map(|r| r.queued).sum();
        let workers: usize = rows.iter().map(|r| r.workers).sum();
        if queued == 0 && workers == 0 {
            break;
        }
        tracing::info!(queued, workers, "Monitor: found tasks in queues");
        tokio::time::sleep(Duration::from_secs(args.sleep)).await;
    }
    println!("Monitor: ... stop condition met");
    Ok(())
}
