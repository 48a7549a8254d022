// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker management verbs: `run-workers`, `stop-workers`, `query-workers`.

use super::{load_spec, output_root};
use anyhow::{bail, Result};
use clap::Args;
use merlin_server::task_server_for;
use std::path::PathBuf;

#[derive(Args)]
pub struct RunWorkersArgs {
    /// Path to the workflow specification yaml file
    pub specification: PathBuf,

    /// Variable overrides, space-delimited KEY=VALUE pairs
    #[arg(long, num_args = 1.., value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// The specific steps you want workers for
    #[arg(long, num_args = 1.., default_values_t = vec!["all".to_string()])]
    pub steps: Vec<String>,

    /// Extra worker arguments, in quotes
    #[arg(long = "worker-args")]
    pub worker_args: Option<String>,

    /// Print the worker launch commands instead of launching
    #[arg(long)]
    pub echo: bool,
}

pub async fn run_workers(args: RunWorkersArgs) -> Result<()> {
    let (spec, spec_dir) = load_spec(&args.specification, &args.vars)?;
    let root = output_root(&spec, &spec_dir);
    let server = task_server_for(&spec.merlin.resources.task_server, &root)?;

    let commands = server
        .launch_workers(&spec, &args.steps, args.worker_args.as_deref(), args.echo)
        .await?;
    if commands.is_empty() {
        bail!("no declared worker covers the requested steps");
    }
    for command in commands {
        println!("{}", command);
    }
    Ok(())
}

#[derive(Args)]
pub struct StopWorkersArgs {
    /// Specification whose workers should stop
    #[arg(long)]
    pub spec: Option<PathBuf>,

    /// Stop only workers serving these queues
    #[arg(long, num_args = 1..)]
    pub queues: Vec<String>,

    /// Regex matching the names of workers to stop
    #[arg(long)]
    pub workers: Option<String>,
}

pub async fn stop_workers(args: StopWorkersArgs) -> Result<()> {
    let Some(spec_path) = args.spec else {
        bail!("the local task server scopes workers per study; pass --spec");
    };
    let (spec, spec_dir) = load_spec(&spec_path, &[])?;
    let root = output_root(&spec, &spec_dir);
    let server = task_server_for(&spec.merlin.resources.task_server, &root)?;

    let stopped = server
        .stop_workers(&spec, &[], &args.queues, args.workers.as_deref())
        .await?;
    println!("Requested stop for {} workers", stopped);
    Ok(())
}

#[derive(Args)]
pub struct QueryWorkersArgs {
    /// Specification whose workers should be listed
    #[arg(long)]
    pub spec: Option<PathBuf>,
}

pub async fn query_workers(args: QueryWorkersArgs) -> Result<()> {
    let Some(spec_path) = args.spec else {
        bail!("the local task server scopes workers per study; pass --spec");
    };
    println!("{}", crate::banner::BANNER_SMALL);
    let (spec, spec_dir) = load_spec(&spec_path, &[])?;
    let root = output_root(&spec, &spec_dir);
    let server = task_server_for(&spec.merlin.resources.task_server, &root)?;

    let workers = server.query_workers(&spec).await?;
    if workers.is_empty() {
        println!("No connected workers");
        return Ok(());
    }
    for worker in workers {
        println!(
            "{:<24} pid {:<8} queues: {}",
            worker.name,
            worker.pid,
            worker.queues.join(",")
        );
    }
    Ok(())
}
