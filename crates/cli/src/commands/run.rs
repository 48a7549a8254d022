// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `merlin run` - expand a specification and dispatch its tasks.

use super::{load_spec, output_root};
use anyhow::{bail, Result};
use clap::Args;
use merlin_server::{task_server_for, RunMode};
use merlin_study::{Study, TIMESTAMP_FORMAT};
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the workflow specification yaml file
    pub specification: PathBuf,

    /// Run tasks locally, without distributed workers
    #[arg(long)]
    pub local: bool,

    /// Set up workspaces and scripts without executing anything
    #[arg(long)]
    pub dry: bool,

    /// Variable overrides, space-delimited KEY=VALUE pairs
    /// (example: --vars LEARN=path/to/new_learn.py EPOCHS=3)
    #[arg(long, num_args = 1.., value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// File containing samples, instead of generating one at workflow start
    #[arg(long)]
    pub samplesfile: Option<PathBuf>,

    /// Parameter-generator file overriding global.parameters
    #[arg(long)]
    pub pgen: Option<PathBuf>,

    /// Argument for the parameter-generator function; repeat for more
    #[arg(long = "pargs", value_name = "ARG")]
    pub pargs: Vec<String>,

    /// Task server type (defaults to the spec's merlin.resources.task_server)
    #[arg(long = "task-server")]
    pub task_server: Option<String>,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    if !args.pargs.is_empty() && args.pgen.is_none() {
        bail!("cannot use the 'pargs' parameter without specifying a 'pgen'");
    }
    if let Some(pgen) = &args.pgen {
        // Parameter generation is expected to have produced the final
        // global.parameters block before expansion begins.
        tracing::info!(pgen = %pgen.display(), "using externally generated parameters");
    }
    if let Some(samples) = &args.samplesfile {
        tracing::info!(samples = %samples.display(), "samples file registered for the dispatch layer");
    }

    let (spec, spec_dir) = load_spec(&args.specification, &args.vars)?;
    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let study = Study::new(spec, &spec_dir, &timestamp, args.dry)?;
    println!("Study workspace is '{}'", study.workspace.display());

    let server_name = args
        .task_server
        .unwrap_or_else(|| study.spec.merlin.resources.task_server.clone());
    let root = output_root(&study.spec, &spec_dir);
    let server = task_server_for(&server_name, &root)?;

    let mode = if args.local {
        RunMode::Local
    } else {
        RunMode::Batch
    };
    let summary = server.run(&study, mode).await?;

    if summary.enqueued > 0 {
        println!(
            "Queued {} tasks; launch workers with 'merlin run-workers {}'",
            summary.enqueued,
            args.specification.display()
        );
    }
    if summary.dry > 0 {
        println!("Dry run staged {} steps", summary.dry);
    }
    if !summary.is_success() {
        bail!(
            "{} steps failed, {} cancelled",
            summary.failed,
            summary.cancelled
        );
    }
    Ok(())
}
