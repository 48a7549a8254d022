// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `merlin restart` - re-run a study from its provenance spec.

use anyhow::{bail, Result};
use clap::Args;
use merlin_server::{task_server_for, RunMode};
use merlin_spec::Specification;
use merlin_study::Study;
use std::path::PathBuf;

#[derive(Args)]
pub struct RestartArgs {
    /// Existing study workspace to restart from
    pub restart_dir: PathBuf,

    /// Run tasks locally, without distributed workers
    #[arg(long)]
    pub local: bool,
}

pub async fn execute(args: RestartArgs) -> Result<()> {
    let workspace = args.restart_dir.canonicalize()?;
    let provenance = Specification::find_provenance(&workspace)?;
    let spec = Specification::load_file(&provenance)?;
    println!("Restarting workflow at '{}'", workspace.display());

    let study = Study::with_workspace(spec, workspace.clone(), false)?;
    let root = workspace
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.clone());
    let server = task_server_for(&study.spec.merlin.resources.task_server, &root)?;

    let mode = if args.local {
        RunMode::Local
    } else {
        RunMode::Batch
    };
    let summary = server.run(&study, mode).await?;
    if !summary.is_success() {
        bail!(
            "{} steps failed, {} cancelled",
            summary.failed,
            summary.cancelled
        );
    }
    Ok(())
}
