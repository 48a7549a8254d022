// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `merlin purge` - drop pending tasks from a study's queues.

use super::{load_spec, output_root};
use anyhow::Result;
use clap::Args;
use merlin_server::task_server_for;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Args)]
pub struct PurgeArgs {
    /// Path to the workflow specification yaml file
    pub specification: PathBuf,

    /// Purge the tasks without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// The specific steps whose queues should be purged
    #[arg(long, num_args = 1.., default_values_t = vec!["all".to_string()])]
    pub steps: Vec<String>,

    /// Variable overrides, space-delimited KEY=VALUE pairs
    #[arg(long, num_args = 1.., value_name = "KEY=VALUE")]
    pub vars: Vec<String>,
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

pub async fn execute(args: PurgeArgs) -> Result<()> {
    println!("{}", crate::banner::BANNER_SMALL);
    let (spec, spec_dir) = load_spec(&args.specification, &args.vars)?;
    let root = output_root(&spec, &spec_dir);
    let server = task_server_for(&spec.merlin.resources.task_server, &root)?;

    if !args.force
        && !confirm(&format!(
            "Purge all pending tasks for study '{}'?",
            spec.name()
        ))?
    {
        println!("Purge aborted");
        return Ok(());
    }
    let purged = server.purge_tasks(&spec, true, &args.steps).await?;
    println!("Purged {} tasks", purged);
    Ok(())
}
