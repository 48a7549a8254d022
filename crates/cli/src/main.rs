// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! merlin - queue and run parameterized studies

mod banner;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{example, info, monitor, purge, restart, run, status, workers};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "merlin",
    version,
    about = "Merlin - machine learning for HPC workflows"
)]
struct Cli {
    /// Log level (overridden by MERLIN_LOG)
    #[arg(long, global = true, default_value = "info")]
    level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue tasks for a study specification
    Run(run::RunArgs),
    /// Restart a study from an existing workspace
    Restart(restart::RestartArgs),
    /// Launch the workers for a study specification
    RunWorkers(workers::RunWorkersArgs),
    /// Ask task-server workers to stop
    StopWorkers(workers::StopWorkersArgs),
    /// List connected task-server workers
    QueryWorkers(workers::QueryWorkersArgs),
    /// Show queue stats for a study specification
    Status(status::StatusArgs),
    /// Poll the queues until all work drains
    Monitor(monitor::MonitorArgs),
    /// Remove pending tasks from the queues
    Purge(purge::PurgeArgs),
    /// Show version and configuration details
    Info(info::InfoArgs),
    /// Write a starter workflow specification
    Example(example::ExampleArgs),
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("MERLIN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.level);

    let result: Result<()> = match cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Restart(args) => restart::execute(args).await,
        Commands::RunWorkers(args) => workers::run_workers(args).await,
        Commands::StopWorkers(args) => workers::stop_workers(args).await,
        Commands::QueryWorkers(args) => workers::query_workers(args).await,
        Commands::Status(args) => status::execute(args).await,
        Commands::Monitor(args) => monitor::execute(args).await,
        Commands::Purge(args) => purge::execute(args).await,
        Commands::Info(args) => info::execute(args),
        Commands::Example(args) => example::execute(args),
    };

    if let Err(error) = result {
        eprintln!("error: {:#}", error);
        std::process::exit(1);
    }
}
