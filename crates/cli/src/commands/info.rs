// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `merlin info` - version and configuration printout.

use anyhow::Result;
use clap::Args;
use merlin_core::DEFAULT_TASK_QUEUE;

#[derive(Args)]
pub struct InfoArgs {}

pub fn execute(_args: InfoArgs) -> Result<()> {
    println!("{}", crate::banner::BANNER_SMALL);
    println!("merlin version {}", env!("CARGO_PKG_VERSION"));
    println!("task servers:  local");
    println!("default queue: {}", DEFAULT_TASK_QUEUE);
    println!("log filter:    MERLIN_LOG (falls back to --level)");
    Ok(())
}
