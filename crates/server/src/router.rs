// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-server dispatch by backend name, plus status rendering helpers.

use crate::error::ServerError;
use crate::local::LocalTaskServer;
use crate::task_server::{QueueStatus, TaskServer};
use std::io::Write;
use std::path::Path;

/// Resolve a backend by name, anchored at the resolved output root.
///
/// `local` is the shipped backend; any other name is rejected so a spec
/// written for an unavailable broker fails loudly instead of silently
/// running inline.
pub fn task_server_for(name: &str, output_root: &Path) -> Result<Box<dyn TaskServer>, ServerError> {
    match name {
        "local" => Ok(Box::new(LocalTaskServer::new(output_root.to_path_buf()))),
        other => Err(ServerError::UnsupportedTaskServer {
            name: other.to_string(),
        }),
    }
}

/// Dump status rows as CSV.
pub fn dump_status_csv(rows: &[QueueStatus], path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "queue,queued_tasks,workers")?;
    for row in rows {
        writeln!(file, "{},{},{}", row.name, row.queued, row.workers)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
