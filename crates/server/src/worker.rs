// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker loop: claim tasks, execute them, heartbeat, drain.

use crate::error::ServerError;
use crate::executor::StepExecutor;
use crate::queue::{TaskQueue, WorkerInfo};
use crate::script::LocalScriptAdapter;
use merlin_core::{Clock, SystemClock};
use std::time::Duration;

/// Configuration for one worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub name: String,
    pub queues: Vec<String>,
    /// Shell for step scripts (study batch default)
    pub shell: String,
    /// Delay between claim attempts when the queues are empty
    pub poll_interval: Duration,
    /// Consecutive empty polls after which a worker drains and exits;
    /// `None` keeps polling until a stop request arrives
    pub drain_after: Option<u32>,
}

impl WorkerConfig {
    /// A worker bound to the given queues with default pacing.
    pub fn new(name: impl Into<String>, queues: Vec<String>) -> Self {
        Self {
            name: name.into(),
            queues,
            shell: "/bin/bash".to_string(),
            poll_interval: Duration::from_millis(500),
            drain_after: Some(3),
        }
    }
}

/// What one worker accomplished before exiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerReport {
    pub finished: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Run one worker until it drains or is stopped.
///
/// Cancellation is best-effort draining: stop requests are honored between
/// claims, never by killing an in-flight step.
pub async fn run_worker(config: WorkerConfig, queue: TaskQueue) -> Result<WorkerReport, ServerError> {
    let clock = SystemClock;
    let info = WorkerInfo {
        name: config.name.clone(),
        pid: std::process::id(),
        queues: config.queues.clone(),
        started_at: clock.now(),
    };
    queue.register_worker(&info)?;
    tracing::info!(worker = config.name, queues = ?config.queues, "worker started");

    let mut report = WorkerReport::default();
    let mut empty_polls = 0u32;
    loop {
        if queue.stop_requested(&config.name) {
            tracing::info!(worker = config.name, "stop requested, draining");
            break;
        }
        let (claimed, cancelled) = queue.claim(&config.queues, &config.name)?;
        report.cancelled += cancelled.len();
        let Some(claimed) = claimed else {
            let pending: usize = config.queues.iter().map(|q| queue.pending_count(q)).sum();
            if pending == 0 {
                empty_polls += 1;
                if config
                    .drain_after
                    .is_some_and(|limit| empty_polls >= limit)
                {
                    tracing::info!(worker = config.name, "queues drained, exiting");
                    break;
                }
            } else {
                // Tasks exist but none are claimable yet (upstream work in
                // flight elsewhere); keep polling.
                empty_polls = 0;
            }
            tokio::time::sleep(config.poll_interval).await;
            continue;
        };
        empty_polls = 0;

        let mut step = claimed.task.step.clone();
        let executor = StepExecutor::new(&clock, false);
        let adapter = LocalScriptAdapter::new(config.shell.clone());
        match executor.execute(&mut step, &adapter).await {
            Ok(code) => {
                tracing::info!(worker = config.name, step = step.name(), %code, "task finished");
                report.finished += 1;
            }
            Err(error) => {
                tracing::error!(worker = config.name, step = step.name(), %error, "task failed");
                report.failed += 1;
            }
        }
        queue.finish(&claimed)?;
    }

    queue.deregister_worker(&config.name);
    Ok(report)
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
