// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The abstract distributed-backend façade.
//!
//! The core makes no assumptions about the concrete backend beyond these
//! operations; `merlin-server` ships the `local` backend and the router
//! rejects anything else.

use crate::error::ServerError;
use crate::queue::WorkerInfo;
use async_trait::async_trait;
use merlin_spec::Specification;
use merlin_study::Study;

/// How a study's tasks are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Walk the concrete DAG inline, one step at a time
    Local,
    /// Enqueue one task per step; workers provide the concurrency
    Batch,
}

/// Aggregate outcome of a `run` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub finished: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Steps staged but not submitted (dry runs)
    pub dry: usize,
    /// Tasks handed to the queue (batch mode)
    pub enqueued: usize,
}

impl RunSummary {
    /// True when nothing failed or was cancelled.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// One row of a status query.
#[derive(Debug, Clone)]
pub struct QueueStatus {
    pub name: String,
    pub queued: usize,
    pub workers: usize,
}

/// Abstract task-server operations the core requires.
#[async_trait]
pub trait TaskServer: Send + Sync + std::fmt::Debug {
    /// Dispatch a staged study.
    async fn run(&self, study: &Study, mode: RunMode) -> Result<RunSummary, ServerError>;

    /// Launch (or, with `echo`, print) the workers declared for `steps`.
    /// Returns the launch command line for each worker.
    async fn launch_workers(
        &self,
        spec: &Specification,
        steps: &[String],
        worker_args: Option<&str>,
        echo: bool,
    ) -> Result<Vec<String>, ServerError>;

    /// Per-queue `(name, queued tasks, connected workers)` for the queues
    /// used by `steps`.
    async fn query_status(
        &self,
        spec: &Specification,
        steps: &[String],
    ) -> Result<Vec<QueueStatus>, ServerError>;

    /// Remove pending tasks from the queues used by `steps`. Refuses
    /// without `force`.
    async fn purge_tasks(
        &self,
        spec: &Specification,
        force: bool,
        steps: &[String],
    ) -> Result<usize, ServerError>;

    /// Ask workers to stop, selected by name, queue, or name regex.
    async fn stop_workers(
        &self,
        spec: &Specification,
        names: &[String],
        queues: &[String],
        worker_regex: Option<&str>,
    ) -> Result<usize, ServerError>;

    /// List live workers.
    async fn query_workers(&self, spec: &Specification) -> Result<Vec<WorkerInfo>, ServerError>;
}
