// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! merlin-server: execution backends for staged studies.
//!
//! Script adapters write and submit per-step shell scripts; the step
//! executor drives one record through its state machine; the task-server
//! façade dispatches a whole study either inline (local mode) or through
//! the on-disk task queue consumed by worker processes (batch mode).

pub mod error;
pub mod executor;
pub mod local;
pub mod queue;
pub mod router;
pub mod script;
pub mod task_server;
pub mod worker;

pub use error::{ExecuteError, ServerError};
pub use executor::StepExecutor;
pub use local::LocalTaskServer;
pub use queue::{QueuedTask, TaskQueue, WorkerInfo};
pub use router::{dump_status_csv, task_server_for};
pub use script::{
    BatchScriptAdapter, LocalScriptAdapter, ScriptAdapter, ScriptSet, SubmissionRecord,
};
pub use task_server::{QueueStatus, RunMode, RunSummary, TaskServer};
pub use worker::{run_worker, WorkerConfig};
