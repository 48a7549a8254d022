// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the execution backends.

use thiserror::Error;

/// Errors raised while executing one step.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("submission of step '{step}' failed with code {retcode}: {stderr}")]
    SubmissionFailed {
        step: String,
        retcode: i32,
        stderr: String,
    },
    #[error("step '{step}' timed out and its restart budget of {attempts} is spent")]
    RestartExhausted { step: String, attempts: u32 },
    #[error("step I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the task-server façade.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("'{name}' is not a supported task server")]
    UnsupportedTaskServer { name: String },
    #[error(transparent)]
    Study(#[from] merlin_study::StudyError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    #[error("task queue I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task descriptor error: {0}")]
    Task(#[from] serde_json::Error),
    #[error("bad worker pattern: {0}")]
    WorkerPattern(#[from] regex::Error),
}
