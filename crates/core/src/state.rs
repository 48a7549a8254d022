// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step execution states and submission/return codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution state of a step record.
///
/// The lifecycle is `Initialized → Pending → Running → {Finished, Failed,
/// Cancelled}`, with `Running → Timedout → Pending` while the restart budget
/// lasts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Record created, nothing submitted yet
    #[default]
    Initialized,
    /// Submitted, waiting to run
    Pending,
    /// Executing
    Running,
    /// Completed successfully
    Finished,
    /// Completed unsuccessfully
    Failed,
    /// Backend reported a walltime/timeout kill
    Timedout,
    /// Never ran because an upstream step failed or the study was stopped
    Cancelled,
}

impl State {
    /// Check if this state is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Finished | State::Failed | State::Cancelled)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Initialized => write!(f, "INITIALIZED"),
            State::Pending => write!(f, "PENDING"),
            State::Running => write!(f, "RUNNING"),
            State::Finished => write!(f, "FINISHED"),
            State::Failed => write!(f, "FAILED"),
            State::Timedout => write!(f, "TIMEDOUT"),
            State::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Outcome of handing a script to a script adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionCode {
    Ok,
    Error,
}

impl fmt::Display for SubmissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionCode::Ok => write!(f, "OK"),
            SubmissionCode::Error => write!(f, "ERROR"),
        }
    }
}

/// Exit status of one step execution, as seen by the executor.
///
/// `Restart` and `Timedout` both feed the restart policy; `DryOk` is the
/// distinct success value for dry runs (workspace and scripts staged, nothing
/// submitted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnCode {
    Ok,
    Error,
    Restart,
    DryOk,
    Timedout,
}

/// Exit status a step process uses to request a restart.
pub const RESTART_EXIT_CODE: i32 = 100;

/// Exit status the `timeout(1)` convention uses for a killed process.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

impl ReturnCode {
    /// Map a child-process exit status to a return code.
    pub fn from_exit_status(status: i32) -> Self {
        match status {
            0 => ReturnCode::Ok,
            RESTART_EXIT_CODE => ReturnCode::Restart,
            TIMEOUT_EXIT_CODE => ReturnCode::Timedout,
            _ => ReturnCode::Error,
        }
    }

    /// True for codes that should re-enter submission under the restart budget.
    pub fn wants_restart(&self) -> bool {
        matches!(self, ReturnCode::Restart | ReturnCode::Timedout)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnCode::Ok => write!(f, "OK"),
            ReturnCode::Error => write!(f, "ERROR"),
            ReturnCode::Restart => write!(f, "RESTART"),
            ReturnCode::DryOk => write!(f, "DRY_OK"),
            ReturnCode::Timedout => write!(f, "TIMEDOUT"),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
