// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! merlin-core: shared domain types for the Merlin workflow orchestrator

pub mod clock;
pub mod state;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use state::{ReturnCode, State, SubmissionCode};
pub use time_fmt::{format_hms, round_to_seconds, UNSET_TIME};

/// Sentinel file written into a step workspace when the step finishes
/// successfully. Downstream tasks key their readiness off this file.
pub const FINISHED_SENTINEL: &str = "MERLIN_FINISHED";

/// Sentinel file written into a step workspace when the step terminally
/// fails. Downstream tasks observing this are cancelled rather than run.
pub const FAILED_SENTINEL: &str = "MERLIN_FAILED";

/// Default task queue for steps that do not declare one.
pub const DEFAULT_TASK_QUEUE: &str = "merlin";
