// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! merlin-study: the execution-graph core.
//!
//! Turns a parsed [`merlin_spec::Specification`] into a concrete DAG of
//! runnable step records: parameter fan-out, workspace provisioning, and
//! inter-step workspace reference resolution.

pub mod dag;
pub mod expand;
pub mod parameters;
pub mod step;
pub mod study;

pub use dag::{Dag, GraphError, SOURCE_ID, SOURCE_NODE};
pub use expand::{stage, ExpandError};
pub use parameters::{Combination, ParamEntry, ParamError, ParameterSet};
pub use step::{Step, StepRecord, DEFAULT_RESTART_LIMIT, WORKSPACE_TOKEN};
pub use study::{Study, StudyError, TIMESTAMP_FORMAT};
