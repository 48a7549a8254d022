// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! merlin-spec: the study specification data contract.
//!
//! Parses the YAML study file into an immutable [`Specification`], applies
//! command-line variable overrides and spec-level `$(VAR)` expansion, and
//! handles the provenance copy (`merlin_info/<name>.expanded.yaml`) that
//! `merlin restart` rebuilds a study from.

pub mod error;
pub mod expand;
pub mod specification;
pub mod vars;

pub use error::SpecError;
pub use expand::{expand_spec, expand_tokens};
pub use specification::{
    BatchConfig, Description, Env, GlobalParam, MerlinSection, ParamValue, Resources, RunConfig,
    SamplesConfig, Specification, StepBatch, StudyStep, WorkerDef, INFO_DIR,
};
pub use vars::{parse_override_vars, OverrideVars, RESERVED};
