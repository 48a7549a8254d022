// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step records and their behavioral wrapper.
//!
//! A [`StepRecord`] is one concrete, runnable instantiation of a declared
//! step: its workspace, parameter bookkeeping, and run-time status. A
//! [`Step`] wraps a record with the command-level behavior the expander
//! needs (parameter masks, fan-out, clones, queue resolution).
//!
//! Ownership is exclusive: once a record is handed to an executor, nothing
//! else mutates it. Timestamps are set-once; repeated `mark_*` calls keep
//! the first value.

use crate::parameters::{ParameterSet, LABEL_TOKEN};
use chrono::{DateTime, Utc};
use merlin_core::{format_hms, round_to_seconds, Clock, State, UNSET_TIME};
use merlin_spec::StudyStep;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default upper bound on restart attempts; 0 means unbounded.
pub const DEFAULT_RESTART_LIMIT: u32 = 3;

/// Reserved sample tokens recognized (and left unexpanded) by the core.
const SAMPLE_TOKENS: &[&str] = &[
    "MERLIN_SAMPLE_ID",
    "MERLIN_SAMPLE_PATH",
    "merlin_sample_id",
    "merlin_sample_path",
];

/// Token substituted with the record's own workspace at script time.
pub const WORKSPACE_TOKEN: &str = "$(WORKSPACE)";

/// One concrete execution of a study step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// The (possibly parameter-suffixed) step definition
    pub step: StudyStep,
    /// Absolute, unique output directory for this record
    pub workspace: PathBuf,
    /// Which global parameters influence this record, in declaration order.
    /// `None` means not yet computed by the expander.
    pub param_vector: Option<Vec<bool>>,
    /// Which parameter combination this record represents; `None` when the
    /// record is not parameterized
    pub param_index: Option<usize>,
    /// Backend-assigned identifiers, append-only
    pub jobids: Vec<String>,
    /// Path of the generated run script, once written
    pub script: Option<PathBuf>,
    /// Path of the generated restart script, if any
    pub restart_script: Option<PathBuf>,
    /// True when the script goes to a scheduler instead of running inline
    pub to_be_scheduled: bool,
    /// Upper bound on restart attempts; 0 means unbounded
    pub restart_limit: u32,
    num_restarts: u32,
    status: State,
    submit_time: Option<DateTime<Utc>>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl StepRecord {
    /// Create a record for a step with the given workspace.
    pub fn new(workspace: PathBuf, step: StudyStep) -> Self {
        let restart_limit = step.run.max_retries.unwrap_or(DEFAULT_RESTART_LIMIT);
        Self {
            step,
            workspace,
            param_vector: None,
            param_index: None,
            jobids: Vec::new(),
            script: None,
            restart_script: None,
            to_be_scheduled: false,
            restart_limit,
            num_restarts: 0,
            status: State::Initialized,
            submit_time: None,
            start_time: None,
            end_time: None,
        }
    }

    /// The record's (possibly parameter-suffixed) name.
    pub fn name(&self) -> &str {
        &self.step.name
    }

    /// Current execution state.
    pub fn status(&self) -> State {
        self.status
    }

    /// Number of restarts performed so far.
    pub fn num_restarts(&self) -> u32 {
        self.num_restarts
    }

    /// Mark the record submitted. The submit time is set once.
    pub fn mark_submitted(&mut self, clock: &dyn Clock) {
        tracing::debug!(step = self.name(), previous = %self.status, "marking submitted (PENDING)");
        self.status = State::Pending;
        if self.submit_time.is_none() {
            self.submit_time = Some(round_to_seconds(clock.now()));
        } else {
            tracing::debug!(step = self.name(), "submit time already set, keeping it");
        }
    }

    /// Mark the record running. The start time is set once.
    pub fn mark_running(&mut self, clock: &dyn Clock) {
        tracing::debug!(step = self.name(), previous = %self.status, "marking running (RUNNING)");
        self.status = State::Running;
        if self.start_time.is_none() {
            self.start_time = Some(round_to_seconds(clock.now()));
        }
    }

    /// Mark the record ended in a terminal state. The end time is set once.
    pub fn mark_end(&mut self, state: State, clock: &dyn Clock) {
        tracing::debug!(step = self.name(), %state, previous = %self.status, "marking finished");
        self.status = state;
        if self.end_time.is_none() {
            self.end_time = Some(round_to_seconds(clock.now()));
        }
    }

    /// Mark the record timed out and decide whether it may restart.
    ///
    /// A restart limit of zero designates unlimited restarts; otherwise the
    /// budget is `restart_limit` attempts. Returns true when the caller
    /// should resubmit.
    pub fn mark_restart(&mut self) -> bool {
        tracing::debug!(step = self.name(), previous = %self.status, "marking restarting (TIMEDOUT)");
        self.status = State::Timedout;
        if self.restart_limit == 0 || self.num_restarts < self.restart_limit {
            self.num_restarts += 1;
            true
        } else {
            false
        }
    }

    /// Elapsed time including queue wait: `end - submit` when both are set,
    /// a running total while the step runs, else a dash marker.
    pub fn elapsed_time(&self, clock: &dyn Clock) -> String {
        match (self.submit_time, self.end_time) {
            (Some(submit), Some(end)) => format_hms(end - submit),
            (Some(submit), None) if self.status == State::Running => {
                format_hms(clock.now() - submit)
            }
            _ => UNSET_TIME.to_string(),
        }
    }

    /// Run time excluding queue wait: `end - start` when both are set.
    pub fn run_time(&self, clock: &dyn Clock) -> String {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => format_hms(end - start),
            (Some(start), None) if self.status == State::Running => {
                format_hms(clock.now() - start)
            }
            _ => UNSET_TIME.to_string(),
        }
    }

    /// The submission timestamp as text, or a dash marker.
    pub fn time_submitted(&self) -> String {
        self.submit_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--".to_string())
    }

    /// The start timestamp as text, or a dash marker.
    pub fn time_start(&self) -> String {
        self.start_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--".to_string())
    }

    /// The end timestamp as text, or a dash marker.
    pub fn time_end(&self) -> String {
        self.end_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--".to_string())
    }
}

/// Behavioral wrapper over a [`StepRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub record: StepRecord,
}

impl Step {
    /// Wrap a fresh record for `step` rooted at `workspace`.
    pub fn new(workspace: PathBuf, step: StudyStep) -> Self {
        Self {
            record: StepRecord::new(workspace, step),
        }
    }

    /// The step name (suffixed after fan-out, e.g. `sim/X.1`).
    pub fn name(&self) -> &str {
        self.record.name()
    }

    /// The step name flattened for use as a file stem (`sim/X.1` → `sim.X.1`).
    pub fn flat_name(&self) -> String {
        self.name().replace('/', ".")
    }

    /// The run command with all substitutions applied so far.
    pub fn cmd(&self) -> &str {
        &self.record.step.run.cmd
    }

    /// The restart command, if declared.
    pub fn restart_cmd(&self) -> Option<&str> {
        self.record.step.run.restart.as_deref()
    }

    /// The workspace this step executes in.
    pub fn workspace(&self) -> &Path {
        &self.record.workspace
    }

    /// The task queue this step's work goes to.
    pub fn task_queue(&self) -> String {
        self.record.step.run.task_queue()
    }

    /// Dependency names with fan-in suffixes stripped.
    pub fn depends(&self) -> Vec<String> {
        self.record.step.depends().map(str::to_string).collect()
    }

    /// Dependency names declared with the `_*` fan-in suffix.
    pub fn fan_in_depends(&self) -> Vec<String> {
        self.record
            .step
            .fan_in_depends()
            .map(str::to_string)
            .collect()
    }

    /// True iff the command references any global parameter directly.
    pub fn contains_global_params(&self, params: &ParameterSet) -> bool {
        params
            .keys()
            .any(|key| self.cmd().contains(&format!("$({})", key)))
    }

    /// Boolean mask over the parameter keys in declaration order: element
    /// *i* is true iff `$(keys[i])` appears in the command.
    pub fn global_param_mask(&self, params: &ParameterSet) -> Vec<bool> {
        params
            .keys()
            .map(|key| self.cmd().contains(&format!("$({})", key)))
            .collect()
    }

    /// Produce the *P* parameterized copies of this step.
    ///
    /// Returns `None` when there are no parameters or the mask is all-false.
    /// Copy *i* substitutes `$(k)`, `$(k.label)`, and `$(k.name)` for every
    /// masked parameter *k* into both the run and restart commands, carries
    /// `param_index = i`, and is paired with its suffixed name
    /// `<orig>/<label>.<label>...` over the masked keys in declaration order.
    pub fn expand_global_params(
        &self,
        params: &ParameterSet,
        mask: &[bool],
    ) -> Option<Vec<(Step, String)>> {
        if params.is_empty() || !mask.contains(&true) {
            return None;
        }

        let cardinality = params.cardinality();
        let mut expanded = Vec::with_capacity(cardinality);
        for index in 0..cardinality {
            let mut copy = self.clone();
            copy.record.param_index = Some(index);
            let mut name = format!("{}/", self.name());
            for (position, (key, entry)) in params.iter().enumerate() {
                if !mask.get(position).copied().unwrap_or(false) {
                    continue;
                }
                let value = entry.values[index].to_string();
                let label = entry.label.replace(LABEL_TOKEN, &value);
                copy.substitute(&format!("$({}.label)", key), &label);
                copy.substitute(&format!("$({})", key), &value);
                copy.substitute(&format!("$({}.name)", key), &entry.name);
                if !name.ends_with('/') {
                    name.push('.');
                }
                name.push_str(&label);
            }
            copy.record.step.name = name.clone();
            expanded.push((copy, name));
        }
        Some(expanded)
    }

    /// Deep copy with optional command override, literal replacement pairs
    /// (applied case-insensitively to both commands), and a new workspace.
    pub fn clone_with(
        &self,
        new_cmd: Option<&str>,
        replacement_pairs: Option<&[(String, String)]>,
        new_workspace: Option<PathBuf>,
    ) -> Step {
        let mut copy = self.clone();
        if let Some(cmd) = new_cmd {
            copy.record.step.run.cmd = cmd.to_string();
        }
        if let Some(pairs) = replacement_pairs {
            for (from, to) in pairs {
                copy.replace_case_insensitive(from, to);
            }
        }
        if let Some(workspace) = new_workspace {
            copy.record.workspace = workspace;
        }
        copy
    }

    /// True iff the run or restart command references a sample column label
    /// or one of the reserved sample tokens.
    pub fn needs_sample_expansion(&self, labels: &[String]) -> bool {
        let mut tokens: Vec<&str> = labels.iter().map(String::as_str).collect();
        tokens.extend_from_slice(SAMPLE_TOKENS);

        let in_cmd = |cmd: &str| tokens.iter().any(|t| cmd.contains(&format!("$({})", t)));
        in_cmd(self.cmd()) || self.restart_cmd().is_some_and(in_cmd)
    }

    /// Substitute the step's own `$(WORKSPACE)` token into both commands.
    pub fn substitute_workspace_token(&mut self) {
        let workspace = self.record.workspace.display().to_string();
        self.substitute(WORKSPACE_TOKEN, &workspace);
    }

    /// Replace a literal token in both the run and restart commands.
    pub fn substitute(&mut self, from: &str, to: &str) {
        let run = &mut self.record.step.run;
        run.cmd = run.cmd.replace(from, to);
        if let Some(restart) = &run.restart {
            run.restart = Some(restart.replace(from, to));
        }
    }

    fn replace_case_insensitive(&mut self, from: &str, to: &str) {
        let Ok(pattern) = RegexBuilder::new(&regex::escape(from))
            .case_insensitive(true)
            .build()
        else {
            tracing::warn!(from, "skipping unbuildable replacement pattern");
            return;
        };
        let run = &mut self.record.step.run;
        run.cmd = pattern.replace_all(&run.cmd, regex::NoExpand(to)).to_string();
        if let Some(restart) = &run.restart {
            run.restart = Some(pattern.replace_all(restart, regex::NoExpand(to)).to_string());
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
