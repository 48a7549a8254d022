// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one step record through its state machine.
//!
//! Restart is a state transition, not control flow: the loop resubmits
//! while `mark_restart` grants budget, using the restart script when one
//! exists. Runtime failures are recorded on the step record and surfaced
//! as typed errors; the caller decides whether siblings keep going.

use crate::error::ExecuteError;
use crate::script::ScriptAdapter;
use merlin_core::{Clock, ReturnCode, State, FAILED_SENTINEL, FINISHED_SENTINEL};
use merlin_study::Step;
use std::fs;

/// Executes step records against a script adapter.
pub struct StepExecutor<'a> {
    clock: &'a dyn Clock,
    dry_run: bool,
}

impl<'a> StepExecutor<'a> {
    /// Create an executor.
    pub fn new(clock: &'a dyn Clock, dry_run: bool) -> Self {
        Self { clock, dry_run }
    }

    /// Execute one step to a terminal state.
    ///
    /// In dry-run mode the workspace and scripts are staged and `DryOk` is
    /// returned without submitting anything.
    pub async fn execute(
        &self,
        step: &mut Step,
        adapter: &dyn ScriptAdapter,
    ) -> Result<ReturnCode, ExecuteError> {
        let workspace = step.workspace().to_path_buf();
        fs::create_dir_all(&workspace)?;

        step.substitute_workspace_token();
        let scripts = adapter.write_script(&workspace, step)?;
        step.record.to_be_scheduled = scripts.to_be_scheduled;
        step.record.script = Some(scripts.script.clone());
        step.record.restart_script = scripts.restart_script.clone();

        if self.dry_run {
            tracing::info!(step = step.name(), "dry run: scripts staged, nothing submitted");
            return Ok(ReturnCode::DryOk);
        }

        tracing::info!(step = step.name(), workspace = %workspace.display(), "Executing step '{}' in '{}'", step.name(), workspace.display());
        let mut use_restart = false;
        loop {
            step.record.mark_submitted(self.clock);
            if !scripts.to_be_scheduled {
                step.record.mark_running(self.clock);
            }

            let script = match (&scripts.restart_script, use_restart) {
                (Some(restart), true) => restart,
                _ => &scripts.script,
            };
            let submission = adapter.submit(step, script, &workspace).await?;
            if submission.code == merlin_core::SubmissionCode::Ok {
                step.record.jobids.push(submission.jobid.clone());
            }

            match ReturnCode::from_exit_status(submission.retcode) {
                ReturnCode::Ok => {
                    step.record.mark_end(State::Finished, self.clock);
                    fs::write(workspace.join(FINISHED_SENTINEL), "")?;
                    return Ok(ReturnCode::Ok);
                }
                code if code.wants_restart() => {
                    if step.record.mark_restart() {
                        tracing::info!(
                            step = step.name(),
                            attempt = step.record.num_restarts(),
                            "restarting timed-out step"
                        );
                        use_restart = true;
                        continue;
                    }
                    step.record.mark_end(State::Failed, self.clock);
                    fs::write(workspace.join(FAILED_SENTINEL), "")?;
                    return Err(ExecuteError::RestartExhausted {
                        step: step.name().to_string(),
                        attempts: step.record.num_restarts(),
                    });
                }
                _ => {
                    step.record.mark_end(State::Failed, self.clock);
                    fs::write(workspace.join(FAILED_SENTINEL), "")?;
                    return Err(ExecuteError::SubmissionFailed {
                        step: step.name().to_string(),
                        retcode: submission.retcode,
                        stderr: submission.stderr.unwrap_or_default(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
