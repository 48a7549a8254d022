// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script adapters: turn a step into a shell script and submit it.
//!
//! The local adapter runs the script as a child process and waits for it;
//! the batch adapter prepends a scheduler prologue and hands the script to
//! the scheduler's submit command, returning immediately with the scheduler
//! job id.

use async_trait::async_trait;
use merlin_core::SubmissionCode;
use merlin_spec::BatchConfig;
use merlin_study::Step;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// What `write_script` produced.
#[derive(Debug, Clone)]
pub struct ScriptSet {
    /// True when the script goes to a scheduler instead of running inline
    pub to_be_scheduled: bool,
    pub script: PathBuf,
    pub restart_script: Option<PathBuf>,
}

/// Outcome of one submission.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub code: SubmissionCode,
    pub retcode: i32,
    pub jobid: String,
    pub stderr: Option<String>,
}

/// Writes per-step scripts and submits them.
#[async_trait]
pub trait ScriptAdapter: Send + Sync {
    /// Write the run (and optional restart) script into the workspace.
    fn write_script(&self, workspace: &Path, step: &Step) -> io::Result<ScriptSet>;

    /// Submit a previously written script with `cwd` as working directory.
    async fn submit(&self, step: &Step, script: &Path, cwd: &Path)
        -> io::Result<SubmissionRecord>;
}

fn write_executable(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

fn shell_for(step: &Step, default_shell: &str) -> String {
    step.record
        .step
        .run
        .shell
        .clone()
        .unwrap_or_else(|| default_shell.to_string())
}

/// Adapter for inline execution on the current machine.
#[derive(Debug, Clone)]
pub struct LocalScriptAdapter {
    shell: String,
}

impl LocalScriptAdapter {
    /// Create an adapter with the study's default shell.
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for LocalScriptAdapter {
    fn default() -> Self {
        Self::new("/bin/bash")
    }
}

#[async_trait]
impl ScriptAdapter for LocalScriptAdapter {
    fn write_script(&self, workspace: &Path, step: &Step) -> io::Result<ScriptSet> {
        let shell = shell_for(step, &self.shell);
        let stem = step.flat_name();

        let script = workspace.join(format!("{}.sh", stem));
        write_executable(&script, &format!("#!{}\n\n{}\n", shell, step.cmd()))?;

        let restart_script = match step.restart_cmd() {
            Some(restart) => {
                let path = workspace.join(format!("{}.restart.sh", stem));
                write_executable(&path, &format!("#!{}\n\n{}\n", shell, restart))?;
                Some(path)
            }
            None => None,
        };

        tracing::debug!(step = step.name(), script = %script.display(), "wrote local script");
        Ok(ScriptSet {
            to_be_scheduled: false,
            script,
            restart_script,
        })
    }

    async fn submit(
        &self,
        step: &Step,
        script: &Path,
        cwd: &Path,
    ) -> io::Result<SubmissionRecord> {
        tracing::debug!(step = step.name(), script = %script.display(), cwd = %cwd.display(), "executing script");
        let mut child = Command::new(script)
            .current_dir(cwd)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()?;
        let pid = child.id().unwrap_or_default();
        let output = child.wait_with_output().await?;

        let stem = step.flat_name();
        fs::write(cwd.join(format!("{}.{}.out", stem, pid)), &output.stdout)?;
        fs::write(cwd.join(format!("{}.{}.err", stem, pid)), &output.stderr)?;

        let retcode = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if retcode == 0 {
            Ok(SubmissionRecord {
                code: SubmissionCode::Ok,
                retcode,
                jobid: pid.to_string(),
                stderr: None,
            })
        } else {
            tracing::warn!(step = step.name(), retcode, "execution returned an error");
            Ok(SubmissionRecord {
                code: SubmissionCode::Error,
                retcode,
                jobid: pid.to_string(),
                stderr: Some(stderr),
            })
        }
    }
}

/// Adapter for scheduler-managed execution.
///
/// The prologue renders what the study and step declare (queue, walltime,
/// node counts); the submit command is resolved from the scheduler type.
#[derive(Debug, Clone)]
pub struct BatchScriptAdapter {
    batch: BatchConfig,
}

impl BatchScriptAdapter {
    pub fn new(batch: BatchConfig) -> Self {
        Self { batch }
    }

    fn directive(&self) -> &'static str {
        match self.batch.batch_type.as_str() {
            "lsf" => "#BSUB",
            "flux" => "#flux:",
            _ => "#SBATCH",
        }
    }

    fn submit_command(&self) -> Vec<String> {
        match self.batch.batch_type.as_str() {
            "lsf" => vec!["bsub".to_string()],
            "flux" => vec!["flux".to_string(), "batch".to_string()],
            _ => vec!["sbatch".to_string()],
        }
    }

    fn prologue(&self, step: &Step) -> String {
        let directive = self.directive();
        let run = &step.record.step.run;
        let step_batch = run.batch.as_ref();

        let mut lines = vec![format!("{} --job-name {}", directive, step.flat_name())];
        let queue = step_batch
            .and_then(|b| b.queue.clone())
            .or_else(|| self.batch.queue.clone());
        if let Some(queue) = queue {
            lines.push(format!("{} --partition {}", directive, queue));
        }
        let walltime = run.walltime.clone().or_else(|| self.batch.walltime.clone());
        if let Some(walltime) = walltime {
            lines.push(format!("{} --time {}", directive, walltime));
        }
        if let Some(nodes) = step_batch.and_then(|b| b.nodes) {
            lines.push(format!("{} --nodes {}", directive, nodes));
        }
        if let Some(procs) = step_batch.and_then(|b| b.procs) {
            lines.push(format!("{} --ntasks {}", directive, procs));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ScriptAdapter for BatchScriptAdapter {
    fn write_script(&self, workspace: &Path, step: &Step) -> io::Result<ScriptSet> {
        let shell = shell_for(step, &self.batch.shell);
        let stem = step.flat_name();
        let prologue = self.prologue(step);

        let script = workspace.join(format!("{}.sh", stem));
        write_executable(
            &script,
            &format!("#!{}\n{}\n\n{}\n", shell, prologue, step.cmd()),
        )?;

        let restart_script = match step.restart_cmd() {
            Some(restart) => {
                let path = workspace.join(format!("{}.restart.sh", stem));
                write_executable(&path, &format!("#!{}\n{}\n\n{}\n", shell, prologue, restart))?;
                Some(path)
            }
            None => None,
        };

        Ok(ScriptSet {
            to_be_scheduled: true,
            script,
            restart_script,
        })
    }

    async fn submit(
        &self,
        step: &Step,
        script: &Path,
        cwd: &Path,
    ) -> io::Result<SubmissionRecord> {
        let command = self.submit_command();
        tracing::info!(step = step.name(), command = ?command, "submitting to scheduler");
        let output = Command::new(&command[0])
            .args(&command[1..])
            .arg(script)
            .current_dir(cwd)
            .output()
            .await?;

        let retcode = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        // Schedulers print the job id as the last token (e.g. "Submitted
        // batch job 1234").
        let jobid = stdout
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string();
        if output.status.success() {
            Ok(SubmissionRecord {
                code: SubmissionCode::Ok,
                retcode,
                jobid,
                stderr: None,
            })
        } else {
            Ok(SubmissionRecord {
                code: SubmissionCode::Error,
                retcode,
                jobid,
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            })
        }
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
