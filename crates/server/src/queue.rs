// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk task queue.
//!
//! Layout under the queue root:
//!
//! ```text
//! <root>/<queue>/task-<uuid>.json     pending task descriptors
//! <root>/<queue>/claim-<worker>-...   claimed, being executed
//! <root>/workers/<name>.json          worker heartbeats
//! <root>/stop/<name>                  stop requests, honored between claims
//! ```
//!
//! Claiming is an atomic rename, so concurrent workers on one queue never
//! double-claim. Dependency ordering rides on the workspace sentinels: a
//! task is claimable only when every dependency workspace contains the
//! finished sentinel, and is tombstoned as cancelled when one carries the
//! failed sentinel.

use crate::error::ServerError;
use chrono::{DateTime, Utc};
use merlin_core::{FAILED_SENTINEL, FINISHED_SENTINEL};
use merlin_study::Step;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const WORKERS_DIR: &str = "workers";
const STOP_DIR: &str = "stop";
const TASK_PREFIX: &str = "task-";
const CLAIM_PREFIX: &str = "claim-";

/// One enqueued unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTask {
    /// Study name, for status displays
    pub study: String,
    /// The staged step, commands fully substituted
    pub step: Step,
    /// Queue the task was routed to
    pub queue: String,
    /// Workspaces of every upstream step this task waits on
    pub deps: Vec<PathBuf>,
}

/// Readiness of a pending task's dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DepState {
    Ready,
    Waiting,
    Failed,
}

/// A claimed task: the descriptor plus the claim file to remove when done.
#[derive(Debug)]
pub struct ClaimedTask {
    pub task: QueuedTask,
    pub claim_path: PathBuf,
}

/// A live worker heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub name: String,
    pub pid: u32,
    pub queues: Vec<String>,
    pub started_at: DateTime<Utc>,
}

/// Handle on one queue root directory.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    root: PathBuf,
}

impl TaskQueue {
    /// Open (without creating) a queue rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The queue root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn queue_dir(&self, queue: &str) -> PathBuf {
        self.root.join(queue)
    }

    /// Serialize and enqueue one task.
    pub fn enqueue(&self, task: &QueuedTask) -> Result<PathBuf, ServerError> {
        let dir = self.queue_dir(&task.queue);
        fs::create_dir_all(&dir)?;
        let name = format!("{}{}.json", TASK_PREFIX, uuid::Uuid::new_v4());
        let tmp = dir.join(format!(".{}", name));
        fs::write(&tmp, serde_json::to_vec_pretty(task)?)?;
        let path = dir.join(name);
        fs::rename(&tmp, &path)?;
        tracing::debug!(step = task.step.name(), queue = task.queue, "task enqueued");
        Ok(path)
    }

    fn pending_files(&self, queue: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.queue_dir(queue)) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(TASK_PREFIX) && n.ends_with(".json"))
            })
            .collect();
        files.sort();
        files
    }

    /// Number of pending (unclaimed) tasks on a queue.
    pub fn pending_count(&self, queue: &str) -> usize {
        self.pending_files(queue).len()
    }

    /// Queue names present under the root.
    pub fn queues(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut queues: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| name != WORKERS_DIR && name != STOP_DIR)
            .collect();
        queues.sort();
        queues
    }

    fn dep_state(task: &QueuedTask) -> DepState {
        for dep in &task.deps {
            if dep.join(FAILED_SENTINEL).exists() {
                return DepState::Failed;
            }
            if !dep.join(FINISHED_SENTINEL).exists() {
                return DepState::Waiting;
            }
        }
        DepState::Ready
    }

    /// Claim the first ready task on any of `queues`.
    ///
    /// Tasks whose dependencies failed are tombstoned (their workspaces get
    /// the failed sentinel so cancellation cascades) and reported via the
    /// returned cancelled list.
    pub fn claim(
        &self,
        queues: &[String],
        worker: &str,
    ) -> Result<(Option<ClaimedTask>, Vec<QueuedTask>), ServerError> {
        let mut cancelled = Vec::new();
        for queue in queues {
            for path in self.pending_files(queue) {
                let Ok(bytes) = fs::read(&path) else {
                    continue; // raced with another worker
                };
                let task: QueuedTask = match serde_json::from_slice(&bytes) {
                    Ok(task) => task,
                    Err(error) => {
                        tracing::warn!(path = %path.display(), %error, "skipping unreadable task");
                        continue;
                    }
                };
                match Self::dep_state(&task) {
                    DepState::Waiting => continue,
                    DepState::Failed => {
                        match fs::remove_file(&path) {
                            Ok(()) => {
                                tracing::warn!(
                                    step = task.step.name(),
                                    "cancelling task: an upstream step failed"
                                );
                                // Mark the workspace so this task's own
                                // dependents cancel too
                                fs::create_dir_all(task.step.workspace())?;
                                fs::write(task.step.workspace().join(FAILED_SENTINEL), "")?;
                                cancelled.push(task);
                            }
                            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                            Err(error) => return Err(error.into()),
                        }
                        continue;
                    }
                    DepState::Ready => {
                        if let Some(claim_path) = self.consume(&path, worker)? {
                            return Ok((Some(ClaimedTask { task, claim_path }), cancelled));
                        }
                    }
                }
            }
        }
        Ok((None, cancelled))
    }

    /// Atomically take a pending file; `None` when another worker won.
    fn consume(&self, path: &Path, worker: &str) -> Result<Option<PathBuf>, ServerError> {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        let claim = path.with_file_name(format!("{}{}-{}", CLAIM_PREFIX, worker, file_name));
        match fs::rename(path, &claim) {
            Ok(()) => Ok(Some(claim)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Remove a claim file once its task reached a terminal state.
    pub fn finish(&self, claimed: &ClaimedTask) -> Result<(), ServerError> {
        fs::remove_file(&claimed.claim_path)?;
        Ok(())
    }

    /// Delete all pending tasks on the given queues. Claimed tasks are left
    /// to their workers.
    pub fn purge(&self, queues: &[String]) -> Result<usize, ServerError> {
        let mut purged = 0;
        for queue in queues {
            for path in self.pending_files(queue) {
                match fs::remove_file(&path) {
                    Ok(()) => purged += 1,
                    Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                    Err(error) => return Err(error.into()),
                }
            }
        }
        tracing::info!(purged, "purged pending tasks");
        Ok(purged)
    }

    /// Write or refresh a worker heartbeat.
    pub fn register_worker(&self, info: &WorkerInfo) -> Result<(), ServerError> {
        let dir = self.root.join(WORKERS_DIR);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join(format!("{}.json", info.name)),
            serde_json::to_vec_pretty(info)?,
        )?;
        Ok(())
    }

    /// Remove a worker heartbeat (and any consumed stop request).
    pub fn deregister_worker(&self, name: &str) {
        let heartbeat = self.root.join(WORKERS_DIR).join(format!("{}.json", name));
        if let Err(error) = fs::remove_file(&heartbeat) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(worker = name, %error, "failed to remove worker heartbeat");
            }
        }
        let _ = fs::remove_file(self.root.join(STOP_DIR).join(name));
    }

    /// Live worker heartbeats.
    pub fn workers(&self) -> Vec<WorkerInfo> {
        let Ok(entries) = fs::read_dir(self.root.join(WORKERS_DIR)) else {
            return Vec::new();
        };
        let mut workers: Vec<WorkerInfo> = entries
            .filter_map(Result::ok)
            .filter_map(|e| fs::read(e.path()).ok())
            .filter_map(|bytes| serde_json::from_slice(&bytes).ok())
            .collect();
        workers.sort_by(|a, b| a.name.cmp(&b.name));
        workers
    }

    /// Count live workers serving a queue.
    pub fn workers_on_queue(&self, queue: &str) -> usize {
        self.workers()
            .iter()
            .filter(|w| w.queues.iter().any(|q| q == queue))
            .count()
    }

    /// Drop stop requests for workers selected by name, queue, or name
    /// regex. With no selector every live worker is stopped. Returns how
    /// many stop files were written.
    pub fn request_stop(
        &self,
        names: &[String],
        queues: &[String],
        name_pattern: Option<&str>,
    ) -> Result<usize, ServerError> {
        let pattern = name_pattern.map(regex::Regex::new).transpose()?;
        let select_all = names.is_empty() && queues.is_empty() && pattern.is_none();
        let dir = self.root.join(STOP_DIR);
        fs::create_dir_all(&dir)?;
        let mut stopped = 0;
        for worker in self.workers() {
            let selected = select_all
                || names.iter().any(|n| *n == worker.name)
                || worker.queues.iter().any(|q| queues.contains(q))
                || pattern.as_ref().is_some_and(|p| p.is_match(&worker.name));
            if selected {
                fs::write(dir.join(&worker.name), "")?;
                tracing::info!(worker = worker.name, "stop requested");
                stopped += 1;
            }
        }
        Ok(stopped)
    }

    /// True when a stop request exists for this worker.
    pub fn stop_requested(&self, name: &str) -> bool {
        self.root.join(STOP_DIR).join(name).exists()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
