// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `local` task server.
//!
//! Local mode walks the concrete DAG topologically and drives each record
//! through a [`StepExecutor`] inline; batch mode serializes one task per
//! step onto the on-disk queue and lets workers provide the concurrency.
//! Both modes observe the same ordering guarantee: an edge's source reaches
//! `FINISHED` before its target is submitted.

use crate::error::ServerError;
use crate::executor::StepExecutor;
use crate::queue::{QueuedTask, TaskQueue, WorkerInfo};
use crate::script::LocalScriptAdapter;
use crate::task_server::{QueueStatus, RunMode, RunSummary, TaskServer};
use crate::worker::{run_worker, WorkerConfig};
use async_trait::async_trait;
use merlin_core::{ReturnCode, State, SystemClock};
use merlin_spec::Specification;
use merlin_study::{Study, SOURCE_NODE};
use std::collections::HashSet;
use std::path::PathBuf;

/// The shipped backend: inline execution plus the on-disk queue.
#[derive(Debug, Clone)]
pub struct LocalTaskServer {
    /// Resolved output root; study workspaces and the queue live under it
    output_root: PathBuf,
}

impl LocalTaskServer {
    /// Create a backend anchored at the resolved output root.
    pub fn new(output_root: PathBuf) -> Self {
        Self { output_root }
    }

    /// Queue root for a spec: `<output_root>/<study>.queue`.
    pub fn queue_root(&self, spec: &Specification) -> PathBuf {
        self.output_root.join(format!("{}.queue", spec.name()))
    }

    fn task_queue(&self, spec: &Specification) -> TaskQueue {
        TaskQueue::new(self.queue_root(spec))
    }

    /// The queues used by the selected steps, deduplicated in first-use
    /// order.
    fn queues_for_steps(spec: &Specification, steps: &[String]) -> Vec<String> {
        let selected = spec.select_steps(steps);
        let mut queues = Vec::new();
        let mut seen = HashSet::new();
        for name in selected {
            let Some(step) = spec.get_step(&name) else {
                tracing::warn!(step = name, "unknown step in selection, skipping");
                continue;
            };
            let queue = step.run.task_queue();
            if seen.insert(queue.clone()) {
                queues.push(queue);
            }
        }
        queues
    }

    async fn run_local(&self, study: &Study) -> Result<RunSummary, ServerError> {
        let mut dag = study.stage()?;
        study.provision()?;

        let clock = SystemClock;
        let executor = StepExecutor::new(&clock, study.dry_run);
        let adapter = LocalScriptAdapter::new(study.spec.batch.shell.clone());
        let mut summary = RunSummary::default();

        for name in dag.topological_sort() {
            if name == SOURCE_NODE {
                continue;
            }
            let upstream_ok = dag
                .predecessors(&name)
                .iter()
                .filter(|p| *p != SOURCE_NODE)
                .all(|p| {
                    dag.value(p).map_or(false, |step| {
                        matches!(step.record.status(), State::Finished)
                    })
                });
            let Some(step) = dag.value_mut(&name) else {
                continue;
            };

            if !study.dry_run && !upstream_ok {
                tracing::warn!(step = name, "cancelling step: an upstream step did not finish");
                step.record.mark_end(State::Cancelled, &clock);
                summary.cancelled += 1;
                continue;
            }

            match executor.execute(step, &adapter).await {
                Ok(ReturnCode::DryOk) => summary.dry += 1,
                Ok(_) => summary.finished += 1,
                Err(error) => {
                    tracing::error!(step = name, %error, "step failed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn run_batch(&self, study: &Study) -> Result<RunSummary, ServerError> {
        let dag = study.stage()?;
        study.provision()?;

        let queue = self.task_queue(&study.spec);
        let mut summary = RunSummary::default();
        for name in dag.topological_sort() {
            if name == SOURCE_NODE {
                continue;
            }
            let Some(step) = dag.value(&name) else {
                continue;
            };
            let deps: Vec<PathBuf> = dag
                .predecessors(&name)
                .iter()
                .filter(|p| *p != SOURCE_NODE)
                .filter_map(|p| dag.value(p))
                .map(|p| p.workspace().to_path_buf())
                .collect();
            queue.enqueue(&QueuedTask {
                study: study.name().to_string(),
                step: step.clone(),
                queue: step.task_queue(),
                deps,
            })?;
            summary.enqueued += 1;
        }
        tracing::info!(
            enqueued = summary.enqueued,
            root = %queue.root().display(),
            "study enqueued; start workers with 'merlin run-workers'"
        );
        Ok(summary)
    }
}

#[async_trait]
impl TaskServer for LocalTaskServer {
    async fn run(&self, study: &Study, mode: RunMode) -> Result<RunSummary, ServerError> {
        // Dry runs only stage workspaces and scripts, so batch mode has
        // nothing to enqueue either.
        if study.dry_run || mode == RunMode::Local {
            self.run_local(study).await
        } else {
            self.run_batch(study).await
        }
    }

    async fn launch_workers(
        &self,
        spec: &Specification,
        steps: &[String],
        worker_args: Option<&str>,
        echo: bool,
    ) -> Result<Vec<String>, ServerError> {
        let queue = self.task_queue(spec);
        let selection = spec.select_steps(steps);
        let mut commands = Vec::new();
        let mut handles = Vec::new();

        for (name, def) in spec.workers() {
            // A worker serves the intersection of its declared steps and
            // the requested selection.
            let worker_steps: Vec<String> = spec
                .select_steps(&def.steps)
                .into_iter()
                .filter(|s| selection.contains(s))
                .collect();
            if worker_steps.is_empty() {
                continue;
            }
            let queues = Self::queues_for_steps(spec, &worker_steps);
            let args = worker_args
                .or(def.args.as_deref())
                .map(|a| format!(" {}", a))
                .unwrap_or_default();
            let command = format!("merlin-worker {} --queues {}{}", name, queues.join(","), args);
            commands.push(command.clone());

            if echo {
                continue;
            }
            let mut config = WorkerConfig::new(name, queues);
            config.shell = spec.batch.shell.clone();
            let queue = queue.clone();
            handles.push(tokio::spawn(run_worker(config, queue)));
        }

        for handle in handles {
            match handle.await {
                Ok(result) => {
                    result?;
                }
                Err(error) => tracing::error!(%error, "worker task panicked"),
            }
        }
        Ok(commands)
    }

    async fn query_status(
        &self,
        spec: &Specification,
        steps: &[String],
    ) -> Result<Vec<QueueStatus>, ServerError> {
        let queue = self.task_queue(spec);
        Ok(Self::queues_for_steps(spec, steps)
            .into_iter()
            .map(|name| QueueStatus {
                queued: queue.pending_count(&name),
                workers: queue.workers_on_queue(&name),
                name,
            })
            .collect())
    }

    async fn purge_tasks(
        &self,
        spec: &Specification,
        force: bool,
        steps: &[String],
    ) -> Result<usize, ServerError> {
        if !force {
            tracing::warn!("refusing to purge without force");
            return Ok(0);
        }
        let queue = self.task_queue(spec);
        queue.purge(&Self::queues_for_steps(spec, steps))
    }

    async fn stop_workers(
        &self,
        spec: &Specification,
        names: &[String],
        queues: &[String],
        worker_regex: Option<&str>,
    ) -> Result<usize, ServerError> {
        let queue = self.task_queue(spec);
        queue.request_stop(names, queues, worker_regex)
    }

    async fn query_workers(&self, spec: &Specification) -> Result<Vec<WorkerInfo>, ServerError> {
        Ok(self.task_queue(spec).workers())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
