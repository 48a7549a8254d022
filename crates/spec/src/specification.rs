// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serde model of the YAML study specification.
//!
//! The specification is immutable after load; the only mutation points are
//! [`crate::expand::expand_spec`] (applied once, before graph construction)
//! and deserialization itself. Declaration order is semantic for steps,
//! global parameters, and workers, so ordered collections use `IndexMap`.

use crate::error::SpecError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A YAML scalar carried through expansion: parameter values, environment
/// variables, and override vars all use this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

/// Study metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `env` block: variables substituted into commands at expansion time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Env {
    #[serde(default)]
    pub variables: IndexMap<String, ParamValue>,
}

/// Study-level batch defaults; individual steps may override via `run.batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scheduler type: "local" (no scheduler), "slurm", "lsf", or "flux"
    #[serde(rename = "type", default = "default_batch_type")]
    pub batch_type: String,
    /// Shell used for step scripts
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Scheduler queue/partition
    #[serde(default)]
    pub queue: Option<String>,
    /// Default walltime for scheduled steps
    #[serde(default)]
    pub walltime: Option<String>,
}

fn default_batch_type() -> String {
    "local".to_string()
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_type: default_batch_type(),
            shell: default_shell(),
            queue: None,
            walltime: None,
        }
    }
}

/// Per-step batch override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepBatch {
    #[serde(rename = "type", default)]
    pub batch_type: Option<String>,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub nodes: Option<u32>,
    #[serde(default)]
    pub procs: Option<u32>,
}

/// The `run` block of a study step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    /// Upstream step names; a trailing `_*` marks a fan-in over all
    /// parameterized copies of the dependency
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_queue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<StepBatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walltime: Option<String>,
}

/// One declared step of the study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyStep {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub run: RunConfig,
}

impl RunConfig {
    /// The task queue this step's work goes to; `none` (any casing) and an
    /// absent declaration both resolve to the default queue.
    pub fn task_queue(&self) -> String {
        match self.task_queue.as_deref() {
            Some(queue) if !queue.eq_ignore_ascii_case("none") => queue.to_string(),
            _ => merlin_core::DEFAULT_TASK_QUEUE.to_string(),
        }
    }
}

impl StudyStep {
    /// Dependency names with any fan-in suffix stripped.
    pub fn depends(&self) -> impl Iterator<Item = &str> {
        self.run
            .depends
            .iter()
            .map(|d| d.strip_suffix("_*").unwrap_or(d))
    }

    /// Dependency names declared with the `_*` fan-in suffix.
    pub fn fan_in_depends(&self) -> impl Iterator<Item = &str> {
        self.run
            .depends
            .iter()
            .filter_map(|d| d.strip_suffix("_*"))
    }
}

/// A global parameter: a value list plus a `%%` label template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalParam {
    pub values: Vec<ParamValue>,
    pub label: String,
}

/// A declared worker: which steps it serves and extra backend args.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerDef {
    #[serde(default = "default_worker_steps")]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
}

fn default_worker_steps() -> Vec<String> {
    vec!["all".to_string()]
}

/// `merlin.resources` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default = "default_task_server")]
    pub task_server: String,
    #[serde(default)]
    pub workers: IndexMap<String, WorkerDef>,
}

fn default_task_server() -> String {
    "local".to_string()
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            task_server: default_task_server(),
            workers: IndexMap::new(),
        }
    }
}

/// Sample configuration; samples are expanded by the dispatch layer, the
/// core only needs the column labels for expansion checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplesConfig {
    #[serde(default)]
    pub column_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// `merlin` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerlinSection {
    #[serde(default)]
    pub resources: Resources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<SamplesConfig>,
}

/// The parsed study specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub description: Description,
    #[serde(default)]
    pub env: Env,
    #[serde(default)]
    pub batch: BatchConfig,
    pub study: Vec<StudyStep>,
    #[serde(
        default,
        rename = "global.parameters",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub globals: IndexMap<String, GlobalParam>,
    #[serde(default)]
    pub merlin: MerlinSection,
}

/// Provenance file suffix under `merlin_info`.
const EXPANDED_SUFFIX: &str = ".expanded.yaml";

/// Name of the per-study metadata directory.
pub const INFO_DIR: &str = "merlin_info";

impl Specification {
    /// Parse a specification from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, SpecError> {
        let spec: Specification = serde_yaml::from_str(text)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load and validate a specification file.
    pub fn load_file(path: &Path) -> Result<Self, SpecError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Study name from the description block.
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// The workspace root: `env.variables.OUTPUT_PATH` when set, else `.`
    /// (resolved against the spec file's directory by the caller).
    pub fn output_path(&self) -> PathBuf {
        match self.env.variables.get("OUTPUT_PATH") {
            Some(v) => PathBuf::from(v.to_string()),
            None => PathBuf::from("."),
        }
    }

    /// Look up a study step by declared name.
    pub fn get_step(&self, name: &str) -> Option<&StudyStep> {
        self.study.iter().find(|s| s.name == name)
    }

    /// Declared step names in declaration order.
    pub fn step_names(&self) -> Vec<String> {
        self.study.iter().map(|s| s.name.clone()).collect()
    }

    /// Resolve a step selection (`["all"]` or explicit names) to step names.
    pub fn select_steps(&self, selection: &[String]) -> Vec<String> {
        if selection.is_empty() || selection.iter().any(|s| s == "all") {
            return self.step_names();
        }
        selection.to_vec()
    }

    /// Declared workers, or a single `default_worker` over all steps.
    pub fn workers(&self) -> IndexMap<String, WorkerDef> {
        if self.merlin.resources.workers.is_empty() {
            let mut workers = IndexMap::new();
            workers.insert("default_worker".to_string(), WorkerDef::default());
            return workers;
        }
        self.merlin.resources.workers.clone()
    }

    /// Sample column labels, if a samples block is present.
    pub fn sample_labels(&self) -> Vec<String> {
        self.merlin
            .samples
            .as_ref()
            .map(|s| s.column_labels.clone())
            .unwrap_or_default()
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.description.name.trim().is_empty() {
            return Err(SpecError::Invalid(
                "description.name must not be empty".to_string(),
            ));
        }
        if self.study.is_empty() {
            return Err(SpecError::Invalid(
                "study must declare at least one step".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for step in &self.study {
            if step.name.trim().is_empty() {
                return Err(SpecError::Invalid("step name must not be empty".to_string()));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(SpecError::Invalid(format!(
                    "duplicate step name '{}'",
                    step.name
                )));
            }
            if step.run.cmd.trim().is_empty() {
                return Err(SpecError::Invalid(format!(
                    "step '{}' has an empty run.cmd",
                    step.name
                )));
            }
        }
        Ok(())
    }

    /// Write the expanded provenance copy under `<workspace>/merlin_info/`.
    ///
    /// Restart rebuilds the study from this file rather than the user's
    /// original, so overrides and expansion survive.
    pub fn write_provenance(&self, workspace: &Path) -> Result<PathBuf, SpecError> {
        let info_dir = workspace.join(INFO_DIR);
        fs::create_dir_all(&info_dir)?;
        let path = info_dir.join(format!("{}{}", self.name(), EXPANDED_SUFFIX));
        let text = serde_yaml::to_string(self)?;
        fs::write(&path, text)?;
        tracing::debug!(path = %path.display(), "wrote provenance spec");
        Ok(path)
    }

    /// Locate the provenance spec inside an existing study workspace.
    ///
    /// Exactly one `merlin_info/*.expanded.yaml` must match.
    pub fn find_provenance(workspace: &Path) -> Result<PathBuf, SpecError> {
        let pattern = workspace
            .join(INFO_DIR)
            .join(format!("*{}", EXPANDED_SUFFIX))
            .display()
            .to_string();
        let mut matches: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| SpecError::Invalid(format!("bad workspace path: {}", e)))?
            .filter_map(Result::ok)
            .collect();
        match matches.len() {
            0 => Err(SpecError::ProvenanceNotFound { pattern }),
            1 => Ok(matches.remove(0)),
            _ => Err(SpecError::ProvenanceAmbiguous { pattern }),
        }
    }
}

#[cfg(test)]
#[path = "specification_tests.rs"]
mod tests;
