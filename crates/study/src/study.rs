// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A staged study: one specification bound to one output workspace.

use crate::dag::Dag;
use crate::expand::{stage, ExpandError};
use crate::parameters::{ParamError, ParameterSet};
use crate::step::Step;
use merlin_spec::{SpecError, Specification};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Timestamp format suffixed onto study workspace directories.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Errors raised while setting up or staging a study.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error("failed to prepare study workspace: {0}")]
    Io(#[from] std::io::Error),
}

/// A study: the expanded specification plus its workspace on disk.
#[derive(Debug, Clone)]
pub struct Study {
    pub spec: Specification,
    /// `<output_root>/<name>_<timestamp>` (or the restart directory)
    pub workspace: PathBuf,
    pub parameters: ParameterSet,
    pub dry_run: bool,
}

impl Study {
    /// Create a fresh study workspace under the spec's output root.
    ///
    /// `spec_dir` anchors a relative `OUTPUT_PATH`; `timestamp` is the
    /// pre-formatted run stamp.
    pub fn new(
        spec: Specification,
        spec_dir: &Path,
        timestamp: &str,
        dry_run: bool,
    ) -> Result<Self, StudyError> {
        let output = spec.output_path();
        let root = if output.is_absolute() {
            output
        } else {
            spec_dir.join(output)
        };
        let workspace = root.join(format!("{}_{}", spec.name(), timestamp));
        Self::with_workspace(spec, workspace, dry_run)
    }

    /// Rebuild a study over an existing workspace (restart path).
    pub fn with_workspace(
        spec: Specification,
        workspace: PathBuf,
        dry_run: bool,
    ) -> Result<Self, StudyError> {
        let parameters = ParameterSet::from_spec(&spec.globals)?;
        Ok(Self {
            spec,
            workspace,
            parameters,
            dry_run,
        })
    }

    /// The study name.
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Create the workspace tree and write the provenance spec.
    pub fn provision(&self) -> Result<PathBuf, StudyError> {
        std::fs::create_dir_all(&self.workspace)?;
        let provenance = self.spec.write_provenance(&self.workspace)?;
        tracing::info!(workspace = %self.workspace.display(), "Study workspace is '{}'", self.workspace.display());
        Ok(provenance)
    }

    /// Expand the symbolic step list into the concrete DAG.
    pub fn stage(&self) -> Result<Dag<Step>, StudyError> {
        Ok(stage(&self.workspace, &self.spec.study, &self.parameters)?)
    }
}

#[cfg(test)]
#[path = "study_tests.rs"]
mod tests;
