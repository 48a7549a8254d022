// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One module per CLI verb.

pub mod example;
pub mod info;
pub mod monitor;
pub mod purge;
pub mod restart;
pub mod run;
pub mod status;
pub mod workers;

use anyhow::{Context, Result};
use merlin_spec::{expand_spec, parse_override_vars, Specification};
use std::path::{Path, PathBuf};

/// Load a spec file, apply `--vars` overrides and spec-level expansion.
///
/// Returns the expanded spec plus the spec file's directory (the anchor for
/// relative output paths).
pub(crate) fn load_spec(path: &Path, vars: &[String]) -> Result<(Specification, PathBuf)> {
    let path = path
        .canonicalize()
        .with_context(|| format!("'{}' is not a valid filepath", path.display()))?;
    let overrides = parse_override_vars(vars)?;
    let mut spec = Specification::load_file(&path)?;
    let spec_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    expand_spec(&mut spec, &overrides, &spec_dir);
    Ok((spec, spec_dir))
}

/// The resolved output root for a spec: where study workspaces and the task
/// queue live.
pub(crate) fn output_root(spec: &Specification, spec_dir: &Path) -> PathBuf {
    let output = spec.output_path();
    if output.is_absolute() {
        output
    } else {
        spec_dir.join(output)
    }
}
