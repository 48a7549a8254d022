// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec-level `$(VAR)` token expansion.
//!
//! Applied once after load, before graph construction: environment
//! variables, command-line overrides, and `$(SPECROOT)` are substituted into
//! every step command. Global-parameter and `$(step.workspace)` tokens are
//! the expander's business, and the reserved sample tokens stay untouched
//! for the dispatch layer.

use crate::specification::Specification;
use crate::vars::OverrideVars;
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Regex for `$(NAME)` spec-variable tokens.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\(([A-Za-z_][A-Za-z0-9_]*)\)").expect("constant regex pattern is valid")
});

/// Replace every `$(NAME)` whose name is in `vars`; unknown tokens are left
/// as-is.
pub fn expand_tokens(template: &str, vars: &IndexMap<String, String>) -> String {
    VAR_TOKEN
        .replace_all(template, |caps: &regex::Captures| {
            match vars.get(&caps[1]) {
                Some(val) => val.clone(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Build the substitution table for a spec: `env.variables`, overridden by
/// `--vars`, plus `SPECROOT`.
fn substitution_table(
    spec: &Specification,
    overrides: &OverrideVars,
    specroot: &Path,
) -> IndexMap<String, String> {
    let mut vars: IndexMap<String, String> = spec
        .env
        .variables
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect();
    for (k, v) in overrides {
        vars.insert(k.clone(), v.to_string());
    }
    vars.insert("SPECROOT".to_string(), specroot.display().to_string());
    vars
}

/// Expand spec-level variables in place.
///
/// Overrides are also folded back into `env.variables` so the provenance
/// copy reflects what actually ran.
pub fn expand_spec(spec: &mut Specification, overrides: &OverrideVars, specroot: &Path) {
    let vars = substitution_table(spec, overrides, specroot);
    for step in &mut spec.study {
        step.run.cmd = expand_tokens(&step.run.cmd, &vars);
        if let Some(restart) = &step.run.restart {
            step.run.restart = Some(expand_tokens(restart, &vars));
        }
    }
    for (k, v) in overrides {
        spec.env.variables.insert(k.clone(), v.clone());
    }
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
