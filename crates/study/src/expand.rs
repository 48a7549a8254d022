// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-pass expansion of the symbolic step DAG.
//!
//! Pass A builds the basic DAG from the declared steps and their `depends`
//! lists. Pass B propagates parameter-usage masks down the graph and fans
//! parameterized nodes out into one copy per combination, preserving the
//! original node id on every copy. Pass C resolves `$(<step>.workspace)`
//! references against those semantic ids.
//!
//! Each pass takes its input by reference and produces a new DAG; the basic
//! DAG's id map must survive untouched for pass C.

use crate::dag::{Dag, GraphError, SOURCE_ID, SOURCE_NODE};
use crate::parameters::{ParamError, ParameterSet};
use crate::step::Step;
use merlin_spec::StudyStep;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Regex for `$(<step>.workspace)` reference tokens.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static WORKSPACE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\((\w+)\.workspace\)").expect("constant regex pattern is valid")
});

/// Errors raised during expansion.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("step '{step}' references workspace '{reference}' of a step that is not an ancestor")]
    DanglingWorkspaceRef { step: String, reference: String },
}

/// Pass A: build the basic DAG.
///
/// One node per declared step (workspace `<study_workspace>/<name>`), one
/// edge per dependency with any `_*` suffix stripped, and the `_source`
/// sentinel wired to every node with no incoming edges.
pub fn populate_basic_dag(
    study_workspace: &Path,
    steps: &[StudyStep],
) -> Result<Dag<Step>, ExpandError> {
    let mut dag = Dag::new();
    for step in steps {
        let workspace = study_workspace.join(&step.name);
        dag.add_node(&step.name, Step::new(workspace, step.clone()));
    }
    for step in steps {
        for dep in step.depends() {
            dag.add_edge(dep, &step.name)?;
        }
    }
    dag.add_sentinel(SOURCE_NODE, SOURCE_ID);
    let roots: Vec<String> = dag
        .names()
        .filter(|n| *n != SOURCE_NODE && dag.in_degree(n) == 0)
        .map(str::to_string)
        .collect();
    for root in roots {
        dag.add_edge(SOURCE_NODE, &root)?;
    }
    Ok(dag)
}

/// Pass B: propagate parameter masks and fan out parameterized nodes.
///
/// Walks the basic DAG in topological order. Each node's mask is its own
/// direct `$(k)` references OR-ed with every non-fan-in parent's mask; a
/// masked node is replaced by one copy per combination, every copy reusing
/// the original node id. Fan-in (`dep_*`) children do not inherit their
/// fan-in parents' masks, and fan-in parents connect to every copy; all
/// other parameterized parents connect only to the copy with the matching
/// `param_index`.
pub fn expand_parameterized_steps(
    study_workspace: &Path,
    params: &ParameterSet,
    basic_dag: &Dag<Step>,
) -> Result<Dag<Step>, ExpandError> {
    let mut dag = basic_dag.clone();
    if params.is_empty() {
        return Ok(dag);
    }

    for node_name in basic_dag.topological_sort() {
        if node_name == SOURCE_NODE {
            continue;
        }
        let Some(step) = dag.value(&node_name) else {
            continue;
        };

        // Ids of fan-in dependencies, resolved against the basic DAG so the
        // check still works once those parents have fanned out.
        let fan_in_ids: HashSet<i64> = step
            .fan_in_depends()
            .iter()
            .filter_map(|dep| basic_dag.node_id(dep))
            .collect();
        let has_direct = step.contains_global_params(params);

        let mut mask = step.global_param_mask(params);
        for parent in dag.predecessors(&node_name) {
            if parent == SOURCE_NODE {
                continue;
            }
            let parent_id = dag.node_id(&parent);
            if parent_id.is_some_and(|id| fan_in_ids.contains(&id)) {
                continue;
            }
            if let Some(parent_vector) = dag.value(&parent).and_then(|p| p.record.param_vector.as_ref())
            {
                for (bit, inherited) in mask.iter_mut().zip(parent_vector) {
                    *bit |= *inherited;
                }
            }
        }

        if let Some(step) = dag.value_mut(&node_name) {
            step.record.param_vector = Some(mask.clone());
        }
        if !mask.contains(&true) {
            continue;
        }
        tracing::debug!(node = %node_name, direct = has_direct, "fanning out parameterized step");

        let Some(step) = dag.value(&node_name) else {
            continue;
        };
        let Some(expanded) = step.expand_global_params(params, &mask) else {
            continue;
        };

        let parents = dag.predecessors(&node_name);
        let children = dag.successors(&node_name);
        let node_id = dag.node_id(&node_name).unwrap_or(SOURCE_ID);
        dag.remove_node(&node_name);

        for (mut copy, copy_name) in expanded {
            copy.record.workspace = study_workspace.join(&copy_name);
            let copy_index = copy.record.param_index;
            dag.add_node_with_id(&copy_name, copy, node_id);
            for parent in &parents {
                let connect = if parent == SOURCE_NODE {
                    true
                } else if dag
                    .node_id(parent)
                    .is_some_and(|id| fan_in_ids.contains(&id))
                {
                    true
                } else {
                    match dag.value(parent).and_then(|p| p.record.param_index) {
                        None => true,
                        Some(parent_index) => Some(parent_index) == copy_index,
                    }
                };
                if connect {
                    dag.add_edge(parent, &copy_name)?;
                }
            }
            for child in &children {
                dag.add_edge(&copy_name, child)?;
            }
        }
    }
    Ok(dag)
}

/// Pass C: resolve `$(<step>.workspace)` references.
///
/// Each token is resolved through the referenced step's *basic* id: some
/// ancestor of the referencing node must share that id, and among the
/// current nodes carrying it the match is by `param_index` (or the unique
/// copy). The token is replaced by the chosen node's workspace path in both
/// the run and restart commands.
pub fn expand_workspace_references(
    basic_dag: &Dag<Step>,
    param_dag: &Dag<Step>,
) -> Result<Dag<Step>, ExpandError> {
    let mut dag = param_dag.clone();
    for node_name in dag.topological_sort() {
        if node_name == SOURCE_NODE {
            continue;
        }
        loop {
            let Some(step) = dag.value(&node_name) else {
                break;
            };
            let commands = [Some(step.cmd()), step.restart_cmd()];
            let Some(token) = commands
                .iter()
                .flatten()
                .find_map(|cmd| WORKSPACE_REF.find(cmd))
                .map(|m| m.as_str().to_string())
            else {
                break;
            };
            let workspace = resolve_reference(basic_dag, &dag, &node_name, &token)?;
            if let Some(step) = dag.value_mut(&node_name) {
                step.substitute(&token, &workspace);
            }
        }
    }
    Ok(dag)
}

/// Resolve one `$(<name>.workspace)` token for `node_name`, returning the
/// referenced workspace path.
fn resolve_reference(
    basic_dag: &Dag<Step>,
    dag: &Dag<Step>,
    node_name: &str,
    token: &str,
) -> Result<String, ExpandError> {
    let dangling = || ExpandError::DanglingWorkspaceRef {
        step: node_name.to_string(),
        reference: token.to_string(),
    };

    let referenced = WORKSPACE_REF
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(dangling)?;
    let referenced_id = basic_dag.node_id(referenced).ok_or_else(dangling)?;

    let ancestor_ids: HashSet<i64> = dag
        .ancestors(node_name)
        .iter()
        .filter_map(|a| dag.node_id(a))
        .collect();
    if !ancestor_ids.contains(&referenced_id) {
        return Err(dangling());
    }

    let candidates: Vec<&str> = dag
        .names()
        .filter(|n| dag.node_id(n) == Some(referenced_id))
        .collect();
    let param_index = dag
        .value(node_name)
        .and_then(|step| step.record.param_index);
    let chosen = match candidates.as_slice() {
        [only] => Some(*only),
        _ => candidates
            .iter()
            .find(|c| {
                dag.value(c)
                    .is_some_and(|step| step.record.param_index == param_index)
            })
            .copied(),
    }
    .ok_or_else(dangling)?;

    let workspace = dag
        .value(chosen)
        .map(|step| step.workspace().display().to_string())
        .ok_or_else(dangling)?;
    Ok(workspace)
}

/// Run all three passes, producing the concrete DAG of step records.
pub fn stage(
    study_workspace: &Path,
    steps: &[StudyStep],
    params: &ParameterSet,
) -> Result<Dag<Step>, ExpandError> {
    let basic_dag = populate_basic_dag(study_workspace, steps)?;
    let param_dag = expand_parameterized_steps(study_workspace, params, &basic_dag)?;
    expand_workspace_references(&basic_dag, &param_dag)
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
