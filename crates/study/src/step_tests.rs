// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration;
use merlin_core::{FakeClock, State};
use merlin_spec::{ParamValue, RunConfig};
use std::path::PathBuf;
use yare::parameterized;

fn study_step(name: &str, cmd: &str) -> StudyStep {
    StudyStep {
        name: name.to_string(),
        description: String::new(),
        run: RunConfig {
            cmd: cmd.to_string(),
            ..RunConfig::default()
        },
    }
}

fn step(name: &str, cmd: &str) -> Step {
    Step::new(PathBuf::from("/ws").join(name), study_step(name, cmd))
}

fn params(entries: &[(&str, &[i64])]) -> ParameterSet {
    let mut set = ParameterSet::new();
    for (key, values) in entries {
        let values = values.iter().map(|v| ParamValue::Int(*v)).collect();
        set.add_parameter(key, values, None, None).unwrap();
    }
    set
}

// =============================================================================
// StepRecord state machine
// =============================================================================

#[test]
fn submit_time_is_set_once() {
    let clock = FakeClock::default();
    let mut record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    record.mark_submitted(&clock);
    let first = record.time_submitted();
    clock.advance(Duration::seconds(30));
    record.mark_submitted(&clock);
    assert_eq!(record.time_submitted(), first);
    assert_eq!(record.status(), State::Pending);
}

#[test]
fn lifecycle_transitions() {
    let clock = FakeClock::default();
    let mut record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    assert_eq!(record.status(), State::Initialized);
    record.mark_submitted(&clock);
    assert_eq!(record.status(), State::Pending);
    record.mark_running(&clock);
    assert_eq!(record.status(), State::Running);
    record.mark_end(State::Finished, &clock);
    assert_eq!(record.status(), State::Finished);
}

#[test]
fn elapsed_time_spans_submit_to_end() {
    let clock = FakeClock::default();
    let mut record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    record.mark_submitted(&clock);
    clock.advance(Duration::seconds(90));
    record.mark_end(State::Finished, &clock);
    assert_eq!(record.elapsed_time(&clock), "0:01:30");
}

#[test]
fn elapsed_time_ticks_while_running() {
    let clock = FakeClock::default();
    let mut record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    record.mark_submitted(&clock);
    record.mark_running(&clock);
    clock.advance(Duration::seconds(5));
    assert_eq!(record.elapsed_time(&clock), "0:00:05");
}

#[test]
fn unset_times_render_dash_marker() {
    let clock = FakeClock::default();
    let record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    assert_eq!(record.elapsed_time(&clock), "--:--:--");
    assert_eq!(record.run_time(&clock), "--:--:--");
    assert_eq!(record.time_submitted(), "--");
}

#[test]
fn restart_budget_allows_limit_restarts() {
    let mut record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    record.restart_limit = 2;
    assert!(record.mark_restart());
    assert!(record.mark_restart());
    assert!(!record.mark_restart());
    assert_eq!(record.num_restarts(), 2);
    assert_eq!(record.status(), State::Timedout);
}

#[test]
fn restart_limit_zero_is_unbounded() {
    let mut record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    record.restart_limit = 0;
    for _ in 0..50 {
        assert!(record.mark_restart());
    }
}

#[test]
fn max_retries_feeds_restart_limit() {
    let mut decl = study_step("a", "echo");
    decl.run.max_retries = Some(7);
    let record = StepRecord::new(PathBuf::from("/ws/a"), decl);
    assert_eq!(record.restart_limit, 7);

    let record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    assert_eq!(record.restart_limit, DEFAULT_RESTART_LIMIT);
}

// =============================================================================
// Step behavior
// =============================================================================

#[parameterized(
    declared = { Some("sim_queue"), "sim_queue" },
    absent = { None, "merlin" },
    literal_none = { Some("none"), "merlin" },
    literal_none_upper = { Some("NONE"), "merlin" },
)]
fn task_queue_resolution(declared: Option<&str>, expected: &str) {
    let mut decl = study_step("a", "echo");
    decl.run.task_queue = declared.map(str::to_string);
    let step = Step::new(PathBuf::from("/ws/a"), decl);
    assert_eq!(step.task_queue(), expected);
}

#[test]
fn flat_name_flattens_parameter_suffix() {
    let step = step("sim/X.1", "echo");
    assert_eq!(step.flat_name(), "sim.X.1");
}

#[test]
fn global_param_mask_tracks_direct_references() {
    let params = params(&[("X", &[1, 2]), ("Y", &[3, 4])]);
    let used = step("a", "echo $(Y)");
    assert!(used.contains_global_params(&params));
    assert_eq!(used.global_param_mask(&params), vec![false, true]);

    let unused = step("b", "echo hi");
    assert!(!unused.contains_global_params(&params));
    assert_eq!(unused.global_param_mask(&params), vec![false, false]);
}

#[test]
fn expand_global_params_fans_out_masked_keys() {
    let params = params(&[("X", &[1, 2]), ("Y", &[5, 6])]);
    let step = step("sim", "run --x $(X) --y $(Y)");
    let expanded = step
        .expand_global_params(&params, &[true, true])
        .unwrap();
    assert_eq!(expanded.len(), 2);

    let (first, first_name) = &expanded[0];
    assert_eq!(first_name, "sim/X.1.Y.5");
    assert_eq!(first.cmd(), "run --x 1 --y 5");
    assert_eq!(first.record.param_index, Some(0));
    assert_eq!(first.name(), "sim/X.1.Y.5");

    let (second, second_name) = &expanded[1];
    assert_eq!(second_name, "sim/X.2.Y.6");
    assert_eq!(second.cmd(), "run --x 2 --y 6");
    assert_eq!(second.record.param_index, Some(1));
}

#[test]
fn expand_global_params_ignores_unmasked_keys() {
    let params = params(&[("X", &[1, 2]), ("Y", &[5, 6])]);
    let step = step("sim", "run --x $(X) --y $(Y)");
    let expanded = step
        .expand_global_params(&params, &[true, false])
        .unwrap();
    let (first, name) = &expanded[0];
    assert_eq!(name, "sim/X.1");
    // Y is unmasked, so its token survives
    assert_eq!(first.cmd(), "run --x 1 --y $(Y)");
}

#[test]
fn expand_global_params_substitutes_label_and_name() {
    let params = params(&[("X", &[4])]);
    let step = step("sim", "tag $(X.label) key $(X.name) val $(X)");
    let expanded = step.expand_global_params(&params, &[true]).unwrap();
    assert_eq!(expanded[0].0.cmd(), "tag X.4 key X val 4");
}

#[test]
fn expand_global_params_substitutes_restart_cmd() {
    let params = params(&[("X", &[1, 2])]);
    let mut decl = study_step("sim", "run $(X)");
    decl.run.restart = Some("resume $(X)".to_string());
    let step = Step::new(PathBuf::from("/ws/sim"), decl);
    let expanded = step.expand_global_params(&params, &[true]).unwrap();
    assert_eq!(expanded[1].0.restart_cmd(), Some("resume 2"));
}

#[test]
fn expand_global_params_none_for_empty_mask() {
    let params = params(&[("X", &[1, 2])]);
    let step = step("a", "echo hi");
    assert!(step.expand_global_params(&params, &[false]).is_none());
    assert!(step
        .expand_global_params(&ParameterSet::new(), &[])
        .is_none());
}

#[test]
fn clone_with_overrides_cmd_and_workspace() {
    let step = step("a", "echo original");
    let copy = step.clone_with(Some("echo new"), None, Some(PathBuf::from("/other")));
    assert_eq!(copy.cmd(), "echo new");
    assert_eq!(copy.workspace(), std::path::Path::new("/other"));
    // The source is untouched
    assert_eq!(step.cmd(), "echo original");
}

#[test]
fn clone_with_replacement_pairs_is_case_insensitive() {
    let mut decl = study_step("a", "python LEARN.py");
    decl.run.restart = Some("python learn.py --resume".to_string());
    let step = Step::new(PathBuf::from("/ws/a"), decl);
    let pairs = vec![("learn.py".to_string(), "model.py".to_string())];
    let copy = step.clone_with(None, Some(&pairs), None);
    assert_eq!(copy.cmd(), "python model.py");
    assert_eq!(copy.restart_cmd(), Some("python model.py --resume"));
}

#[parameterized(
    column_label = { "run $(SAMPLE_X)", true },
    sample_id = { "run $(MERLIN_SAMPLE_ID)", true },
    sample_path_lower = { "run $(merlin_sample_path)", true },
    no_tokens = { "run plain", false },
)]
fn needs_sample_expansion_checks_cmd(cmd: &str, expected: bool) {
    let step = step("a", cmd);
    assert_eq!(
        step.needs_sample_expansion(&["SAMPLE_X".to_string()]),
        expected
    );
}

#[test]
fn needs_sample_expansion_checks_restart_cmd_too() {
    let mut decl = study_step("a", "echo plain");
    decl.run.restart = Some("resume $(MERLIN_SAMPLE_ID)".to_string());
    let step = Step::new(PathBuf::from("/ws/a"), decl);
    assert!(step.needs_sample_expansion(&[]));
}

#[test]
fn workspace_token_substitution() {
    let mut decl = study_step("a", "echo out > $(WORKSPACE)/result.txt");
    decl.run.restart = Some("cat $(WORKSPACE)/result.txt".to_string());
    let mut step = Step::new(PathBuf::from("/ws/a"), decl);
    step.substitute_workspace_token();
    assert_eq!(step.cmd(), "echo out > /ws/a/result.txt");
    assert_eq!(step.restart_cmd(), Some("cat /ws/a/result.txt"));
}

#[test]
fn record_serde_round_trip() {
    let mut record = StepRecord::new(PathBuf::from("/ws/a"), study_step("a", "echo"));
    record.param_index = Some(1);
    record.param_vector = Some(vec![true, false]);
    record.jobids.push("12345".to_string());
    let json = serde_json::to_string(&record).unwrap();
    let parsed: StepRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.name(), "a");
    assert_eq!(parsed.param_index, Some(1));
    assert_eq!(parsed.jobids, vec!["12345"]);
    assert_eq!(parsed.status(), State::Initialized);
}
