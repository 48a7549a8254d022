//! Specs for `merlin run`.

use crate::prelude::*;

#[test]
fn dry_run_stages_scripts_and_nothing_else() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local", "--dry"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success());

    let workspace = output_workspace(&output);
    assert!(workspace.join("merlin_info/demo.expanded.yaml").exists());
    for step in ["a", "b"] {
        let files = file_names(&workspace.join(step));
        assert_eq!(files, vec![format!("{}.sh", step)], "step {}", step);
    }
}

#[test]
fn local_run_executes_steps_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let workspace = output_workspace(&output);
    for step in ["a", "b"] {
        assert!(
            workspace.join(step).join("MERLIN_FINISHED").exists(),
            "missing MERLIN_FINISHED for {}",
            step
        );
    }
    // b consumed a's output through the resolved workspace reference
    assert_eq!(
        std::fs::read_to_string(workspace.join("b/b.txt")).unwrap(),
        "A\n"
    );
}

#[test]
fn parameterized_dry_run_fans_out_workspaces() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "fanout.yaml", &param_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local", "--dry"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success());

    let workspace = output_workspace(&output);
    for step in ["hello/X.1", "hello/X.2", "goodbye/X.1", "goodbye/X.2"] {
        assert!(workspace.join(step).is_dir(), "missing workspace {}", step);
    }
    // Scripts carry the flattened step name
    assert!(workspace.join("hello/X.1/hello.X.1.sh").exists());
}

#[test]
fn failing_step_yields_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "description: {{name: demo}}\nenv:\n  variables: {{OUTPUT_PATH: {}}}\nstudy:\n  - name: bad\n    run: {{cmd: exit 3}}\n",
        dir.path().display()
    );
    let spec = write_spec(dir.path(), "demo.yaml", &body);

    let output = merlin()
        .args(["run", "--local"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn vars_override_values_in_commands() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        r#"description: {{name: demo}}
env:
  variables:
    OUTPUT_PATH: {}
    GREETING: hello
study:
  - name: speak
    run:
      cmd: echo "$(GREETING)" > said.txt
"#,
        dir.path().display()
    );
    let spec = write_spec(dir.path(), "demo.yaml", &body);

    let output = merlin()
        .args(["run", "--local"])
        .arg(&spec)
        .args(["--vars", "GREETING=howdy"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let workspace = output_workspace(&output);
    assert_eq!(
        std::fs::read_to_string(workspace.join("speak/said.txt")).unwrap(),
        "howdy\n"
    );
}

#[test]
fn malformed_vars_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local"])
        .arg(&spec)
        .args(["--vars", "NOEQUALS"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--vars"));
}

#[test]
fn reserved_vars_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local"])
        .arg(&spec)
        .args(["--vars", "WORKSPACE=/tmp"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("reserved word"));
}

#[test]
fn pargs_without_pgen_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local", "--pargs", "seed=1"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pgen"));
}

#[test]
fn unknown_task_server_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local", "--task-server", "celery"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a supported task server"));
}
