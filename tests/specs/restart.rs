//! Specs for `merlin restart`.

use crate::prelude::*;

#[test]
fn restart_requires_a_provenance_spec() {
    let dir = tempfile::tempdir().unwrap();
    let output = merlin()
        .args(["restart", "--local"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("provenance"));
}

#[test]
fn restart_reruns_a_completed_study() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success());
    let workspace = output_workspace(&output);

    let output = merlin()
        .args(["restart", "--local"])
        .arg(&workspace)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Restarting workflow at"));
    assert!(workspace.join("b/MERLIN_FINISHED").exists());
}

#[test]
fn restart_after_dry_run_completes_the_study() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    let output = merlin()
        .args(["run", "--local", "--dry"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success());
    let workspace = output_workspace(&output);
    assert!(!workspace.join("a/MERLIN_FINISHED").exists());

    let output = merlin()
        .args(["restart", "--local"])
        .arg(&workspace)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(workspace.join("a/MERLIN_FINISHED").exists());
    assert!(workspace.join("b/MERLIN_FINISHED").exists());
}
