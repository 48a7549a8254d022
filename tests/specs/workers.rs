//! Specs for the batch path: queueing, workers, status, purge.

use crate::prelude::*;

#[test]
fn batch_run_then_workers_completes_the_study() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    // Default mode queues tasks instead of executing
    let output = merlin().arg("run").arg(&spec).output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let workspace = output_workspace(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Queued 2 tasks"));
    assert!(!workspace.join("a/MERLIN_FINISHED").exists());

    // Workers drain the queue and honor the dependency order
    let output = merlin().arg("run-workers").arg(&spec).output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(workspace.join("a/MERLIN_FINISHED").exists());
    assert!(workspace.join("b/MERLIN_FINISHED").exists());
    assert_eq!(
        std::fs::read_to_string(workspace.join("b/b.txt")).unwrap(),
        "A\n"
    );
}

#[test]
fn status_reports_queued_tasks_and_echo_lists_workers() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));
    let output = merlin().arg("run").arg(&spec).output().unwrap();
    assert!(output.status.success());

    let output = merlin().arg("status").arg(&spec).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("merlin"));
    assert!(stdout.contains("Queued Tasks: 2"));

    // Echo mode prints the launch command without consuming anything
    let output = merlin()
        .args(["run-workers", "--echo"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("default_worker --queues merlin"));

    let output = merlin().arg("status").arg(&spec).output().unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("Queued Tasks: 2"));
}

#[test]
fn status_dumps_csv_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));
    merlin().arg("run").arg(&spec).output().unwrap();

    let csv = dir.path().join("status.csv");
    let output = merlin()
        .arg("status")
        .arg(&spec)
        .arg("--csv")
        .arg(&csv)
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = std::fs::read_to_string(&csv).unwrap();
    assert!(text.starts_with("queue,queued_tasks,workers\n"));
    assert!(text.contains("merlin,2,"));
}

#[test]
fn purge_with_force_drops_pending_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));
    merlin().arg("run").arg(&spec).output().unwrap();

    let output = merlin()
        .args(["purge", "--force"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Purged 2 tasks"));

    let output = merlin().arg("status").arg(&spec).output().unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("Queued Tasks: 0"));
}

#[test]
fn monitor_exits_once_queues_drain() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(dir.path(), "demo.yaml", &linear_spec(dir.path()));

    // Nothing queued: the stop condition is already met
    let output = merlin()
        .args(["monitor", "--sleep", "1"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("stop condition met"));
}

#[test]
fn query_workers_requires_spec_for_local_backend() {
    let output = merlin().arg("query-workers").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--spec"));
}
