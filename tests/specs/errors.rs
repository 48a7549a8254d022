//! Specs for construction-time error surfaces.

use crate::prelude::*;

#[test]
fn missing_spec_file_is_an_error() {
    let output = merlin()
        .args(["run", "--local", "/definitely/not/here.yaml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a valid filepath"));
}

#[test]
fn duplicate_step_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(
        dir.path(),
        "dup.yaml",
        "description: {name: dup}\nstudy:\n  - name: a\n    run: {cmd: echo}\n  - name: a\n    run: {cmd: echo}\n",
    );
    let output = merlin().args(["run", "--local"]).arg(&spec).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate step name"));
}

#[test]
fn unknown_dependency_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "description: {{name: demo}}\nenv:\n  variables: {{OUTPUT_PATH: {}}}\nstudy:\n  - name: b\n    run:\n      cmd: echo\n      depends: [ghost]\n",
        dir.path().display()
    );
    let spec = write_spec(dir.path(), "demo.yaml", &body);
    let output = merlin().args(["run", "--local"]).arg(&spec).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn dangling_workspace_reference_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "description: {{name: demo}}\nenv:\n  variables: {{OUTPUT_PATH: {}}}\nstudy:\n  - name: b\n    run: {{cmd: use $(zz.workspace)}}\n",
        dir.path().display()
    );
    let spec = write_spec(dir.path(), "demo.yaml", &body);
    let output = merlin().args(["run", "--local"]).arg(&spec).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not an ancestor"));
}
