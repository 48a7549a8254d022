//! Test helpers for the merlin CLI specs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

/// A merlin command ready to run.
pub fn merlin() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("merlin").expect("merlin binary builds")
}

/// Write a spec file into `dir` and return its path.
pub fn write_spec(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("spec file written");
    path
}

/// A minimal linear two-step study writing everything under `output`.
pub fn linear_spec(output: &Path) -> String {
    format!(
        r#"description:
  name: demo
  description: linear demo

env:
  variables:
    OUTPUT_PATH: {output}

study:
  - name: a
    description: produce
    run:
      cmd: echo A > a.txt
  - name: b
    description: consume
    run:
      cmd: cat $(a.workspace)/a.txt > b.txt
      depends: [a]
"#,
        output = output.display()
    )
}

/// A parameterized study fanning two steps out over X.
pub fn param_spec(output: &Path) -> String {
    format!(
        r#"description:
  name: fanout
  description: parameter demo

env:
  variables:
    OUTPUT_PATH: {output}

study:
  - name: hello
    run:
      cmd: echo "hello $(X)"
  - name: goodbye
    run:
      cmd: echo "goodbye"
      depends: [hello]

global.parameters:
  X:
    values: [1, 2]
    label: X.%%
"#,
        output = output.display()
    )
}

/// Extract the study workspace path from `merlin run` output.
pub fn output_workspace(output: &Output) -> PathBuf {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.starts_with("Study workspace is '"))
        .unwrap_or_else(|| panic!("no 'Study workspace is ...' line in: {}", stdout));
    let path = line
        .trim_start_matches("Study workspace is '")
        .trim_end_matches('\'');
    PathBuf::from(path)
}

/// File names (not directories) directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", dir.display(), e))
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
