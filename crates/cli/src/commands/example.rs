// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `merlin example` - write a starter workflow specification.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

const FEATURE_DEMO: &str = r#"description:
  name: feature_demo
  description: Run 10 hello worlds.

env:
  variables:
    OUTPUT_PATH: ./studies
    N_SAMPLES: 10

batch:
  type: local
  shell: /bin/bash

study:
  - name: hello
    description: say hello
    run:
      cmd: echo "hello, $(X)!" > hello.out
  - name: goodbye
    description: say goodbye after each hello
    run:
      cmd: cat $(hello.workspace)/hello.out > goodbye.out
      depends: [hello]
  - name: collect
    description: count the greetings
    run:
      cmd: echo "greeted $(N_SAMPLES) times" > all_hellos.txt
      depends: [goodbye_*]

global.parameters:
  X:
    values: [world, marianne]
    label: X.%%

merlin:
  resources:
    task_server: local
    workers:
      demo_worker:
        steps: [all]
"#;

#[derive(Args)]
pub struct ExampleArgs {
    /// Name of the example workflow to write
    pub workflow: String,

    /// Where to write the example (defaults to <name>.yaml)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: ExampleArgs) -> Result<()> {
    let (name, body) = match args.workflow.as_str() {
        "feature_demo" => ("feature_demo", FEATURE_DEMO),
        other => bail!(
            "unknown example workflow '{}'; available workflows: feature_demo",
            other
        ),
    };
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.yaml", name)));
    std::fs::write(&path, body)?;
    println!("Wrote example workflow to '{}'", path.display());
    Ok(())
}
