// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ASCII banner for informational commands.

pub const BANNER_SMALL: &str = r#"
   *
 *~~~~~
*~~*~~~*      __  __           _ _
/   ~~~~~    |  \/  | ___ _ __| (_)_ __
    ~~~~~    | |\/| |/ _ \ '__| | | '_ \
   ~~~~~*    | |  | |  __/ |  | | | | | |
*~~~~~~~     |_|  |_|\___|_|  |_|_|_| |_|
 ~~~~~~~
  ~~~*~~~    Machine Learning for HPC Workflows
"#;
