// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `--vars KEY=VALUE` override parsing.

use crate::error::SpecError;
use crate::specification::ParamValue;
use indexmap::IndexMap;

/// Override variables parsed from the command line, in argument order.
pub type OverrideVars = IndexMap<String, ParamValue>;

/// Token names users may not override: the orchestrator owns these.
pub const RESERVED: &[&str] = &[
    "SPECROOT",
    "WORKSPACE",
    "MERLIN_INFO",
    "MERLIN_WORKSPACE",
    "MERLIN_TIMESTAMP",
    "MERLIN_SAMPLE_ID",
    "MERLIN_SAMPLE_PATH",
];

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse space-delimited `KEY=VALUE` pairs.
///
/// Keys must be alphanumeric/underscore, must not contain `$`, and must not
/// collide with [`RESERVED`]. Values that parse as integers are coerced to
/// integers; everything else stays a string.
pub fn parse_override_vars(variables: &[String]) -> Result<OverrideVars, SpecError> {
    let mut result = OverrideVars::new();
    for arg in variables {
        let Some((key, value)) = arg.split_once('=') else {
            return Err(SpecError::VarsMalformed(format!(
                "'{}' is missing the '=' operator; see 'merlin run --help' for an example",
                arg
            )));
        };
        if value.contains('=') {
            return Err(SpecError::VarsMalformed(format!(
                "'{}' has more than one '=' operator; one assignment per variable",
                arg
            )));
        }
        if key.contains('$') || !valid_key(key) {
            return Err(SpecError::VarsMalformed(format!(
                "'{}' is not a valid variable name; use alphanumeric characters and underscores",
                key
            )));
        }
        if RESERVED.contains(&key) {
            return Err(SpecError::VarsMalformed(format!(
                "cannot override reserved word '{}'; reserved words are: {}",
                key,
                RESERVED.join(", ")
            )));
        }
        let value = match value.parse::<i64>() {
            Ok(int) => ParamValue::Int(int),
            Err(_) => ParamValue::Str(value.to_string()),
        };
        tracing::debug!(key, %value, "override variable");
        result.insert(key.to_string(), value);
    }
    Ok(result)
}

#[cfg(test)]
#[path = "vars_tests.rs"]
mod tests;
