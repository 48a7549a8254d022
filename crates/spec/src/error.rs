// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for specification loading and validation.

use thiserror::Error;

/// Errors raised while loading, validating, or overriding a specification.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("invalid specification: {0}")]
    Invalid(String),
    #[error("failed to parse specification: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to read specification: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad --vars formatting: {0}")]
    VarsMalformed(String),
    #[error("no provenance spec matches '{pattern}' to restart from")]
    ProvenanceNotFound { pattern: String },
    #[error("'{pattern}' matches more than one provenance spec to restart from")]
    ProvenanceAmbiguous { pattern: String },
}
