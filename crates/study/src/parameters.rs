// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global parameter table and value combinations.
//!
//! A [`ParameterSet`] is an ordered map of parameter key to value list; all
//! value lists share one length *P*, the parameter cardinality. Combination
//! *i* picks slot *i* of every list, so "combination" here is positional,
//! not a cross product.

use indexmap::IndexMap;
use merlin_spec::{GlobalParam, ParamValue};
use std::fmt;
use thiserror::Error;

/// Token replaced by the concrete value inside a parameter label.
pub const LABEL_TOKEN: &str = "%%";

/// Errors raised while assembling a parameter set.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error(
        "length of values for parameter '{key}' is {actual}, but the other \
         parameters have {expected} values"
    )]
    ShapeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },
}

/// One declared parameter: values plus its label template and display name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamEntry {
    pub values: Vec<ParamValue>,
    pub label: String,
    pub name: String,
}

/// Ordered global-parameter table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: IndexMap<String, ParamEntry>,
    length: usize,
}

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a parameter set from the spec's `global.parameters` block,
    /// preserving declaration order.
    pub fn from_spec(globals: &IndexMap<String, GlobalParam>) -> Result<Self, ParamError> {
        let mut set = Self::new();
        for (key, param) in globals {
            set.add_parameter(key, param.values.clone(), Some(param.label.clone()), None)?;
        }
        Ok(set)
    }

    /// Add one parameter.
    ///
    /// `label` defaults to `<key>.%%` and `name` defaults to the key. The
    /// value list must match the length of every previously added list.
    pub fn add_parameter(
        &mut self,
        key: &str,
        values: Vec<ParamValue>,
        label: Option<String>,
        name: Option<String>,
    ) -> Result<(), ParamError> {
        if self.params.contains_key(key) {
            tracing::warn!(key, "parameter already in set, overriding");
        } else if self.length == 0 && self.params.is_empty() {
            self.length = values.len();
        } else if values.len() != self.length {
            return Err(ParamError::ShapeMismatch {
                key: key.to_string(),
                expected: self.length,
                actual: values.len(),
            });
        }
        let entry = ParamEntry {
            values,
            label: label.unwrap_or_else(|| format!("{}.{}", key, LABEL_TOKEN)),
            name: name.unwrap_or_else(|| key.to_string()),
        };
        self.params.insert(key.to_string(), entry);
        Ok(())
    }

    /// Parameter cardinality *P* (length of every value list).
    pub fn cardinality(&self) -> usize {
        self.length
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True if no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Iterate `(key, entry)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamEntry)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up one parameter.
    pub fn get(&self, key: &str) -> Option<&ParamEntry> {
        self.params.get(key)
    }

    /// The resolved label for parameter `key` at combination `index`.
    pub fn label_at(&self, key: &str, index: usize) -> Option<String> {
        let entry = self.params.get(key)?;
        let value = entry.values.get(index)?;
        Some(entry.label.replace(LABEL_TOKEN, &value.to_string()))
    }

    /// Iterate the *P* combinations in index order.
    pub fn combinations(&self) -> impl Iterator<Item = Combination> + '_ {
        (0..self.length).map(move |i| {
            let mut combo = Combination::default();
            for (key, entry) in &self.params {
                let value = entry.values[i].to_string();
                let label = entry.label.replace(LABEL_TOKEN, &value);
                combo.add(key, &entry.name, &value, &label);
            }
            combo
        })
    }
}

/// One resolved choice of values across all parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Combination {
    values: IndexMap<String, String>,
    labels: IndexMap<String, String>,
    names: IndexMap<String, String>,
}

impl Combination {
    /// Record one resolved parameter slot.
    pub fn add(&mut self, key: &str, name: &str, value: &str, label: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.labels.insert(key.to_string(), label.to_string());
        self.names.insert(key.to_string(), name.to_string());
    }

    /// Substitute this combination into a string.
    ///
    /// Three passes in order: `$(key.label)` → label, `$(key)` → value,
    /// `$(key.name)` → name.
    pub fn apply(&self, item: &str) -> String {
        let mut out = item.to_string();
        for (key, label) in &self.labels {
            out = out.replace(&format!("$({}.label)", key), label);
        }
        for (key, value) in &self.values {
            out = out.replace(&format!("$({})", key), value);
        }
        for (key, name) in &self.names {
            out = out.replace(&format!("$({}.name)", key), name);
        }
        out
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.labels.values().map(String::as_str).collect();
        write!(f, "{}", joined.join("."))
    }
}

#[cfg(test)]
#[path = "parameters_tests.rs"]
mod tests;
